//! Business logic for Coachcraft reply generation.
//!
//! Persona composition, prompt rendering, and the completion pipeline
//! (retry, stream decoding, mock provider, dispatcher). Network I/O is
//! behind the [`llm::transport::ChatTransport`] port, implemented in
//! `coachcraft-infra` -- this crate never opens a socket.

pub mod llm;
pub mod persona;
pub mod prompt;
