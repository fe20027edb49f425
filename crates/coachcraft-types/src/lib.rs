//! Shared domain types for Coachcraft.
//!
//! Messages, completion results, the persona model, conversation context and
//! dispatcher configuration, plus their error types.
//!
//! Zero infrastructure dependencies -- only serde, thiserror, secrecy.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod persona;
