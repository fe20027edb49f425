//! Infrastructure implementations for Coachcraft.
//!
//! Provides the concrete OpenAI-compatible HTTP transport for the
//! `ChatTransport` port defined in `coachcraft-core`, plus loading of
//! dispatcher settings from `config.toml` and the environment.

pub mod config;
pub mod llm;
