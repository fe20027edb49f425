//! Persona composition.
//!
//! - `defaults`: the built-in coaching persona
//! - `compose`: ordered layer merge and lenient extraction of stored config

pub mod compose;
pub mod defaults;

pub use compose::{compose, extract_override};
pub use defaults::{DEFAULT_LAYER_MIX, default_persona};
