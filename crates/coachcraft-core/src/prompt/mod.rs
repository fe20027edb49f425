//! Prompt assembly: persona + conversation context + history → messages.

pub mod engine;

pub use engine::{BuildMessagesParams, PromptEngine, SystemPromptInput};
