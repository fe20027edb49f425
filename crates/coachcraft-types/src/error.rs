use thiserror::Error;

/// Errors raised while assembling a prompt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("latest user message is empty")]
    EmptyUserMessage,
}

/// Errors raised while reading dispatcher settings from disk.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },
}
