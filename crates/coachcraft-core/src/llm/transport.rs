//! Port for sending one chat completion attempt to a provider.

use std::future::Future;

use secrecy::SecretString;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use coachcraft_types::llm::{CompletionResult, LlmError, Message};

use super::sink::TokenSink;

/// Request body for `POST {base_url}/chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub temperature: f64,
    pub stream: bool,
    pub messages: Vec<Message>,
}

/// Where an attempt is sent and with which credential.
///
/// Does not derive Debug; the credential must never reach log output.
pub struct ProviderTarget<'a> {
    pub base_url: &'a str,
    pub credential: &'a SecretString,
}

/// One request/response exchange with an OpenAI-compatible provider.
///
/// Implementations perform exactly one attempt; retrying is the
/// dispatcher's job. When `request.stream` is set, content fragments go to
/// `sink` as they are decoded. A fired `cancel` token ends the attempt with
/// [`LlmError::Cancelled`].
///
/// Implementations live in coachcraft-infra (e.g., `HttpChatTransport`).
pub trait ChatTransport: Send + Sync {
    /// Short transport name used in tracing spans.
    fn name(&self) -> &str;

    fn send(
        &self,
        target: &ProviderTarget<'_>,
        request: &ChatRequest,
        sink: Option<&dyn TokenSink>,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<CompletionResult, LlmError>> + Send;
}
