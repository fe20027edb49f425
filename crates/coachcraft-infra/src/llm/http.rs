//! HttpChatTransport -- concrete [`ChatTransport`] for OpenAI-compatible
//! chat completion endpoints.
//!
//! Sends `POST {base_url}/chat/completions` with bearer authentication.
//! Non-streaming responses are parsed as a whole; streaming responses are
//! fed through the core [`StreamDecoder`] as the body arrives.
//!
//! The credential is only exposed when building the `Authorization` header.
//! It never appears in Debug output or tracing logs.

use secrecy::ExposeSecret;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use coachcraft_core::llm::sink::TokenSink;
use coachcraft_core::llm::stream::StreamDecoder;
use coachcraft_core::llm::transport::{ChatRequest, ChatTransport, ProviderTarget};
use coachcraft_types::llm::{CompletionResult, LlmError, Usage};

/// OpenAI-compatible chat completion transport.
///
/// Holds only a `reqwest::Client`, which is cheap to clone and pools
/// connections across calls.
#[derive(Debug, Clone, Default)]
pub struct HttpChatTransport {
    client: reqwest::Client,
}

impl HttpChatTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, custom TLS, timeouts).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn read_text(
        response: reqwest::Response,
        cancel: &CancellationToken,
    ) -> Result<String, LlmError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LlmError::Cancelled),
            text = response.text() => {
                text.map_err(|e| LlmError::Transport(format!("failed to read response body: {e}")))
            }
        }
    }
}

impl ChatTransport for HttpChatTransport {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn send(
        &self,
        target: &ProviderTarget<'_>,
        request: &ChatRequest,
        sink: Option<&dyn TokenSink>,
        cancel: &CancellationToken,
    ) -> Result<CompletionResult, LlmError> {
        let url = format!("{}/chat/completions", target.base_url);

        let pending = self
            .client
            .post(&url)
            .bearer_auth(target.credential.expose_secret())
            .json(request)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
            result = pending => result.map_err(|e| LlmError::Transport(format!("HTTP request failed: {e}")))?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = match Self::read_text(response, cancel).await {
                Err(LlmError::Cancelled) => return Err(LlmError::Cancelled),
                other => other.unwrap_or_default(),
            };
            let message = provider_error_message(status.as_u16(), &body);
            tracing::error!(status = status.as_u16(), %message, "Provider returned an error response");
            return Err(LlmError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        if request.stream {
            let decoded = StreamDecoder::new(sink)
                .decode(response.bytes_stream(), cancel)
                .await?;
            return Ok(CompletionResult {
                content: decoded.content,
                model: request.model.clone(),
                finish_reason: decoded.finish_reason,
                usage: None,
                raw: None,
            });
        }

        let body = Self::read_text(response, cancel).await?;
        parse_completion(&body, &request.model)
    }
}

/// Pick the most useful failure description from an error response body:
/// the JSON `error.message`, else the raw text, else the bare status.
pub fn provider_error_message(status: u16, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.pointer("/error/message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    });

    from_json.unwrap_or_else(|| {
        if body.is_empty() {
            format!("status {status}")
        } else {
            body.to_string()
        }
    })
}

/// Normalize a non-streaming response body.
fn parse_completion(body: &str, model: &str) -> Result<CompletionResult, LlmError> {
    let data: Value = serde_json::from_str(body)
        .map_err(|e| LlmError::Transport(format!("failed to parse response: {e}")))?;

    let choice = data.get("choices").and_then(|c| c.get(0));
    let content = choice
        .and_then(|c| c.pointer("/message/content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let finish_reason = choice
        .and_then(|c| c.get("finish_reason"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let usage = data
        .get("usage")
        .and_then(|u| serde_json::from_value::<Usage>(u.clone()).ok());

    Ok(CompletionResult {
        content,
        model: model.to_string(),
        finish_reason,
        usage,
        raw: Some(data),
    })
}
