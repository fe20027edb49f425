//! Completion dispatcher.
//!
//! Turns a message sequence into a [`CompletionResult`]: applies per-call
//! overrides to the configured defaults, serves mock replies when no
//! provider is configured, and otherwise sends the request through a
//! [`ChatTransport`] under the [`RetryPolicy`].

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span};

use coachcraft_types::config::DispatcherConfig;
use coachcraft_types::llm::{CompletionResult, LlmError, Message};

use super::mock::mock_completion;
use super::retry::RetryPolicy;
use super::sink::TokenSink;
use super::transport::{ChatRequest, ChatTransport, ProviderTarget};

/// Per-call overrides and hooks. Unset fields fall back to the
/// dispatcher's configuration.
#[derive(Default, Clone)]
pub struct CompletionOptions {
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_retries: Option<u32>,
    pub stream: bool,
    pub sink: Option<Arc<dyn TokenSink>>,
    pub cancel: Option<CancellationToken>,
}

impl CompletionOptions {
    pub fn streaming(sink: Arc<dyn TokenSink>) -> Self {
        Self {
            stream: true,
            sink: Some(sink),
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for CompletionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionOptions")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_retries", &self.max_retries)
            .field("stream", &self.stream)
            .field("sink", &self.sink.as_ref().map(|_| "<sink>"))
            .field("cancel", &self.cancel)
            .finish()
    }
}

/// Sends completion requests on behalf of the coaching flow.
///
/// Holds only immutable configuration and a transport, so one dispatcher
/// can serve any number of concurrent calls.
pub struct CompletionDispatcher<T> {
    config: Arc<DispatcherConfig>,
    transport: T,
    retry: RetryPolicy,
}

impl<T: ChatTransport> CompletionDispatcher<T> {
    pub fn new(config: DispatcherConfig, transport: T) -> Self {
        let retry = RetryPolicy::new(config.retry_delay);
        Self {
            config: Arc::new(config),
            transport,
            retry,
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Default model for calls that do not override it.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Default sampling temperature for calls that do not override it.
    pub fn temperature(&self) -> f64 {
        self.config.temperature
    }

    /// Whether every call is answered by the offline mock provider.
    pub fn uses_mock(&self) -> bool {
        self.config.mock
    }

    /// Generate a reply for `messages`.
    ///
    /// In mock mode the transport is never touched. In live mode every
    /// attempt is a fresh request; before a retry the sink's
    /// [`TokenSink::on_restart`] is called, and the retried attempt's
    /// content starts from empty.
    pub async fn complete(
        &self,
        messages: &[Message],
        options: CompletionOptions,
    ) -> Result<CompletionResult, LlmError> {
        if messages.is_empty() {
            return Err(LlmError::Validation(
                "at least one message is required to generate a reply".to_string(),
            ));
        }

        let CompletionOptions {
            model,
            temperature,
            max_retries,
            stream,
            sink,
            cancel,
        } = options;

        if self.config.mock {
            debug!(messages = messages.len(), "Serving completion from mock provider");
            return Ok(mock_completion(messages, sink.as_deref()));
        }

        let Some(credential) = self.config.credential.as_ref() else {
            return Err(LlmError::Configuration(
                "no API key configured for live completions".to_string(),
            ));
        };

        let request = ChatRequest {
            model: model.unwrap_or_else(|| self.config.model.clone()),
            temperature: temperature.unwrap_or(self.config.temperature),
            stream,
            messages: messages.to_vec(),
        };
        let target = ProviderTarget {
            base_url: &self.config.base_url,
            credential,
        };
        let cancel = cancel.unwrap_or_else(CancellationToken::new);
        let max_retries = max_retries.unwrap_or(self.config.max_retries);

        debug!(
            model = %request.model,
            stream,
            messages = messages.len(),
            max_retries,
            "Dispatching completion"
        );

        let mut attempt: u32 = 0;
        self.retry
            .run(max_retries, || {
                attempt += 1;
                let attempt = attempt;
                let sink = sink.clone();
                let (target, request, cancel) = (&target, &request, &cancel);

                let span = info_span!(
                    "gen_ai.chat",
                    gen_ai.operation.name = "chat",
                    gen_ai.provider.name = self.transport.name(),
                    gen_ai.request.model = %request.model,
                    gen_ai.request.temperature = request.temperature,
                    gen_ai.request.stream = request.stream,
                    attempt,
                );

                async move {
                    if cancel.is_cancelled() {
                        return Err(LlmError::Cancelled);
                    }
                    if attempt > 1 {
                        if let Some(sink) = &sink {
                            sink.on_restart(attempt);
                        }
                    }
                    self.transport
                        .send(target, request, sink.as_deref(), cancel)
                        .await
                }
                .instrument(span)
            })
            .await
    }
}
