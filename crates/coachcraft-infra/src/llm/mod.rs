//! LLM provider implementations.

pub mod http;

pub use http::HttpChatTransport;

use coachcraft_core::llm::CompletionDispatcher;
use coachcraft_types::config::DispatcherConfig;

/// Dispatcher that talks to an OpenAI-compatible endpoint over HTTP.
pub type HttpDispatcher = CompletionDispatcher<HttpChatTransport>;

/// Build a dispatcher for `config` backed by a fresh HTTP client.
pub fn build_dispatcher(config: DispatcherConfig) -> HttpDispatcher {
    CompletionDispatcher::new(config, HttpChatTransport::new())
}
