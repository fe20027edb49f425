//! `ccraft reply` -- generate a coaching reply.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Args;
use console::style;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::field::Empty;
use tracing::{Instrument, info_span};

use coachcraft_core::llm::{CompletionOptions, TokenSink};
use coachcraft_core::prompt::PromptEngine;
use coachcraft_infra::config::{process_env, resolve_dispatcher_config};
use coachcraft_infra::llm::build_dispatcher;
use coachcraft_observe::genai_attrs::{
    GEN_AI_RESPONSE_FINISH_REASONS, GEN_AI_RESPONSE_MODEL, GEN_AI_USAGE_INPUT_TOKENS,
    GEN_AI_USAGE_OUTPUT_TOKENS, OP_CHAT,
};
use coachcraft_types::config::LlmSettings;
use coachcraft_types::llm::CompletionResult;

use super::conversation::ConversationFile;

/// Shown to the user whenever reply generation fails; details go to the log.
pub const REPLY_FAILED: &str = "无法生成教练回复，请稍后重试。";

/// Does not derive Debug: `api_key` may hold a credential.
#[derive(Args)]
pub struct ReplyArgs {
    /// Conversation snapshot (JSON) with title, summary, config and history.
    #[arg(long)]
    pub conversation: PathBuf,

    /// The latest user message.
    #[arg(long)]
    pub message: String,

    /// Stream the reply token by token.
    #[arg(long)]
    pub stream: bool,

    /// Model override for this call.
    #[arg(long)]
    pub model: Option<String>,

    /// Sampling temperature override for this call.
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Retry budget override for this call.
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Provider base URL (e.g. https://api.openai.com/v1).
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key; falls back to OPENAI_API_KEY.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Use the offline mock provider even when an API key is configured.
    #[arg(long)]
    pub mock: bool,
}

impl ReplyArgs {
    /// Settings given explicitly on the command line.
    fn explicit_settings(&self) -> LlmSettings {
        LlmSettings {
            model: self.model.clone(),
            temperature: self.temperature,
            max_retries: self.max_retries,
            retry_delay_ms: None,
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone().map(SecretString::from),
            mock: self.mock.then_some(true),
        }
    }
}

/// Writes streamed tokens straight to stdout.
struct StdoutSink;

impl TokenSink for StdoutSink {
    fn on_token(&self, token: &str) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(token.as_bytes());
        let _ = out.flush();
    }

    fn on_restart(&self, attempt: u32) {
        println!();
        eprintln!(
            "{} connection interrupted, retrying (attempt {attempt})",
            style("!").yellow().bold()
        );
    }
}

pub async fn run(args: ReplyArgs, data_dir: &Path, json: bool) -> Result<()> {
    let file = ConversationFile::load(&args.conversation).await?;
    let engine = PromptEngine::new();
    let messages = engine.build_messages(&file.params(&args.message))?;

    let config = resolve_dispatcher_config(data_dir, args.explicit_settings(), process_env).await;
    let dispatcher = build_dispatcher(config);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    // Tokens are only echoed in text mode; --json prints the final result.
    let echo_tokens = args.stream && !json;
    let options = CompletionOptions {
        stream: args.stream,
        sink: echo_tokens.then(|| Arc::new(StdoutSink) as Arc<dyn TokenSink>),
        cancel: Some(cancel),
        ..Default::default()
    };

    let provider = if dispatcher.uses_mock() { "mock" } else { "openai-compatible" };
    let span = info_span!(
        "gen_ai.reply",
        gen_ai.operation.name = OP_CHAT,
        gen_ai.provider.name = provider,
        gen_ai.request.model = %args.model.as_deref().unwrap_or(dispatcher.model()),
        gen_ai.response.model = Empty,
        gen_ai.response.finish_reasons = Empty,
        gen_ai.usage.input_tokens = Empty,
        gen_ai.usage.output_tokens = Empty,
    );

    let result = match dispatcher
        .complete(&messages, options)
        .instrument(span.clone())
        .await
    {
        Ok(result) => result,
        Err(err) => {
            tracing::error!(error = %err, cause = %err.last_failure(), "Reply generation failed");
            bail!(REPLY_FAILED);
        }
    };

    record_outcome(&span, &result);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if echo_tokens {
        println!();
    } else {
        println!("{}", result.content);
    }
    println!("{}", style(summary_line(&result)).dim());
    Ok(())
}

fn record_outcome(span: &tracing::Span, result: &CompletionResult) {
    span.record(GEN_AI_RESPONSE_MODEL, result.model.as_str());
    if let Some(reason) = &result.finish_reason {
        span.record(GEN_AI_RESPONSE_FINISH_REASONS, reason.as_str());
    }
    if let Some(usage) = &result.usage {
        if let Some(n) = usage.prompt_tokens {
            span.record(GEN_AI_USAGE_INPUT_TOKENS, n);
        }
        if let Some(n) = usage.completion_tokens {
            span.record(GEN_AI_USAGE_OUTPUT_TOKENS, n);
        }
    }
}

fn summary_line(result: &CompletionResult) -> String {
    let mut line = format!(
        "model: {} | finish: {}",
        result.model,
        result.finish_reason.as_deref().unwrap_or("unknown")
    );
    if let Some(total) = result.usage.as_ref().and_then(|u| u.total_tokens) {
        line.push_str(&format!(" | tokens: {total}"));
    }
    line
}
