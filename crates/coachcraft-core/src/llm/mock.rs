//! Offline provider used when no API key is configured.
//!
//! Replies are deterministic, so conversations can be exercised end to end
//! without network access.

use serde_json::json;

use coachcraft_types::llm::{CompletionResult, Message, MessageRole};

use super::sink::TokenSink;

pub const MOCK_MODEL: &str = "mock-coach";

const OPENING: &str = "（模拟教练）我已经收到你的问题。";
const FRAMING: &str = "让我们沿着“现象→原因→本质→原理→趋势”的链路来梳理思路。";
const ADVICE: &str = "以下是建议：现象层先承认情境，原因层探究触发因素，本质层厘清核心矛盾，原理层总结可复用的方法，趋势层提示下一步方向。";

/// The reply fragments for `messages`, in delivery order.
///
/// The most recent user message is echoed back when it has content.
pub fn mock_segments(messages: &[Message]) -> Vec<String> {
    let last_user = messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .map(|m| m.content.as_str())
        .filter(|content| !content.is_empty());

    let mut segments = vec![OPENING.to_string(), FRAMING.to_string()];
    if let Some(content) = last_user {
        segments.push(format!("你提到：“{content}”。"));
    }
    segments.push(ADVICE.to_string());
    segments
}

/// Produce the mock reply, delivering each segment to `sink` in order.
pub fn mock_completion(messages: &[Message], sink: Option<&dyn TokenSink>) -> CompletionResult {
    let segments = mock_segments(messages);
    if let Some(sink) = sink {
        for segment in &segments {
            sink.on_token(segment);
        }
    }

    CompletionResult {
        content: segments.concat(),
        model: MOCK_MODEL.to_string(),
        finish_reason: Some("stop".to_string()),
        usage: None,
        raw: Some(json!({ "provider": "mock" })),
    }
}
