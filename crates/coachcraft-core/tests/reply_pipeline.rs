//! End-to-end: conversation context -> prompt -> mock dispatch.

use std::sync::{Arc, Mutex};

use serde_json::json;

use coachcraft_core::llm::{CompletionDispatcher, CompletionOptions, TokenSink};
use coachcraft_core::llm::transport::{ChatRequest, ChatTransport, ProviderTarget};
use coachcraft_core::prompt::{BuildMessagesParams, PromptEngine};
use coachcraft_types::chat::{ConversationContext, HistoryMessage, StoredRole};
use coachcraft_types::config::DispatcherConfig;
use coachcraft_types::llm::{CompletionResult, LlmError, MessageRole};
use coachcraft_types::persona::PersonaOverride;
use tokio_util::sync::CancellationToken;

/// Transport that must never be reached in mock mode.
struct Unreachable;

impl ChatTransport for Unreachable {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn send(
        &self,
        _target: &ProviderTarget<'_>,
        _request: &ChatRequest,
        _sink: Option<&dyn TokenSink>,
        _cancel: &CancellationToken,
    ) -> Result<CompletionResult, LlmError> {
        panic!("mock mode must not use the transport");
    }
}

fn conversation() -> ConversationContext {
    ConversationContext {
        title: "季度复盘".into(),
        summary: Some("讨论团队协作中的沟通阻塞".into()),
        prompt_config: Some(json!({
            "tone": "沉稳而坚定",
            "goals": ["建立每周同步机制"],
        })),
    }
}

#[tokio::test]
async fn test_prompt_to_mock_reply() {
    let engine = PromptEngine::new();
    let history = vec![
        HistoryMessage {
            role: StoredRole::User,
            content: "上周的会议效率很低".into(),
        },
        HistoryMessage {
            role: StoredRole::Assistant,
            content: "我们先看看现象层。".into(),
        },
        HistoryMessage {
            role: StoredRole::User,
            content: "   ".into(),
        },
    ];
    let runtime = PersonaOverride {
        coach_type: Some("韧性重塑教练".into()),
        ..Default::default()
    };

    let messages = engine
        .build_messages(&BuildMessagesParams {
            conversation: &conversation(),
            history: &history,
            latest_user_message: "  我该如何推动跨部门沟通？ ",
            user_name: Some("小林"),
            overrides: Some(&runtime),
        })
        .unwrap();

    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].role, MessageRole::System);
    let system = &messages[0].content;
    assert!(system.contains("语气设定：沉稳而坚定"));
    assert!(system.contains("教练类型：韧性重塑教练"));
    assert!(system.contains("- 建立每周同步机制"));
    assert!(system.contains("学员姓名：小林"));
    assert_eq!(messages[3].content, "我该如何推动跨部门沟通？");

    let dispatcher = CompletionDispatcher::new(DispatcherConfig::default(), Unreachable);
    let tokens = Arc::new(Mutex::new(Vec::<String>::new()));
    let collected = Arc::clone(&tokens);
    let sink = move |token: &str| collected.lock().unwrap().push(token.to_string());

    let result = dispatcher
        .complete(&messages, CompletionOptions::streaming(Arc::new(sink)))
        .await
        .unwrap();

    assert_eq!(result.model, "mock-coach");
    assert_eq!(result.finish_reason.as_deref(), Some("stop"));
    assert!(result.content.contains("你提到：“我该如何推动跨部门沟通？”。"));
    assert_eq!(tokens.lock().unwrap().concat(), result.content);
}

#[tokio::test]
async fn test_blank_input_never_reaches_dispatcher() {
    let engine = PromptEngine::new();
    let err = engine
        .build_messages(&BuildMessagesParams {
            conversation: &conversation(),
            history: &[],
            latest_user_message: "\n\t ",
            user_name: None,
            overrides: None,
        })
        .unwrap_err();

    assert_eq!(err.to_string(), "latest user message is empty");
}
