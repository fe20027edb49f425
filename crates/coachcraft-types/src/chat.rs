//! Conversation data consumed by the prompt renderer.
//!
//! These mirror rows already fetched by the surrounding request handler;
//! nothing here talks to storage.

use serde::{Deserialize, Serialize};

use crate::llm::MessageRole;

/// Role of a persisted conversation message (`USER`, `ASSISTANT`, `SYSTEM`).
///
/// Unknown stored values are treated as `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StoredRole {
    User,
    Assistant,
    System,
}

impl From<&str> for StoredRole {
    fn from(s: &str) -> Self {
        match s {
            "ASSISTANT" => StoredRole::Assistant,
            "SYSTEM" => StoredRole::System,
            _ => StoredRole::User,
        }
    }
}

impl From<String> for StoredRole {
    fn from(s: String) -> Self {
        StoredRole::from(s.as_str())
    }
}

impl From<StoredRole> for String {
    fn from(role: StoredRole) -> Self {
        match role {
            StoredRole::User => "USER".into(),
            StoredRole::Assistant => "ASSISTANT".into(),
            StoredRole::System => "SYSTEM".into(),
        }
    }
}

impl From<StoredRole> for MessageRole {
    fn from(role: StoredRole) -> Self {
        match role {
            StoredRole::Assistant => MessageRole::Assistant,
            StoredRole::System => MessageRole::System,
            StoredRole::User => MessageRole::User,
        }
    }
}

/// One message from the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: StoredRole,
    pub content: String,
}

/// The conversation fields the prompt renderer needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    /// Stored persona config of unknown shape; parsed leniently.
    #[serde(default)]
    pub prompt_config: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_role_mapping() {
        assert_eq!(MessageRole::from(StoredRole::from("ASSISTANT")), MessageRole::Assistant);
        assert_eq!(MessageRole::from(StoredRole::from("SYSTEM")), MessageRole::System);
        assert_eq!(MessageRole::from(StoredRole::from("USER")), MessageRole::User);
        assert_eq!(MessageRole::from(StoredRole::from("TOOL")), MessageRole::User);
    }

    #[test]
    fn test_history_message_deserializes_unknown_role_as_user() {
        let msg: HistoryMessage =
            serde_json::from_str(r#"{"role":"moderator","content":"hi"}"#).unwrap();
        assert_eq!(msg.role, StoredRole::User);
    }

    #[test]
    fn test_conversation_context_defaults() {
        let ctx: ConversationContext = serde_json::from_str(r#"{"title":"复盘"}"#).unwrap();
        assert_eq!(ctx.title, "复盘");
        assert!(ctx.summary.is_none());
        assert!(ctx.prompt_config.is_none());
    }
}
