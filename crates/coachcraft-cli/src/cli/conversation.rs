//! Conversation input file.
//!
//! The surrounding application fetches the conversation row and its
//! history; the CLI reads that snapshot from JSON:
//!
//! ```json
//! {
//!   "title": "季度复盘",
//!   "summary": "讨论团队协作中的沟通阻塞",
//!   "promptConfig": { "tone": "沉稳而坚定" },
//!   "userName": "小林",
//!   "history": [{ "role": "USER", "content": "上周的会议效率很低" }],
//!   "overrides": { "coachType": "韧性重塑教练" }
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use coachcraft_core::persona::extract_override;
use coachcraft_core::prompt::BuildMessagesParams;
use coachcraft_types::chat::{ConversationContext, HistoryMessage};
use coachcraft_types::persona::PersonaOverride;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationFile {
    #[serde(flatten)]
    pub conversation: ConversationContext,
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
    #[serde(default)]
    pub user_name: Option<String>,
    /// Per-call persona override. Read with the same lenient rules as the
    /// stored prompt config: mistyped fields are dropped, not rejected.
    #[serde(default, deserialize_with = "lenient_override")]
    pub overrides: Option<PersonaOverride>,
}

fn lenient_override<'de, D>(deserializer: D) -> Result<Option<PersonaOverride>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(extract_override))
}

impl ConversationFile {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read conversation file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid conversation file {}", path.display()))
    }

    pub fn params<'a>(&'a self, latest_user_message: &'a str) -> BuildMessagesParams<'a> {
        BuildMessagesParams {
            conversation: &self.conversation,
            history: &self.history,
            latest_user_message,
            user_name: self.user_name.as_deref(),
            overrides: self.overrides.as_ref(),
        }
    }
}
