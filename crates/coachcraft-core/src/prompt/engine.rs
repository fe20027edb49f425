//! System prompt rendering and message assembly.
//!
//! The system prompt is a fixed sequence of sections separated by blank
//! lines:
//!
//! ```text
//! 角色定位：{role}
//!
//! 教练类型：{coach_type}
//!
//! 语气设定：{tone}
//!
//! 思维框架：{thinking_framework}
//!
//! 层级配比（现象→原因→本质→原理→趋势）：现象30%｜原因25%｜本质20%｜原理15%｜趋势10%
//!
//! 角色目标：
//! - {goal}
//!
//! 对话背景：
//! 会话标题：{title}
//! 会话摘要：{summary}
//! 学员姓名：{user_name}
//!
//! 表达要求：
//! {instructions...}
//! ```
//!
//! Rendering depends only on its inputs, so identical inputs always yield a
//! byte-identical prompt.

use tracing::debug;

use coachcraft_types::chat::{ConversationContext, HistoryMessage};
use coachcraft_types::error::PromptError;
use coachcraft_types::llm::{Message, MessageRole};
use coachcraft_types::persona::{Persona, PersonaOverride};

use crate::persona::{compose, default_persona, extract_override};

/// Inputs for [`PromptEngine::build_messages`].
#[derive(Debug, Clone, Copy)]
pub struct BuildMessagesParams<'a> {
    pub conversation: &'a ConversationContext,
    pub history: &'a [HistoryMessage],
    pub latest_user_message: &'a str,
    pub user_name: Option<&'a str>,
    /// Per-call persona override; wins over the conversation's stored config.
    pub overrides: Option<&'a PersonaOverride>,
}

/// Inputs for [`PromptEngine::render_system_prompt`].
#[derive(Debug, Clone, Copy)]
pub struct SystemPromptInput<'a> {
    pub persona: &'a Persona,
    pub conversation_title: &'a str,
    pub conversation_summary: Option<&'a str>,
    pub user_name: Option<&'a str>,
    pub goals: &'a [String],
    pub custom_instructions: Option<&'a str>,
}

/// Turns persona layers plus conversation context into a message sequence.
#[derive(Debug, Clone)]
pub struct PromptEngine {
    defaults: Persona,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptEngine {
    /// Engine backed by the built-in coaching persona.
    pub fn new() -> Self {
        Self {
            defaults: default_persona(),
        }
    }

    /// Engine whose defaults are the built-in persona with `overrides`
    /// applied on top.
    pub fn with_defaults(overrides: &PersonaOverride) -> Self {
        Self {
            defaults: compose(&default_persona(), [overrides]),
        }
    }

    pub fn defaults(&self) -> &Persona {
        &self.defaults
    }

    /// Resolve the persona for one call: defaults, then the conversation's
    /// stored config, then the runtime override.
    pub fn resolve_persona(
        &self,
        conversation: &ConversationContext,
        overrides: Option<&PersonaOverride>,
    ) -> Persona {
        let stored = conversation
            .prompt_config
            .as_ref()
            .map(extract_override)
            .unwrap_or_default();
        compose(&self.defaults, std::iter::once(&stored).chain(overrides))
    }

    /// Assemble `[system, ...history, user]` for one reply.
    pub fn build_messages(
        &self,
        params: &BuildMessagesParams<'_>,
    ) -> Result<Vec<Message>, PromptError> {
        let latest = params.latest_user_message.trim();
        if latest.is_empty() {
            return Err(PromptError::EmptyUserMessage);
        }

        let persona = self.resolve_persona(params.conversation, params.overrides);
        let system_prompt = self.render_system_prompt(&SystemPromptInput {
            persona: &persona,
            conversation_title: &params.conversation.title,
            conversation_summary: params.conversation.summary.as_deref(),
            user_name: params.user_name,
            goals: &persona.goals,
            custom_instructions: persona.custom_instructions.as_deref(),
        });

        let mut messages = Vec::with_capacity(params.history.len() + 2);
        messages.push(Message::system(system_prompt));
        messages.extend(
            params
                .history
                .iter()
                .filter(|m| !m.content.trim().is_empty())
                .map(|m| Message::new(MessageRole::from(m.role), m.content.clone())),
        );
        messages.push(Message::user(latest));

        debug!(
            history = params.history.len(),
            messages = messages.len(),
            "assembled prompt messages"
        );
        Ok(messages)
    }

    /// Render the system prompt. Pure: no clock, no randomness, no I/O.
    pub fn render_system_prompt(&self, input: &SystemPromptInput<'_>) -> String {
        let persona = input.persona;
        let mix = persona.layer_mix.to_string();

        let goals = if input.goals.is_empty() {
            &self.defaults.goals
        } else {
            input.goals
        };
        let goal_lines: Vec<String> = goals.iter().map(|g| format!("- {g}")).collect();

        let mut background_lines = vec![format!("会话标题：{}", input.conversation_title)];
        background_lines.extend(
            [
                non_empty(input.conversation_summary).map(|s| format!("会话摘要：{s}")),
                non_empty(input.user_name).map(|n| format!("学员姓名：{n}")),
            ]
            .into_iter()
            .flatten(),
        );
        let background = background_lines.join("\n");

        let mut instruction_lines = vec![
            "全程使用地道的中文，与学员保持温暖而专业的互动。".to_string(),
            format!("请严格按照“现象→原因→本质→原理→趋势”的顺序组织内容，并结合层级配比 {mix}。"),
            "每个层级单独成段，可使用编号或小标题，确保条理清晰。".to_string(),
            "在结尾补充“下一步行动建议”，聚焦一项可落地的行动。".to_string(),
        ];
        if !persona.style_guidance.trim().is_empty() {
            instruction_lines.push(persona.style_guidance.clone());
        }
        if let Some(custom) = non_empty(input.custom_instructions) {
            instruction_lines.push(custom.to_string());
        }

        [
            format!("角色定位：{}", persona.role),
            format!("教练类型：{}", persona.coach_type),
            format!("语气设定：{}", persona.tone),
            format!("思维框架：{}", persona.thinking_framework),
            format!("层级配比（现象→原因→本质→原理→趋势）：{mix}"),
            format!("角色目标：\n{}", goal_lines.join("\n")),
            format!("对话背景：\n{background}"),
            format!("表达要求：\n{}", instruction_lines.join("\n")),
        ]
        .join("\n\n")
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
