//! `ccraft prompt` -- show the message sequence a reply would be built from.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use console::style;

use coachcraft_core::prompt::PromptEngine;
use coachcraft_types::llm::Message;

use super::conversation::ConversationFile;

#[derive(Args, Debug)]
pub struct PromptArgs {
    /// Conversation snapshot (JSON) with title, summary, config and history.
    #[arg(long)]
    pub conversation: PathBuf,

    /// The latest user message.
    #[arg(long)]
    pub message: String,
}

pub async fn run(args: PromptArgs, json: bool) -> Result<()> {
    let file = ConversationFile::load(&args.conversation).await?;
    let messages = PromptEngine::new().build_messages(&file.params(&args.message))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
    } else {
        println!("{}", render(&messages));
    }
    Ok(())
}

fn render(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}\n{}", style(format!("[{}]", m.role)).cyan().bold(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_labels_each_role() {
        console::set_colors_enabled(false);
        let text = render(&[Message::system("系统"), Message::user("你好")]);
        assert_eq!(text, "[system]\n系统\n\n[user]\n你好");
    }
}
