//! Line-oriented console session over stdin/stdout.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::core::errors::TutorError;
use crate::engine::{Answer, ConversationEngine, Grounding};
use crate::history::Turn;

pub const PROMPT: &str = "USER_: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Exit,
    Reset,
    History,
    Skip,
    Ask(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            ConsoleCommand::Skip
        } else if trimmed.eq_ignore_ascii_case("exit") {
            ConsoleCommand::Exit
        } else if trimmed == "/reset" {
            ConsoleCommand::Reset
        } else if trimmed == "/history" {
            ConsoleCommand::History
        } else {
            ConsoleCommand::Ask(trimmed.to_string())
        }
    }
}

pub fn render_answer(answer: &Answer) -> String {
    let mut out = format!("Bot: {}", answer.text);
    match &answer.grounding {
        Grounding::Context { sources } => {
            out.push_str(&format!("\n[context: {}]", sources.join(", ")));
        }
        Grounding::Degraded { reason } => {
            out.push_str(&format!("\n[degraded: {}]", reason));
        }
        Grounding::Plain => {}
    }
    out
}

pub fn render_error(err: &TutorError) -> String {
    format!("[failed: {}] {}", err.kind(), err)
}

pub fn render_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("{:>3} {:<9} {}", turn.position, turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read queries until `exit` or end of input.
pub async fn run(engine: &ConversationEngine) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(PROMPT.as_bytes()).await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read from stdin")? else {
            break;
        };

        let output = match ConsoleCommand::parse(&line) {
            ConsoleCommand::Exit => break,
            ConsoleCommand::Skip => continue,
            ConsoleCommand::Reset => {
                engine.reset_conversation().await;
                "Conversation cleared.".to_string()
            }
            ConsoleCommand::History => render_history(&engine.conversation_snapshot().await),
            ConsoleCommand::Ask(query) => match engine.ask(&query).await {
                Ok(answer) => render_answer(&answer),
                Err(err) => render_error(&err),
            },
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::history::Role;

    #[test]
    fn exit_is_case_insensitive() {
        assert_eq!(ConsoleCommand::parse("EXIT"), ConsoleCommand::Exit);
        assert_eq!(ConsoleCommand::parse("  exit \n"), ConsoleCommand::Exit);
    }

    #[test]
    fn slash_commands_and_queries_are_distinguished() {
        assert_eq!(ConsoleCommand::parse("/reset"), ConsoleCommand::Reset);
        assert_eq!(ConsoleCommand::parse("/history"), ConsoleCommand::History);
        assert_eq!(ConsoleCommand::parse("   "), ConsoleCommand::Skip);
        assert_eq!(
            ConsoleCommand::parse("I has went home"),
            ConsoleCommand::Ask("I has went home".to_string())
        );
    }

    #[test]
    fn rendering_distinguishes_the_three_outcomes() {
        let grounded = Answer {
            text: "I went home.".to_string(),
            grounding: Grounding::Context {
                sources: vec!["grammar.md".to_string(), "verbs.txt".to_string()],
            },
        };
        assert_eq!(render_answer(&grounded), "Bot: I went home.\n[context: grammar.md, verbs.txt]");

        let degraded = Answer {
            text: "I went home.".to_string(),
            grounding: Grounding::Degraded {
                reason: "embedding unavailable: timeout".to_string(),
            },
        };
        assert_eq!(
            render_answer(&degraded),
            "Bot: I went home.\n[degraded: embedding unavailable: timeout]"
        );

        let plain = Answer {
            text: "I went home.".to_string(),
            grounding: Grounding::Plain,
        };
        assert_eq!(render_answer(&plain), "Bot: I went home.");

        let failed = render_error(&TutorError::CompletionUnavailable("502".to_string()));
        assert_eq!(failed, "[failed: completion_unavailable] completion unavailable: 502");
    }

    #[test]
    fn history_lists_turns_in_order() {
        let turns = vec![
            Turn {
                role: Role::System,
                content: "sys".to_string(),
                position: 0,
                created_at: Utc::now(),
            },
            Turn {
                role: Role::User,
                content: "hi".to_string(),
                position: 1,
                created_at: Utc::now(),
            },
        ];
        assert_eq!(render_history(&turns), "  0 system    sys\n  1 user      hi");
    }
}
