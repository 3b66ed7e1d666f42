//! Builds the message list sent to the completion provider.

use crate::history::{Role, Turn};
use crate::llm::ChatMessage;
use crate::rag::RetrievalResult;

/// Delimiter between the context block and the literal user query.
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

#[derive(Debug, Clone)]
pub struct PromptAssembler {
    max_context_chars: usize,
    include_citations: bool,
}

impl PromptAssembler {
    pub fn new(max_context_chars: usize, include_citations: bool) -> Self {
        Self {
            max_context_chars,
            include_citations,
        }
    }

    /// Turns in order, with retrieved context folded into the latest user turn.
    ///
    /// Earlier turns pass through untouched so multi-turn corrections keep
    /// their history. With no hits the latest user turn is also unchanged.
    pub fn assemble(&self, turns: &[Turn], retrieval: &RetrievalResult) -> Vec<ChatMessage> {
        let context = self.format_context(retrieval);
        let last_user = turns.iter().rposition(|turn| turn.role == Role::User);

        turns
            .iter()
            .enumerate()
            .map(|(idx, turn)| {
                let content = match (&context, last_user) {
                    (Some(context), Some(target)) if idx == target => {
                        format!("context:\n{}{}{}", context, CONTEXT_SEPARATOR, turn.content)
                    }
                    _ => turn.content.clone(),
                };
                ChatMessage::new(turn.role.as_str(), content)
            })
            .collect()
    }

    /// Whole chunks only. The first hit is always kept even when it alone
    /// exceeds `max_context_chars`.
    pub fn format_context(&self, retrieval: &RetrievalResult) -> Option<String> {
        if retrieval.is_empty() {
            return None;
        }

        let mut blocks: Vec<String> = Vec::new();
        let mut used = 0;
        for (i, hit) in retrieval.hits.iter().enumerate() {
            let block = if self.include_citations {
                format!(
                    "[{}] (source: {}, relevance: {:.2})\n{}",
                    i + 1,
                    hit.chunk.doc_id,
                    hit.score,
                    hit.chunk.text.trim()
                )
            } else {
                hit.chunk.text.trim().to_string()
            };

            let cost = block.chars().count() + if blocks.is_empty() { 0 } else { 2 };
            if !blocks.is_empty() && used + cost > self.max_context_chars {
                break;
            }
            used += cost;
            blocks.push(block);
        }

        Some(blocks.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::rag::{Chunk, RetrievedChunk};

    fn turn(role: Role, content: &str, position: usize) -> Turn {
        Turn {
            role,
            content: content.to_string(),
            position,
            created_at: Utc::now(),
        }
    }

    fn hit(doc: &str, text: &str, score: f32) -> RetrievedChunk {
        RetrievedChunk {
            chunk: Chunk {
                doc_id: doc.to_string(),
                ordinal: 0,
                start: 0,
                end: text.len(),
                text: text.to_string(),
                max_length: 20,
                overlap: 0,
            },
            score,
        }
    }

    fn conversation() -> Vec<Turn> {
        vec![
            turn(Role::System, "You are an english teacher.", 0),
            turn(Role::User, "I has a apple.", 1),
            turn(Role::Assistant, "I have an apple.", 2),
            turn(Role::User, "Where did the cat sit?", 3),
        ]
    }

    #[test]
    fn empty_retrieval_passes_turns_through() {
        let assembler = PromptAssembler::new(4000, true);
        let messages = assembler.assemble(&conversation(), &RetrievalResult::empty());

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], ChatMessage::new("system", "You are an english teacher."));
        assert_eq!(messages[3], ChatMessage::new("user", "Where did the cat sit?"));
    }

    #[test]
    fn context_is_folded_into_the_latest_user_turn_only() {
        let assembler = PromptAssembler::new(4000, true);
        let retrieval = RetrievalResult {
            hits: vec![hit("cat.txt", "The cat sat on the mat.", 0.8123)],
        };
        let messages = assembler.assemble(&conversation(), &retrieval);

        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "I has a apple.");
        assert_eq!(
            messages[3].content,
            "context:\n[1] (source: cat.txt, relevance: 0.81)\nThe cat sat on the mat.\n---\nWhere did the cat sit?"
        );
    }

    #[test]
    fn citations_can_be_disabled() {
        let assembler = PromptAssembler::new(4000, false);
        let retrieval = RetrievalResult {
            hits: vec![hit("a", "alpha", 0.9), hit("b", "beta", 0.5)],
        };
        assert_eq!(assembler.format_context(&retrieval).as_deref(), Some("alpha\n\nbeta"));
    }

    #[test]
    fn context_respects_the_character_cap_with_whole_chunks() {
        let assembler = PromptAssembler::new(12, false);
        let retrieval = RetrievalResult {
            hits: vec![
                hit("a", "0123456789", 0.9),
                hit("b", "abcdefghij", 0.8),
            ],
        };
        assert_eq!(assembler.format_context(&retrieval).as_deref(), Some("0123456789"));

        let tiny = PromptAssembler::new(3, false);
        assert_eq!(tiny.format_context(&retrieval).as_deref(), Some("0123456789"));
    }

    #[test]
    fn no_user_turn_leaves_messages_unchanged() {
        let assembler = PromptAssembler::new(4000, true);
        let turns = vec![turn(Role::System, "sys", 0)];
        let retrieval = RetrievalResult {
            hits: vec![hit("a", "alpha", 0.9)],
        };
        let messages = assembler.assemble(&turns, &retrieval);
        assert_eq!(messages, vec![ChatMessage::new("system", "sys")]);
    }
}
