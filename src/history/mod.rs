//! In-memory conversation log for one session.
//!
//! Turns only grow between resets, and the first turn is always the system
//! instruction. Callers get copies through `snapshot`; the log itself stays
//! owned by the engine.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::TutorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TutorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(TutorError::InvalidRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Zero-based; equals the turn's index in the log.
    pub position: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new(system_instruction: &str) -> Self {
        let mut state = Self { turns: Vec::new() };
        state.reset(system_instruction);
        state
    }

    /// Append with a role given as text; unknown roles fail with `InvalidRole`.
    pub fn append(&mut self, role: &str, content: &str) -> Result<&Turn, TutorError> {
        let role = role.parse::<Role>()?;
        Ok(self.push(role, content))
    }

    pub fn push(&mut self, role: Role, content: &str) -> &Turn {
        let position = self.turns.len();
        self.turns.push(Turn {
            role,
            content: content.to_string(),
            position,
            created_at: Utc::now(),
        });
        &self.turns[position]
    }

    /// Drop every turn and start over with a single system turn.
    pub fn reset(&mut self, system_instruction: &str) {
        self.turns.clear();
        self.push(Role::System, system_instruction);
    }

    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn system_instruction(&self) -> &str {
        self.turns
            .first()
            .map(|turn| turn.content.as_str())
            .unwrap_or_default()
    }
}
