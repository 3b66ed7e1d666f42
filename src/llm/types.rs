use serde::{Deserialize, Serialize};

use crate::core::config::LlmConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Sampling options from config; unset fields keep the provider's defaults.
    pub fn with_config(mut self, config: &LlmConfig) -> Self {
        self.temperature = config.temperature.or(self.temperature);
        self.max_tokens = config.max_tokens.or(self.max_tokens);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_overrides_only_set_fields() {
        let mut config = LlmConfig::default();
        config.temperature = Some(0.2);
        config.max_tokens = None;

        let mut request = ChatRequest::new(vec![ChatMessage::new("user", "hi")]);
        request.max_tokens = Some(128);
        let request = request.with_config(&config);

        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(128));
    }
}
