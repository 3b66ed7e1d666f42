use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{CompletionProvider, Embedder};
use super::types::ChatRequest;
use crate::core::errors::TutorError;

/// Client for OpenAI-compatible HTTP APIs (Groq, OpenAI, LM Studio, llama.cpp server).
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, TutorError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TutorError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client,
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.post(format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// `/v1/embeddings`; one vector per input, in input order.
    pub async fn embeddings(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, TutorError> {
        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let res = self
            .post("/v1/embeddings")
            .json(&body)
            .send()
            .await
            .map_err(TutorError::embedding)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(TutorError::EmbeddingUnavailable(format!(
                "embedding request failed ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(TutorError::embedding)?;
        let data = payload["data"]
            .as_array()
            .ok_or_else(|| TutorError::embedding("response has no data array"))?;

        if data.len() != inputs.len() {
            return Err(TutorError::EmbeddingUnavailable(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                data.len()
            )));
        }

        // Slot by the explicit index field when present.
        let mut slots: Vec<Option<Vec<f32>>> = vec![None; inputs.len()];
        for (pos, item) in data.iter().enumerate() {
            let idx = match &item["index"] {
                Value::Null => pos,
                other => other
                    .as_u64()
                    .map(|i| i as usize)
                    .ok_or_else(|| TutorError::embedding(format!("invalid index in entry {}", pos)))?,
            };
            let slot = slots
                .get_mut(idx)
                .ok_or_else(|| TutorError::embedding(format!("embedding index {} out of range", idx)))?;
            if slot.is_some() {
                return Err(TutorError::embedding(format!("duplicate embedding index {}", idx)));
            }

            let vals = item["embedding"]
                .as_array()
                .ok_or_else(|| TutorError::embedding("entry has no embedding"))?;
            let vector = vals
                .iter()
                .map(|v| {
                    v.as_f64()
                        .map(|f| f as f32)
                        .ok_or_else(|| TutorError::embedding(format!("non-numeric value in embedding {}", idx)))
                })
                .collect::<Result<Vec<f32>, TutorError>>()?;
            *slot = Some(vector);
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn health_check(&self) -> Result<bool, TutorError> {
        let url = format!("{}/v1/models", self.base_url);
        let mut builder = self.client.get(&url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        match builder.send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, TutorError> {
        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(t));
            }
        }

        let res = self
            .post("/v1/chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(TutorError::completion)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(TutorError::CompletionUnavailable(format!(
                "chat request failed ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(TutorError::completion)?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| TutorError::completion("response has no message content"))
    }
}

/// `Embedder` backed by the remote `/v1/embeddings` endpoint.
#[derive(Clone)]
pub struct RemoteEmbedder {
    provider: OpenAiProvider,
    model: String,
}

impl RemoteEmbedder {
    pub fn new(provider: OpenAiProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    fn id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, TutorError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        self.provider.embeddings(inputs, &self.model).await
    }
}
