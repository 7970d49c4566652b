use crate::error::BackendError;
use crate::providers::{http_client, require_success, text_at_pointer, vector_from_value};
use crate::traits::{EmbeddingBackend, GenerationBackend};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const BACKEND: &str = "openai";
const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const OPENAI_CHAT_MODEL: &str = "gpt-4o";
pub const OPENAI_EMBED_MODEL: &str = "text-embedding-3-small";

/// OpenAI embeddings and chat completions over the plain REST API.
pub struct OpenAiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    temperature: f32,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>, temperature: f32) -> Self {
        Self {
            client: http_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            temperature,
        }
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAiBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        let vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::InvalidResponse {
                backend: BACKEND.to_string(),
                details: "embedding response was empty".to_string(),
            })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": OPENAI_EMBED_MODEL,
                "input": texts,
            }))
            .send()
            .await?;
        let response = require_success(BACKEND, response).await?;
        let parsed: Value = response.json().await?;

        let rows = parsed
            .pointer("/data")
            .and_then(Value::as_array)
            .ok_or_else(|| BackendError::InvalidResponse {
                backend: BACKEND.to_string(),
                details: "missing data array".to_string(),
            })?;

        rows.iter()
            .map(|row| {
                row.pointer("/embedding")
                    .ok_or_else(|| BackendError::InvalidResponse {
                        backend: BACKEND.to_string(),
                        details: "missing embedding field".to_string(),
                    })
                    .and_then(|value| vector_from_value(BACKEND, value))
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn model(&self) -> &str {
        OPENAI_EMBED_MODEL
    }
}

#[async_trait]
impl GenerationBackend for OpenAiBackend {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": OPENAI_CHAT_MODEL,
                "temperature": self.temperature,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": prompt },
                ],
            }))
            .send()
            .await?;
        let response = require_success(BACKEND, response).await?;
        let parsed: Value = response.json().await?;

        text_at_pointer(BACKEND, &parsed, "/choices/0/message/content")
    }

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn model(&self) -> &str {
        OPENAI_CHAT_MODEL
    }
}
