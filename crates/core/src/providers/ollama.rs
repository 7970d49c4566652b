use crate::error::BackendError;
use crate::providers::{http_client, require_success, text_at_pointer, vector_from_value};
use crate::traits::{EmbeddingBackend, GenerationBackend};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

const BACKEND: &str = "ollama";
pub const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";
pub const OLLAMA_DEFAULT_MODEL: &str = "llama2";
pub const OLLAMA_DEFAULT_EMBED_MODEL: &str = "nomic-embed-text";

/// Local Ollama server, no credentials required.
pub struct OllamaBackend {
    client: Client,
    base_url: Url,
    model: String,
    embed_model: String,
    temperature: f32,
}

impl OllamaBackend {
    pub fn new(
        base_url: Url,
        model: impl Into<String>,
        embed_model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            client: http_client(),
            base_url,
            model: model.into(),
            embed_model: embed_model.into(),
            temperature,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl EmbeddingBackend for OllamaBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        let response = self
            .client
            .post(self.endpoint("/api/embeddings"))
            .json(&json!({
                "model": self.embed_model,
                "prompt": text,
            }))
            .send()
            .await?;
        let response = require_success(BACKEND, response).await?;
        let parsed: Value = response.json().await?;

        let values = parsed
            .pointer("/embedding")
            .ok_or_else(|| BackendError::InvalidResponse {
                backend: BACKEND.to_string(),
                details: "missing embedding field".to_string(),
            })?;
        vector_from_value(BACKEND, values)
    }

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn model(&self) -> &str {
        &self.embed_model
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(self.endpoint("/api/chat"))
            .json(&json!({
                "model": self.model,
                "stream": false,
                "options": { "temperature": self.temperature },
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": prompt },
                ],
            }))
            .send()
            .await?;
        let response = require_success(BACKEND, response).await?;
        let parsed: Value = response.json().await?;

        text_at_pointer(BACKEND, &parsed, "/message/content")
    }

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn model(&self) -> &str {
        &self.model
    }
}
