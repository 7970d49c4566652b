use crate::error::BackendError;
use crate::providers::{http_client, require_success, text_at_pointer, vector_from_value};
use crate::traits::{EmbeddingBackend, GenerationBackend};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const BACKEND: &str = "gemini";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_CHAT_MODEL: &str = "gemini-pro";
pub const GEMINI_EMBED_MODEL: &str = "embedding-001";

/// Google Generative Language API: `embedContent` for embeddings and
/// `generateContent` for answers.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    temperature: f32,
}

impl GeminiBackend {
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
impl EmbeddingBackend for GeminiBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:embedContent",
                self.base_url, GEMINI_EMBED_MODEL
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "model": format!("models/{GEMINI_EMBED_MODEL}"),
                "content": { "parts": [{ "text": text }] },
            }))
            .send()
            .await?;
        let response = require_success(BACKEND, response).await?;
        let parsed: Value = response.json().await?;

        let values = parsed
            .pointer("/embedding/values")
            .ok_or_else(|| BackendError::InvalidResponse {
                backend: BACKEND.to_string(),
                details: "missing embedding values".to_string(),
            })?;
        vector_from_value(BACKEND, values)
    }

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn model(&self) -> &str {
        GEMINI_EMBED_MODEL
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, GEMINI_CHAT_MODEL
            ))
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "systemInstruction": { "parts": [{ "text": system }] },
                "contents": [
                    { "role": "user", "parts": [{ "text": prompt }] },
                ],
                "generationConfig": { "temperature": self.temperature },
            }))
            .send()
            .await?;
        let response = require_success(BACKEND, response).await?;
        let parsed: Value = response.json().await?;

        text_at_pointer(BACKEND, &parsed, "/candidates/0/content/parts/0/text")
    }

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn model(&self) -> &str {
        GEMINI_CHAT_MODEL
    }
}
