use crate::error::BackendError;
use crate::providers::{http_client, require_success, text_at_pointer};
use crate::traits::GenerationBackend;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const BACKEND: &str = "groq";
const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai";
pub const GROQ_DEFAULT_MODEL: &str = "mixtral-8x7b-32768";

/// Groq's OpenAI-compatible chat API. Groq serves generation only; the
/// resolver pairs it with the local embedding backend.
pub struct GroqGenerator {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GroqGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client: http_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
        }
    }
}

#[async_trait]
impl GenerationBackend for GroqGenerator {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
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
        &self.model
    }
}
