use crate::error::BackendError;
use crate::providers::{http_client, require_success, vector_from_value};
use crate::traits::{EmbeddingBackend, GenerationBackend};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const BACKEND: &str = "huggingface";
const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const HF_DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";
pub const HF_DEFAULT_EMBED_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Hugging Face Inference API: feature-extraction pipeline for embeddings,
/// text-generation for answers.
pub struct HuggingFaceBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    embed_model: String,
    temperature: f32,
}

impl HuggingFaceBackend {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        embed_model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            client: http_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            embed_model: embed_model.into(),
            temperature,
        }
    }
}

/// Sentence-transformer models return one pooled vector; raw encoder models
/// return per-token rows, which are mean-pooled here.
fn pooled_vector(value: &Value) -> Result<Vec<f32>, BackendError> {
    let rows = value
        .as_array()
        .ok_or_else(|| BackendError::InvalidResponse {
            backend: BACKEND.to_string(),
            details: "expected an array response".to_string(),
        })?;

    if rows.iter().all(Value::is_number) {
        return vector_from_value(BACKEND, value);
    }

    let mut pooled: Vec<f32> = Vec::new();
    let mut count = 0usize;
    for row in rows {
        let vector = vector_from_value(BACKEND, row)?;
        if pooled.is_empty() {
            pooled = vector;
        } else if pooled.len() == vector.len() {
            for (sum, component) in pooled.iter_mut().zip(vector) {
                *sum += component;
            }
        } else {
            return Err(BackendError::InvalidResponse {
                backend: BACKEND.to_string(),
                details: "token rows have inconsistent widths".to_string(),
            });
        }
        count += 1;
    }

    if count == 0 {
        return Err(BackendError::InvalidResponse {
            backend: BACKEND.to_string(),
            details: "embedding response was empty".to_string(),
        });
    }
    for component in &mut pooled {
        *component /= count as f32;
    }
    Ok(pooled)
}

#[async_trait]
impl EmbeddingBackend for HuggingFaceBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        let response = self
            .client
            .post(format!(
                "{}/pipeline/feature-extraction/{}",
                self.base_url, self.embed_model
            ))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "inputs": text,
                "options": { "wait_for_model": true },
            }))
            .send()
            .await?;
        let response = require_success(BACKEND, response).await?;
        let parsed: Value = response.json().await?;

        pooled_vector(&parsed)
    }

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn model(&self) -> &str {
        &self.embed_model
    }
}

#[async_trait]
impl GenerationBackend for HuggingFaceBackend {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(format!("{}/models/{}", self.base_url, self.model))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "inputs": format!("{system}\n\n{prompt}"),
                "parameters": {
                    "temperature": self.temperature,
                    "max_new_tokens": 512,
                    "return_full_text": false,
                },
                "options": { "wait_for_model": true },
            }))
            .send()
            .await?;
        let response = require_success(BACKEND, response).await?;
        let parsed: Value = response.json().await?;

        parsed
            .pointer("/0/generated_text")
            .and_then(Value::as_str)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| BackendError::InvalidResponse {
                backend: BACKEND.to_string(),
                details: "missing generated_text".to_string(),
            })
    }

    fn name(&self) -> &'static str {
        BACKEND
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::pooled_vector;
    use serde_json::json;

    #[test]
    fn flat_response_is_used_directly() {
        let value = json!([0.25, 0.5, 0.75]);
        assert_eq!(pooled_vector(&value).unwrap(), vec![0.25, 0.5, 0.75]);
    }

    #[test]
    fn token_rows_are_mean_pooled() {
        let value = json!([[1.0, 3.0], [3.0, 5.0]]);
        assert_eq!(pooled_vector(&value).unwrap(), vec![2.0, 4.0]);
    }

    #[test]
    fn inconsistent_rows_are_rejected() {
        let value = json!([[1.0, 2.0], [1.0]]);
        assert!(pooled_vector(&value).is_err());
    }
}
