pub mod gemini;
pub mod groq;
pub mod huggingface;
pub mod local;
pub mod ollama;
pub mod openai;

pub use gemini::GeminiBackend;
pub use groq::GroqGenerator;
pub use huggingface::HuggingFaceBackend;
pub use local::{LocalHashEmbeddings, DEFAULT_LOCAL_DIMENSIONS};
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

use crate::error::BackendError;
use serde_json::Value;
use std::time::Duration;

/// Hosted calls carry an explicit timeout so a stalled backend surfaces as a
/// transport error instead of hanging the request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn http_client() -> reqwest::Client {
    // A builder failure means the TLS backend could not initialize; there is
    // no usable client to fall back to.
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("http client with request timeout")
}

pub(crate) async fn require_success(
    backend: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(BackendError::Api {
            backend: backend.to_string(),
            details: response.status().to_string(),
        })
    }
}

/// Reads a JSON array of numbers as an f32 vector.
pub(crate) fn vector_from_value(backend: &str, value: &Value) -> Result<Vec<f32>, BackendError> {
    value
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_f64().map(|number| number as f32))
                .collect::<Option<Vec<f32>>>()
        })
        .ok_or_else(|| BackendError::InvalidResponse {
            backend: backend.to_string(),
            details: "expected an array of numbers".to_string(),
        })
}

pub(crate) fn text_at_pointer(
    backend: &str,
    value: &Value,
    pointer: &str,
) -> Result<String, BackendError> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(|text| text.to_string())
        .ok_or_else(|| BackendError::InvalidResponse {
            backend: backend.to_string(),
            details: format!("missing text at {pointer}"),
        })
}
