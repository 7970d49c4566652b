use crate::error::BackendError;
use crate::traits::EmbeddingBackend;
use async_trait::async_trait;

/// Matches the output width of the small sentence-transformer models this
/// embedder stands in for.
pub const DEFAULT_LOCAL_DIMENSIONS: usize = 384;

/// Free, in-process embedding backend: character trigrams hashed into a
/// fixed-width bucket vector, L2-normalized. Deterministic and offline, which
/// also makes it the embedding fallback for generation-only providers.
#[derive(Debug, Clone, Copy)]
pub struct LocalHashEmbeddings {
    dimensions: usize,
}

impl Default for LocalHashEmbeddings {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_LOCAL_DIMENSIONS,
        }
    }
}

impl LocalHashEmbeddings {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

#[async_trait]
impl EmbeddingBackend for LocalHashEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        Ok(self.embed_sync(text))
    }

    fn name(&self) -> &'static str {
        "local-hash"
    }

    fn model(&self) -> &str {
        "character-ngram-hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embedder_is_deterministic() {
        let embedder = LocalHashEmbeddings::default();
        let first = embedder.embed("hydraulic pressure and flow").await.unwrap();
        let second = embedder.embed("hydraulic pressure and flow").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn embedder_outputs_expected_length() {
        let embedder = LocalHashEmbeddings::new(32);
        let vector = embedder.embed("abc").await.unwrap();
        assert_eq!(vector.len(), 32);
    }

    #[tokio::test]
    async fn nonempty_text_embeds_to_a_unit_vector() {
        let embedder = LocalHashEmbeddings::default();
        let vector = embedder.embed("some document text").await.unwrap();
        let magnitude = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn empty_text_embeds_to_zeros() {
        let embedder = LocalHashEmbeddings::new(16);
        let vector = embedder.embed("").await.unwrap();
        assert!(vector.iter().all(|v| *v == 0.0));
    }
}
