use crate::error::BackendError;
use async_trait::async_trait;

/// Converts text spans into fixed-dimensional vectors for similarity search.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError>;

    /// Default implementation embeds sequentially; backends with a native
    /// batch endpoint override this.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BackendError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Stable backend identifier, recorded in collection metadata.
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;
}

/// Produces natural-language output from a system message and a user prompt.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String, BackendError>;

    fn name(&self) -> &'static str;

    fn model(&self) -> &str;
}
