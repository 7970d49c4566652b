use crate::error::ChatError;
use crate::index::VectorStore;
use crate::models::{ChatResult, RetrievedChunk, SourceRef};
use crate::traits::{EmbeddingBackend, GenerationBackend};
use std::sync::Arc;
use tracing::{debug, error, info};

pub const DEFAULT_TOP_K: usize = 5;

const SYSTEM_PROMPT: &str = "You are a helpful AI assistant that answers questions based on \
     provided PDF documents. Always cite your sources and be accurate.";

const NO_DOCUMENTS: &str =
    "No documents have been uploaded yet. Please upload a PDF document first.";
const NO_MATCHES: &str = "I couldn't find any relevant information to answer your question.";

const PREVIEW_CHARS: usize = 200;

/// Question path: embed the question, retrieve the nearest chunks, and ask
/// the generation backend for a cited answer.
pub struct ChatPipeline {
    embeddings: Arc<dyn EmbeddingBackend>,
    generator: Arc<dyn GenerationBackend>,
    store: Arc<VectorStore>,
}

fn build_prompt(question: &str, retrieved: &[RetrievedChunk]) -> String {
    let context = retrieved
        .iter()
        .map(|chunk| {
            format!(
                "[Source: {}, Chunk {}]\n{}",
                chunk.source_filename, chunk.chunk_index, chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Based on the following documents, please answer this question: {question}\n\
         \n\
         Documents:\n\
         {context}\n\
         \n\
         Please provide a clear, helpful answer using only the information from these \
         documents. If you can't find the answer in the documents, say \"I don't have \
         enough information to answer that question based on the provided documents.\"\n\
         \n\
         Include specific references to the source documents when relevant."
    )
}

fn preview(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() > PREVIEW_CHARS {
        let mut cut: String = chars[..PREVIEW_CHARS].iter().collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}

impl ChatPipeline {
    pub fn new(
        embeddings: Arc<dyn EmbeddingBackend>,
        generator: Arc<dyn GenerationBackend>,
        store: Arc<VectorStore>,
    ) -> Self {
        Self {
            embeddings,
            generator,
            store,
        }
    }

    /// Answers one question against the collection. Like ingestion, this
    /// never returns an error: retrieval and generation failures are folded
    /// into an unsuccessful `ChatResult`.
    pub async fn answer(&self, question: &str, top_k: usize) -> ChatResult {
        match self.run(question, top_k).await {
            Ok(result) => result,
            Err(err) => {
                error!(error = %err, "chat pipeline failed");
                ChatResult::failure(format!("Error processing your question: {err}"))
            }
        }
    }

    async fn run(&self, question: &str, top_k: usize) -> Result<ChatResult, ChatError> {
        if self.store.is_empty().await.map_err(ChatError::Storage)? {
            return Ok(ChatResult::failure(NO_DOCUMENTS));
        }

        let query = self.embeddings.embed(question).await?;
        let retrieved = self
            .store
            .search(&query, top_k)
            .await
            .map_err(ChatError::Storage)?;
        if retrieved.is_empty() {
            return Ok(ChatResult::failure(NO_MATCHES));
        }
        debug!(retrieved = retrieved.len(), "retrieved context chunks");

        let prompt = build_prompt(question, &retrieved);
        let answer = match self.generator.generate(SYSTEM_PROMPT, &prompt).await {
            Ok(answer) => answer,
            Err(err) => {
                error!(backend = self.generator.name(), error = %err, "generation failed");
                return Ok(ChatResult::failure(format!("Error generating answer: {err}")));
            }
        };

        let sources: Vec<SourceRef> = retrieved
            .iter()
            .map(|chunk| SourceRef {
                source_filename: chunk.source_filename.clone(),
                chunk_index: chunk.chunk_index,
                preview: preview(&chunk.text),
            })
            .collect();
        let num_sources = sources.len();
        info!(num_sources, "answer generated");

        Ok(ChatResult {
            success: true,
            answer,
            sources,
            num_sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::models::DocumentChunk;
    use crate::providers::LocalHashEmbeddings;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedGenerator {
        reply: &'static str,
        last_prompt: Mutex<Option<String>>,
    }

    impl CannedGenerator {
        fn new(reply: &'static str) -> Self {
            Self {
                reply,
                last_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl GenerationBackend for CannedGenerator {
        async fn generate(&self, _system: &str, prompt: &str) -> Result<String, BackendError> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            Ok(self.reply.to_string())
        }

        fn name(&self) -> &'static str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned-1"
        }
    }

    struct FailingEmbeddings;

    #[async_trait]
    impl EmbeddingBackend for FailingEmbeddings {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, BackendError> {
            Err(BackendError::Api {
                backend: "canned".to_string(),
                details: "401 Unauthorized".to_string(),
            })
        }

        fn name(&self) -> &'static str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned-embed"
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl GenerationBackend for FailingGenerator {
        async fn generate(&self, _system: &str, _prompt: &str) -> Result<String, BackendError> {
            Err(BackendError::Api {
                backend: "canned".to_string(),
                details: "503 Service Unavailable".to_string(),
            })
        }

        fn name(&self) -> &'static str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned-1"
        }
    }

    async fn seeded_store(dir: &std::path::Path, texts: &[&str]) -> Arc<VectorStore> {
        let store = Arc::new(VectorStore::new(dir.join("collection")));
        let embeddings = LocalHashEmbeddings::default();

        let chunks: Vec<DocumentChunk> = texts
            .iter()
            .enumerate()
            .map(|(index, text)| DocumentChunk {
                text: text.to_string(),
                source_filename: "manual.pdf".to_string(),
                chunk_index: index,
                total_chunks: texts.len(),
            })
            .collect();
        let mut vectors = Vec::new();
        for text in texts {
            vectors.push(embeddings.embed(text).await.unwrap());
        }
        store
            .add(&chunks, vectors, embeddings.name(), embeddings.model())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn empty_collection_asks_for_an_upload() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(VectorStore::new(dir.path().join("collection")));
        let pipeline = ChatPipeline::new(
            Arc::new(LocalHashEmbeddings::default()),
            Arc::new(CannedGenerator::new("unused")),
            store,
        );

        let result = pipeline.answer("what is this about?", DEFAULT_TOP_K).await;

        assert!(!result.success);
        assert_eq!(
            result.answer,
            "No documents have been uploaded yet. Please upload a PDF document first."
        );
        assert!(result.sources.is_empty());
        assert_eq!(result.num_sources, 0);
    }

    #[tokio::test]
    async fn answer_carries_cited_sources() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(
            dir.path(),
            &["the warranty lasts two years", "returns need a receipt"],
        )
        .await;

        let generator = Arc::new(CannedGenerator::new("The warranty lasts two years."));
        let pipeline = ChatPipeline::new(
            Arc::new(LocalHashEmbeddings::default()),
            generator.clone(),
            store,
        );

        let result = pipeline.answer("how long is the warranty?", 2).await;

        assert!(result.success);
        assert_eq!(result.answer, "The warranty lasts two years.");
        assert_eq!(result.num_sources, 2);
        assert_eq!(result.sources.len(), 2);
        assert!(result
            .sources
            .iter()
            .all(|source| source.source_filename == "manual.pdf"));

        let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("[Source: manual.pdf, Chunk"));
        assert!(prompt.contains("how long is the warranty?"));
    }

    #[tokio::test]
    async fn top_k_bounds_the_source_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path(), &["alpha", "beta", "gamma"]).await;
        let pipeline = ChatPipeline::new(
            Arc::new(LocalHashEmbeddings::default()),
            Arc::new(CannedGenerator::new("ok")),
            store,
        );

        let result = pipeline.answer("alpha?", 1).await;

        assert!(result.success);
        assert_eq!(result.num_sources, 1);
    }

    #[tokio::test]
    async fn empty_retrieval_reports_no_relevant_information() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path(), &["some indexed text"]).await;
        let pipeline = ChatPipeline::new(
            Arc::new(LocalHashEmbeddings::default()),
            Arc::new(CannedGenerator::new("unused")),
            store,
        );

        let result = pipeline.answer("anything", 0).await;

        assert!(!result.success);
        assert_eq!(
            result.answer,
            "I couldn't find any relevant information to answer your question."
        );
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn generation_failure_is_an_unsuccessful_result() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path(), &["some indexed text"]).await;
        let pipeline = ChatPipeline::new(
            Arc::new(LocalHashEmbeddings::default()),
            Arc::new(FailingGenerator),
            store,
        );

        let result = pipeline.answer("anything", DEFAULT_TOP_K).await;

        assert!(!result.success);
        assert!(result.answer.starts_with("Error generating answer: "));
        assert!(result.answer.contains("503"));
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn embedding_failure_is_not_reported_as_a_generation_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path(), &["some indexed text"]).await;
        let pipeline = ChatPipeline::new(
            Arc::new(FailingEmbeddings),
            Arc::new(CannedGenerator::new("unused")),
            store,
        );

        let result = pipeline.answer("anything", DEFAULT_TOP_K).await;

        assert!(!result.success);
        assert!(result.answer.starts_with("Error processing your question: "));
        assert!(result.answer.contains("401"));
        assert!(!result.answer.contains("generation"));
    }

    #[test]
    fn long_chunks_are_previewed_with_an_ellipsis() {
        let long = "x".repeat(450);
        let short = "short text";

        let long_preview = preview(&long);
        assert_eq!(long_preview.chars().count(), 203);
        assert!(long_preview.ends_with("..."));
        assert_eq!(preview(short), short);
    }
}
