use crate::chunker::Chunker;
use crate::error::IngestError;
use crate::extractor::{LopdfExtractor, PdfExtract};
use crate::index::VectorStore;
use crate::models::IngestResult;
use crate::traits::EmbeddingBackend;
use std::sync::Arc;
use tracing::{error, info};

/// Upload path: PDF bytes to extracted text, to overlapping chunks, to
/// embedded records in the collection.
pub struct IngestionPipeline {
    extractor: Box<dyn PdfExtract>,
    chunker: Chunker,
    embeddings: Arc<dyn EmbeddingBackend>,
    store: Arc<VectorStore>,
}

impl IngestionPipeline {
    pub fn new(embeddings: Arc<dyn EmbeddingBackend>, store: Arc<VectorStore>) -> Self {
        Self {
            extractor: Box::new(LopdfExtractor),
            chunker: Chunker::default(),
            embeddings,
            store,
        }
    }

    pub fn with_chunker(mut self, chunker: Chunker) -> Self {
        self.chunker = chunker;
        self
    }

    pub fn with_extractor(mut self, extractor: Box<dyn PdfExtract>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Processes one uploaded document. Failures never propagate as errors:
    /// the caller always gets an `IngestResult`, with the failure reason in
    /// its message and the collection untouched.
    pub async fn ingest(&self, source_filename: &str, pdf_bytes: &[u8]) -> IngestResult {
        match self.run(source_filename, pdf_bytes).await {
            Ok(result) => result,
            Err(err) => {
                error!(file = source_filename, error = %err, "ingestion failed");
                let total_documents = self.store.record_count().await.unwrap_or(0);
                IngestResult::failure(err.to_string(), total_documents)
            }
        }
    }

    async fn run(
        &self,
        source_filename: &str,
        pdf_bytes: &[u8],
    ) -> Result<IngestResult, IngestError> {
        let text = self.extractor.extract(pdf_bytes)?;
        let chunks = self.chunker.chunk(&text, source_filename);
        if chunks.is_empty() {
            return Err(IngestError::Empty);
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = self.embeddings.embed_batch(&texts).await?;

        self.store
            .add(
                &chunks,
                embeddings,
                self.embeddings.name(),
                self.embeddings.model(),
            )
            .await?;
        let total_documents = self.store.record_count().await?;

        info!(
            file = source_filename,
            chunks = chunks.len(),
            total_documents,
            "document ingested"
        );
        Ok(IngestResult {
            success: true,
            message: format!("Successfully processed {source_filename}"),
            chunks_created: chunks.len(),
            total_documents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::LocalHashEmbeddings;

    struct FixedText(&'static str);

    impl PdfExtract for FixedText {
        fn extract(&self, _pdf_bytes: &[u8]) -> Result<String, IngestError> {
            Ok(self.0.to_string())
        }
    }

    struct AlwaysEncrypted;

    impl PdfExtract for AlwaysEncrypted {
        fn extract(&self, _pdf_bytes: &[u8]) -> Result<String, IngestError> {
            Err(IngestError::Encrypted)
        }
    }

    fn pipeline(store: Arc<VectorStore>, extractor: Box<dyn PdfExtract>) -> IngestionPipeline {
        IngestionPipeline::new(Arc::new(LocalHashEmbeddings::default()), store)
            .with_extractor(extractor)
    }

    #[tokio::test]
    async fn successful_ingest_reports_chunks_and_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(VectorStore::new(dir.path().join("collection")));
        let pipeline = pipeline(
            store.clone(),
            Box::new(FixedText("\n--- Page 1 ---\nA short report about vector search.")),
        );

        let result = pipeline.ingest("report.pdf", b"%PDF-fake").await;

        assert!(result.success);
        assert_eq!(result.message, "Successfully processed report.pdf");
        assert_eq!(result.chunks_created, 1);
        assert_eq!(result.total_documents, 1);
        assert_eq!(store.record_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn total_documents_accumulates_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(VectorStore::new(dir.path().join("collection")));
        let pipeline = pipeline(store.clone(), Box::new(FixedText("some page text")));

        pipeline.ingest("first.pdf", b"%PDF-fake").await;
        let result = pipeline.ingest("second.pdf", b"%PDF-fake").await;

        assert!(result.success);
        assert_eq!(result.total_documents, 2);
    }

    #[tokio::test]
    async fn extraction_failure_becomes_an_unsuccessful_result() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(VectorStore::new(dir.path().join("collection")));
        let pipeline = pipeline(store.clone(), Box::new(AlwaysEncrypted));

        let result = pipeline.ingest("locked.pdf", b"%PDF-fake").await;

        assert!(!result.success);
        assert_eq!(result.message, "PDF is encrypted and cannot be processed");
        assert_eq!(result.chunks_created, 0);
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn three_page_document_stores_four_chunks() {
        fn filler(len: usize) -> String {
            "lorem ipsum dolor sit amet consectetur adipiscing elit sed do "
                .chars()
                .cycle()
                .take(len)
                .collect()
        }
        // Same 600/600/600/694 paragraph layout the chunker tests use: a
        // 2500-character extraction that splits into four chunks.
        let page_1 = format!("--- Page 1 ---\n{}", filler(600 - 15));
        let page_2 = format!("--- Page 2 ---\n{}", filler(600 - 15));
        let middle = filler(600);
        let page_3 = format!("--- Page 3 ---\n{}", filler(694 - 15));
        let text = [page_1, page_2, middle, page_3].join("\n\n");
        assert_eq!(text.len(), 2500);
        let leaked: &'static str = Box::leak(text.into_boxed_str());

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(VectorStore::new(dir.path().join("collection")));
        let pipeline = pipeline(store.clone(), Box::new(FixedText(leaked)));

        let result = pipeline.ingest("three-pages.pdf", b"%PDF-fake").await;

        assert!(result.success);
        assert_eq!(result.chunks_created, 4);
        assert_eq!(result.total_documents, 4);
        assert_eq!(store.record_count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn long_documents_produce_overlapping_chunks() {
        let text: String = "lorem ipsum dolor sit amet "
            .chars()
            .cycle()
            .take(2500)
            .collect();
        let leaked: &'static str = Box::leak(text.into_boxed_str());

        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(VectorStore::new(dir.path().join("collection")));
        let pipeline = pipeline(store.clone(), Box::new(FixedText(leaked)));

        let result = pipeline.ingest("long.pdf", b"%PDF-fake").await;

        assert!(result.success);
        assert!(result.chunks_created > 1);
        assert_eq!(store.record_count().await.unwrap(), result.chunks_created);
    }
}
