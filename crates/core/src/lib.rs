//! Question answering over uploaded PDF documents.
//!
//! The crate is organized around two pipelines sharing one persisted vector
//! collection:
//!
//! - [`IngestionPipeline`] extracts text from PDF bytes, splits it into
//!   overlapping chunks, embeds them, and stores the records.
//! - [`ChatPipeline`] embeds a question, retrieves the nearest chunks by
//!   cosine similarity, and asks a generation backend for a cited answer.
//!
//! Embedding and generation backends are selected from the environment by
//! [`resolver::ProviderSettings`] and exposed through the
//! [`traits::EmbeddingBackend`] and [`traits::GenerationBackend`] traits.

pub mod chat;
pub mod chunker;
pub mod error;
pub mod extractor;
pub mod index;
pub mod ingest;
pub mod models;
pub mod providers;
pub mod resolver;
pub mod traits;

pub use chat::{ChatPipeline, DEFAULT_TOP_K};
pub use chunker::{Chunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use error::{BackendError, ChatError, ConfigError, IngestError, StorageError};
pub use extractor::{LopdfExtractor, PdfExtract};
pub use index::VectorStore;
pub use ingest::IngestionPipeline;
pub use models::{
    ChatResult, ClearOutcome, CollectionMeta, DocumentChunk, IngestResult, RetrievedChunk,
    SourceRef, StatusReport, StoredRecord,
};
pub use resolver::{
    describe_active_provider, resolve_embeddings, resolve_generator, ProviderId, ProviderInfo,
    ProviderSettings, DEFAULT_TEMPERATURE,
};
pub use traits::{EmbeddingBackend, GenerationBackend};
