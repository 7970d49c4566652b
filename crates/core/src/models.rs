use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One bounded span of a source document's text, tagged with its position
/// within the document it was split from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    pub text: String,
    pub source_filename: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// A chunk as persisted in the vector collection, with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub text: String,
    pub source_filename: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub embedding: Vec<f32>,
}

/// Collection-level metadata written once when the collection is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionMeta {
    pub embedding_backend: String,
    pub embedding_model: String,
    pub dimensions: usize,
    pub created_at: DateTime<Utc>,
}

/// A chunk returned by similarity search, nearest-first.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub source_filename: String,
    pub chunk_index: usize,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResult {
    pub success: bool,
    pub message: String,
    pub chunks_created: usize,
    pub total_documents: usize,
}

impl IngestResult {
    pub fn failure(message: impl Into<String>, total_documents: usize) -> Self {
        Self {
            success: false,
            message: message.into(),
            chunks_created: 0,
            total_documents,
        }
    }
}

/// Citation entry attached to a chat answer.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub source_filename: String,
    pub chunk_index: usize,
    pub preview: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResult {
    pub success: bool,
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub num_sources: usize,
}

impl ChatResult {
    pub fn failure(answer: impl Into<String>) -> Self {
        Self {
            success: false,
            answer: answer.into(),
            sources: Vec::new(),
            num_sources: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub initialized: bool,
    pub total_documents: usize,
    pub message: String,
}

/// Result of a `clear` operation. `forced` is set when the directory could
/// only be emptied file by file; `cleared = false` means some storage files
/// survived every attempt, which is reported but not treated as an error.
#[derive(Debug, Clone, Serialize)]
pub struct ClearOutcome {
    pub cleared: bool,
    pub forced: bool,
    pub message: String,
}
