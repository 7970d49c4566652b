use crate::error::StorageError;
use crate::models::{ClearOutcome, CollectionMeta, DocumentChunk, RetrievedChunk, StoredRecord};
use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const RECORDS_FILE: &str = "records.json";
const META_FILE: &str = "meta.json";
const CLEAR_ATTEMPTS: u32 = 3;
const CLEAR_BACKOFF: Duration = Duration::from_millis(200);

/// Deletion primitives used by [`VectorStore::clear`], kept behind a trait so
/// the retry and fallback paths can be driven with a failing filesystem.
#[async_trait]
trait RemoveFs: Send + Sync {
    async fn remove_dir_all(&self, path: &Path) -> std::io::Result<()>;
    async fn remove_file(&self, path: &Path) -> std::io::Result<()>;
    async fn remove_dir(&self, path: &Path) -> std::io::Result<()>;
}

struct TokioRemoveFs;

#[async_trait]
impl RemoveFs for TokioRemoveFs {
    async fn remove_dir_all(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::remove_dir_all(path).await
    }

    async fn remove_file(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::remove_file(path).await
    }

    async fn remove_dir(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::remove_dir(path).await
    }
}

/// Persisted cosine-similarity collection. Records live in memory behind a
/// read/write lock and are flushed to `records.json` + `meta.json` under the
/// store directory after every mutation; the on-disk copy is loaded lazily on
/// first access so a fresh handle sees whatever an earlier run persisted.
pub struct VectorStore {
    path: PathBuf,
    collection: RwLock<Option<Collection>>,
    remover: Box<dyn RemoveFs>,
}

#[derive(Debug, Default)]
struct Collection {
    meta: Option<CollectionMeta>,
    records: Vec<StoredRecord>,
}

/// Stable id for a chunk, so re-ingesting the same file overwrites rather
/// than duplicates.
fn record_id(chunk: &DocumentChunk) -> String {
    let mut hasher = Sha256::new();
    hasher.update(chunk.source_filename.as_bytes());
    hasher.update(chunk.chunk_index.to_le_bytes());
    hasher.update(chunk.text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            collection: RwLock::new(None),
            remover: Box::new(TokioRemoveFs),
        }
    }

    #[cfg(test)]
    fn with_remover(path: impl Into<PathBuf>, remover: Box<dyn RemoveFs>) -> Self {
        Self {
            path: path.into(),
            collection: RwLock::new(None),
            remover,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_from_disk(&self) -> Result<Collection, StorageError> {
        let records_path = self.path.join(RECORDS_FILE);
        let meta_path = self.path.join(META_FILE);

        if !records_path.exists() {
            return Ok(Collection::default());
        }

        let raw = tokio::fs::read(&records_path).await?;
        let records: Vec<StoredRecord> = serde_json::from_slice(&raw)?;

        let meta = if meta_path.exists() {
            let raw = tokio::fs::read(&meta_path).await?;
            Some(serde_json::from_slice(&raw)?)
        } else if records.is_empty() {
            None
        } else {
            return Err(StorageError::Corrupt(format!(
                "{} exists but {} is missing",
                RECORDS_FILE, META_FILE
            )));
        };

        debug!(records = records.len(), path = %self.path.display(), "loaded collection");
        Ok(Collection { meta, records })
    }

    /// Runs `operation` against the loaded collection, reading it from disk
    /// first if this handle has not touched it yet.
    async fn with_collection<T>(
        &self,
        operation: impl FnOnce(&Collection) -> T,
    ) -> Result<T, StorageError> {
        {
            let guard = self.collection.read().await;
            if let Some(collection) = guard.as_ref() {
                return Ok(operation(collection));
            }
        }
        let mut guard = self.collection.write().await;
        if guard.is_none() {
            *guard = Some(self.load_from_disk().await?);
        }
        match guard.as_ref() {
            Some(collection) => Ok(operation(collection)),
            None => Err(StorageError::Corrupt("collection handle was reset".into())),
        }
    }

    async fn persist(&self, collection: &Collection) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.path).await?;
        let records = serde_json::to_vec_pretty(&collection.records)?;
        tokio::fs::write(self.path.join(RECORDS_FILE), records).await?;
        if let Some(meta) = &collection.meta {
            let meta = serde_json::to_vec_pretty(meta)?;
            tokio::fs::write(self.path.join(META_FILE), meta).await?;
        }
        Ok(())
    }

    /// Inserts embedded chunks, overwriting records with the same id.
    /// The first insertion fixes the collection's embedding dimension; later
    /// insertions must match it.
    pub async fn add(
        &self,
        chunks: &[DocumentChunk],
        embeddings: Vec<Vec<f32>>,
        embedding_backend: &str,
        embedding_model: &str,
    ) -> Result<usize, StorageError> {
        debug_assert_eq!(chunks.len(), embeddings.len());

        let mut guard = self.collection.write().await;
        if guard.is_none() {
            *guard = Some(self.load_from_disk().await?);
        }
        let collection = guard
            .as_mut()
            .ok_or_else(|| StorageError::Corrupt("collection handle was reset".into()))?;

        if let Some(first) = embeddings.first() {
            match &collection.meta {
                Some(meta) if meta.dimensions != first.len() => {
                    return Err(StorageError::DimensionMismatch {
                        expected: meta.dimensions,
                        actual: first.len(),
                    });
                }
                Some(_) => {}
                None => {
                    collection.meta = Some(CollectionMeta {
                        embedding_backend: embedding_backend.to_string(),
                        embedding_model: embedding_model.to_string(),
                        dimensions: first.len(),
                        created_at: Utc::now(),
                    });
                }
            }
        }

        let mut inserted = 0;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            let expected = collection.meta.as_ref().map(|m| m.dimensions).unwrap_or(0);
            if embedding.len() != expected {
                return Err(StorageError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
            let record = StoredRecord {
                id: record_id(chunk),
                text: chunk.text.clone(),
                source_filename: chunk.source_filename.clone(),
                chunk_index: chunk.chunk_index,
                total_chunks: chunk.total_chunks,
                embedding,
            };
            match collection.records.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record,
                None => {
                    collection.records.push(record);
                    inserted += 1;
                }
            }
        }

        self.persist(collection).await?;
        info!(
            inserted,
            total = collection.records.len(),
            "stored embedded chunks"
        );
        Ok(inserted)
    }

    /// Nearest records by cosine similarity, best first.
    pub async fn search(
        &self,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, StorageError> {
        let expected = self.with_collection(|c| c.meta.as_ref().map(|m| m.dimensions)).await?;
        if let Some(expected) = expected {
            if expected != query.len() {
                return Err(StorageError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }

        self.with_collection(|collection| {
            let mut scored: Vec<RetrievedChunk> = collection
                .records
                .iter()
                .map(|record| RetrievedChunk {
                    text: record.text.clone(),
                    source_filename: record.source_filename.clone(),
                    chunk_index: record.chunk_index,
                    score: cosine_similarity(&record.embedding, query),
                })
                .collect();
            scored.sort_by(|a, b| b.score.total_cmp(&a.score));
            scored.truncate(top_k);
            scored
        })
        .await
    }

    /// Number of stored chunk records, reported as `total_documents` in
    /// results and status output.
    pub async fn record_count(&self) -> Result<usize, StorageError> {
        self.with_collection(|c| c.records.len()).await
    }

    pub async fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.record_count().await? == 0)
    }

    /// Deletes the collection from memory and disk. Directory removal is
    /// retried with a short backoff, then falls back to removing the storage
    /// files one by one; leftover files are reported, not fatal.
    pub async fn clear(&self) -> ClearOutcome {
        {
            let mut guard = self.collection.write().await;
            *guard = Some(Collection::default());
        }

        if !self.path.exists() {
            return ClearOutcome {
                cleared: true,
                forced: false,
                message: "Collection cleared".to_string(),
            };
        }

        for attempt in 1..=CLEAR_ATTEMPTS {
            match self.remover.remove_dir_all(&self.path).await {
                Ok(()) => {
                    info!(path = %self.path.display(), "collection cleared");
                    return ClearOutcome {
                        cleared: true,
                        forced: false,
                        message: "Collection cleared".to_string(),
                    };
                }
                Err(error) => {
                    warn!(attempt, %error, "failed to remove collection directory");
                    if attempt < CLEAR_ATTEMPTS {
                        tokio::time::sleep(CLEAR_BACKOFF).await;
                    }
                }
            }
        }

        // Directory removal kept failing; try to empty it file by file.
        let mut residue = false;
        match tokio::fs::read_dir(&self.path).await {
            Ok(mut entries) => loop {
                match entries.next_entry().await {
                    Ok(Some(entry)) => {
                        if let Err(error) = self.remover.remove_file(&entry.path()).await {
                            warn!(file = %entry.path().display(), %error, "could not remove storage file");
                            residue = true;
                        }
                    }
                    Ok(None) => break,
                    Err(error) => {
                        warn!(%error, "could not enumerate collection directory");
                        residue = true;
                        break;
                    }
                }
            },
            Err(error) => {
                warn!(%error, "could not open collection directory");
                residue = true;
            }
        }
        let _ = self.remover.remove_dir(&self.path).await;

        if residue || self.path.exists() && self.path.join(RECORDS_FILE).exists() {
            ClearOutcome {
                cleared: false,
                forced: true,
                message: "Collection partially cleared; some storage files could not be removed"
                    .to_string(),
            }
        } else {
            ClearOutcome {
                cleared: true,
                forced: true,
                message: "Collection cleared (removed files individually)".to_string(),
            }
        }
    }
}
