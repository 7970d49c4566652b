use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{variable} not found in environment variables")]
    MissingCredential { variable: &'static str },

    #[error("unsupported provider identifier: {0}")]
    UnsupportedProvider(String),

    #[error("invalid endpoint url {url}: {details}")]
    InvalidEndpoint { url: String, details: String },
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{backend} request failed: {details}")]
    Api { backend: String, details: String },

    #[error("invalid response from {backend}: {details}")]
    InvalidResponse { backend: String, details: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("collection is corrupt: {0}")]
    Corrupt(String),

    #[error("embedding dimension {actual} does not match collection dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("PDF is encrypted and cannot be processed")]
    Encrypted,

    #[error("no text could be extracted from the PDF")]
    Empty,

    #[error("pdf parse error: {0}")]
    Extraction(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("embedding backend failed: {0}")]
    Backend(#[from] BackendError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ChatError {
    // Wraps embedding failures too, so the text names no specific backend
    // role.
    #[error("backend failed: {0}")]
    Backend(#[from] BackendError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
