//! Error types for docembed.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server returned status {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            // Overload and gateway errors are usually transient
            EmbeddingError::ServerError { status, .. } => {
                matches!(status, 429 | 502 | 503 | 504)
            }
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            EmbeddingError::InvalidResponse(_) => false,
        }
    }
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector store: {0}")]
    ConnectionError(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error("invalid vector store response: {0}")]
    InvalidResponse(String),
}

/// Errors related to the document source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source directory not found: {0}")]
    NotFound(String),

    #[error("directory walk error: {0}")]
    WalkError(String),

    #[error("failed to read {path}: {reason}")]
    ReadError { path: String, reason: String },
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors related to search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("missing query")]
    EmptyQuery,

    #[error("embedding unavailable: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

/// Process exit codes, one per failure kind.
pub mod exit_code {
    pub const SUCCESS: u8 = 0;
    pub const OTHER: u8 = 1;
    pub const NO_INPUT: u8 = 66;
    pub const UNAVAILABLE: u8 = 69;
    pub const IO_ERROR: u8 = 74;
    pub const CONFIG: u8 = 78;
}

/// Map an error chain onto the exit code of the first classified cause.
pub fn exit_code_for(error: &anyhow::Error) -> u8 {
    for cause in error.chain() {
        if cause.is::<ConfigError>() {
            return exit_code::CONFIG;
        }
        if cause.is::<EmbeddingError>() {
            return exit_code::UNAVAILABLE;
        }
        if cause.is::<VectorStoreError>() {
            return exit_code::IO_ERROR;
        }
        if cause.is::<SourceError>() {
            return exit_code::NO_INPUT;
        }
        if let Some(search) = cause.downcast_ref::<SearchError>() {
            return match search {
                SearchError::EmptyQuery => exit_code::SUCCESS,
                SearchError::Embedding(_) => exit_code::UNAVAILABLE,
                SearchError::VectorStore(_) => exit_code::IO_ERROR,
            };
        }
    }
    exit_code::OTHER
}
