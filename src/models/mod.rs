mod config;
mod document;
mod search;

pub use config::{
    Config, DEFAULT_CHROMA_URL, DEFAULT_COLLECTION, DEFAULT_EXTENSION, DEFAULT_PREVIEW_CHARS,
    DEFAULT_SEARCH_LIMIT, DEFAULT_SOURCE_DIR, EmbeddingConfig, IndexingConfig, SearchConfig,
    VectorDriver, VectorStoreConfig, env,
};
pub use document::{Document, DocumentMetadata, StoredRecord};
pub use search::{OutputFormat, SearchResult, SearchResults};
