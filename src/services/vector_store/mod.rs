//! Vector store abstraction layer.
//!
//! A single collection holding `(id, embedding, document, metadata)` records,
//! behind a trait so the pipelines do not care whether Chroma or Qdrant sits
//! underneath.

mod chroma;
mod qdrant;

pub use chroma::ChromaBackend;
pub use qdrant::QdrantBackend;

use async_trait::async_trait;
use tracing::info;

use crate::error::VectorStoreError;
use crate::models::{SearchResult, StoredRecord, VectorDriver, VectorStoreConfig};

/// Operations the pipelines need from a vector store collection.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Check if the vector store is reachable.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Number of records in the collection.
    async fn count(&self) -> Result<u64, VectorStoreError>;

    /// Insert records, overwriting any existing record with the same id.
    async fn upsert(&self, records: Vec<StoredRecord>) -> Result<(), VectorStoreError>;

    /// The `n_results` nearest records to `embedding`, nearest first, ranked
    /// by the collection's own metric.
    async fn query(
        &self,
        embedding: Vec<f32>,
        n_results: u64,
    ) -> Result<Vec<SearchResult>, VectorStoreError>;

    /// Get the collection name.
    fn collection(&self) -> &str;
}

/// Connect to the configured backend and get or create its collection.
pub async fn open_store(
    config: &VectorStoreConfig,
) -> Result<Box<dyn VectorStore>, VectorStoreError> {
    let store: Box<dyn VectorStore> = match config.driver {
        VectorDriver::Chroma => Box::new(ChromaBackend::connect(config).await?),
        VectorDriver::Qdrant => Box::new(QdrantBackend::new(config)?),
    };
    info!(
        driver = %config.driver,
        url = %config.url,
        collection = store.collection(),
        "vector store ready"
    );
    Ok(store)
}

/// Number ranks 1..=n in the order the store returned them.
pub(crate) fn assign_ranks(results: &mut [SearchResult]) {
    for (i, result) in results.iter_mut().enumerate() {
        result.rank = i as u32 + 1;
    }
}
