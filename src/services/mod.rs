mod embedding;
mod ingest;
mod query;
mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use embedding::{Embedder, EmbeddingClient};
pub use ingest::{DocumentOutcome, FailureStage, IngestSummary, Ingestor};
pub use query::search;
pub use vector_store::{ChromaBackend, QdrantBackend, VectorStore, open_store};
