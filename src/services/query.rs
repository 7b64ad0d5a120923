//! Query pipeline: embed the query text and fetch the nearest documents.

use std::time::Instant;

use tracing::{debug, info};

use super::embedding::Embedder;
use super::vector_store::VectorStore;
use crate::error::SearchError;
use crate::models::SearchResults;

/// Embed `query` and return up to `limit` nearest documents in the store's
/// rank order.
///
/// `query` must contain non-whitespace text; callers are expected to check
/// this first, and an empty query is rejected here before any network call.
/// No partial result exists: if the query cannot be embedded, the whole
/// search fails.
pub async fn search(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    query: &str,
    limit: u32,
) -> Result<SearchResults, SearchError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    let start = Instant::now();
    let embedding = embedder.embed(query).await?;
    debug!(
        dimension = embedding.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "query embedded"
    );

    let results = store.query(embedding, u64::from(limit)).await?;
    let duration_ms = start.elapsed().as_millis() as u64;
    info!(hits = results.len(), duration_ms, "search complete");

    Ok(SearchResults::new(query.to_string(), results, duration_ms))
}
