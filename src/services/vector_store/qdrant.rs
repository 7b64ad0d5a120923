//! Qdrant vector store backend implementation.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::info;

use super::{VectorStore, assign_ranks};
use crate::error::VectorStoreError;
use crate::models::{SearchResult, StoredRecord, VectorStoreConfig};

/// Qdrant vector store backend.
///
/// Qdrant point ids must be integers or UUIDs, so each record is stored under
/// [`StoredRecord::point_id`] with the document id kept in the payload.
pub struct QdrantBackend {
    client: Qdrant,
    collection: String,
    ready: OnceCell<()>,
}

impl QdrantBackend {
    pub fn new(config: &VectorStoreConfig) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(config.url.trim());

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            ready: OnceCell::new(),
        })
    }

    async fn collection_exists(&self) -> Result<bool, VectorStoreError> {
        self.client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))
    }

    /// The vector size is only known once the first embedding arrives, so
    /// the collection is created on first upsert.
    async fn ensure_collection(&self, dimension: u64) -> Result<(), VectorStoreError> {
        self.ready
            .get_or_try_init(|| async {
                if self.collection_exists().await? {
                    return Ok(());
                }

                let create = CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dimension, Distance::Cosine));
                self.client
                    .create_collection(create)
                    .await
                    .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;
                info!(collection = %self.collection, dimension, "created qdrant collection");
                Ok::<_, VectorStoreError>(())
            })
            .await
            .map(|_| ())
    }
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
    payload.get(key).and_then(|v| match &v.kind {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    })
}

fn to_point(record: StoredRecord) -> PointStruct {
    let point_id = record.point_id();

    let mut payload: HashMap<String, Value> = HashMap::new();
    payload.insert("document_id".to_string(), record.id.into());
    payload.insert("document".to_string(), record.document.into());
    payload.insert("filename".to_string(), record.metadata.filename.into());
    payload.insert("checksum".to_string(), record.metadata.checksum.into());
    payload.insert(
        "size_bytes".to_string(),
        (record.metadata.size_bytes as i64).into(),
    );

    PointStruct::new(point_id, record.embedding, payload)
}

#[async_trait]
impl VectorStore for QdrantBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn count(&self) -> Result<u64, VectorStoreError> {
        if !self.collection_exists().await? {
            return Ok(0);
        }
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;
        Ok(response.result.map_or(0, |r| r.count))
    }

    async fn upsert(&self, records: Vec<StoredRecord>) -> Result<(), VectorStoreError> {
        let Some(first) = records.first() else {
            return Ok(());
        };
        self.ensure_collection(first.embedding.len() as u64).await?;

        let points: Vec<PointStruct> = records.into_iter().map(to_point).collect();
        let upsert = UpsertPointsBuilder::new(&self.collection, points).wait(true);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn query(
        &self,
        embedding: Vec<f32>,
        n_results: u64,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        if !self.collection_exists().await? {
            return Ok(Vec::new());
        }

        let search =
            SearchPointsBuilder::new(&self.collection, embedding, n_results).with_payload(true);

        let response = self
            .client
            .search_points(search)
            .await
            .map_err(|e| VectorStoreError::QueryError(e.to_string()))?;

        let mut results: Vec<SearchResult> = response
            .result
            .into_iter()
            .map(|point| SearchResult {
                rank: 0,
                id: payload_string(&point.payload, "document_id").unwrap_or_default(),
                document: payload_string(&point.payload, "document").unwrap_or_default(),
                filename: payload_string(&point.payload, "filename"),
                distance: Some(point.score),
            })
            .collect();
        assign_ranks(&mut results);
        Ok(results)
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}
