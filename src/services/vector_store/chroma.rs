//! Chroma vector store backend over the REST (v2) API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{VectorStore, assign_ranks};
use crate::error::VectorStoreError;
use crate::models::{DocumentMetadata, SearchResult, StoredRecord, VectorStoreConfig};

#[derive(Debug, Serialize)]
struct CreateCollectionRequest<'a> {
    name: &'a str,
    get_or_create: bool,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct UpsertRequest {
    ids: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    metadatas: Vec<DocumentMetadata>,
    documents: Vec<String>,
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query_embeddings: Vec<Vec<f32>>,
    n_results: u64,
    include: [&'static str; 3],
}

/// One inner sequence per query embedding; we always send exactly one.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<serde_json::Value>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
}

/// Chroma vector store backend.
pub struct ChromaBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    tenant: String,
    database: String,
    collection: String,
    collection_id: String,
}

impl ChromaBackend {
    /// Connect and get or create the configured collection.
    pub async fn connect(config: &VectorStoreConfig) -> Result<Self, VectorStoreError> {
        let client = Client::builder()
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        let mut backend = Self {
            client,
            base_url: config.url.trim().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            tenant: config.tenant.clone(),
            database: config.database.clone(),
            collection: config.collection.clone(),
            collection_id: String::new(),
        };
        backend.collection_id = backend.get_or_create_collection().await?;
        debug!(collection_id = %backend.collection_id, "chroma collection resolved");
        Ok(backend)
    }

    fn collections_url(&self) -> String {
        format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            self.base_url, self.tenant, self.database
        )
    }

    fn collection_url(&self, action: &str) -> String {
        format!("{}/{}/{}", self.collections_url(), self.collection_id, action)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.api_key {
            Some(ref key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn get_or_create_collection(&self) -> Result<String, VectorStoreError> {
        let body = CreateCollectionRequest {
            name: &self.collection,
            get_or_create: true,
        };
        let response = self
            .authorize(self.client.post(self.collections_url()).json(&body))
            .send()
            .await
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;
        let response = check_status(response, VectorStoreError::CollectionError).await?;
        let collection: CollectionResponse = parse_json(response).await?;
        Ok(collection.id)
    }
}

async fn check_status(
    response: Response,
    to_error: fn(String) -> VectorStoreError,
) -> Result<Response, VectorStoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(to_error(format!("status {status}: {body}")))
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, VectorStoreError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))
}

fn metadata_filename(metadata: Option<serde_json::Value>) -> Option<String> {
    metadata?
        .get("filename")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

impl QueryResponse {
    fn into_results(self) -> Result<Vec<SearchResult>, VectorStoreError> {
        let Some(ids) = self.ids.into_iter().next() else {
            return Ok(Vec::new());
        };

        let mut documents = first_row(self.documents, ids.len(), "documents")?;
        let mut metadatas = first_row(self.metadatas, ids.len(), "metadatas")?;
        let mut distances = first_row(self.distances, ids.len(), "distances")?;

        let mut results: Vec<SearchResult> = ids
            .into_iter()
            .enumerate()
            .map(|(i, id)| SearchResult {
                rank: 0,
                id,
                document: documents[i].take().unwrap_or_default(),
                filename: metadata_filename(metadatas[i].take()),
                distance: distances[i].take(),
            })
            .collect();
        assign_ranks(&mut results);
        Ok(results)
    }
}

/// First inner row of an optional `[[...]]` field, padded with `None` when
/// the field was not included, rejected when its length disagrees with `ids`.
fn first_row<T>(
    field: Option<Vec<Vec<Option<T>>>>,
    len: usize,
    name: &str,
) -> Result<Vec<Option<T>>, VectorStoreError> {
    let Some(row) = field.and_then(|rows| rows.into_iter().next()) else {
        return Ok(std::iter::repeat_with(|| None).take(len).collect());
    };
    if row.len() != len {
        return Err(VectorStoreError::InvalidResponse(format!(
            "{name} has {} entries for {len} ids",
            row.len()
        )));
    }
    Ok(row)
}

#[async_trait]
impl VectorStore for ChromaBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        let url = format!("{}/api/v2/heartbeat", self.base_url);
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;
        Ok(response.status().is_success())
    }

    async fn count(&self) -> Result<u64, VectorStoreError> {
        let response = self
            .authorize(self.client.get(self.collection_url("count")))
            .send()
            .await
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;
        let response = check_status(response, VectorStoreError::CollectionError).await?;
        parse_json(response).await
    }

    async fn upsert(&self, records: Vec<StoredRecord>) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut body = UpsertRequest {
            ids: Vec::with_capacity(records.len()),
            embeddings: Vec::with_capacity(records.len()),
            metadatas: Vec::with_capacity(records.len()),
            documents: Vec::with_capacity(records.len()),
        };
        for record in records {
            body.ids.push(record.id);
            body.embeddings.push(record.embedding);
            body.metadatas.push(record.metadata);
            body.documents.push(record.document);
        }

        let response = self
            .authorize(self.client.post(self.collection_url("upsert")).json(&body))
            .send()
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;
        check_status(response, VectorStoreError::UpsertError).await?;
        Ok(())
    }

    async fn query(
        &self,
        embedding: Vec<f32>,
        n_results: u64,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        let body = QueryRequest {
            query_embeddings: vec![embedding],
            n_results,
            include: ["documents", "metadatas", "distances"],
        };
        let response = self
            .authorize(self.client.post(self.collection_url("query")).json(&body))
            .send()
            .await
            .map_err(|e| VectorStoreError::QueryError(e.to_string()))?;
        let response = check_status(response, VectorStoreError::QueryError).await?;
        let parsed: QueryResponse = parse_json(response).await?;
        parsed.into_results()
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const COLLECTIONS: &str = "/api/v2/tenants/default_tenant/databases/default_database/collections";

    async fn mount_collection(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path(COLLECTIONS))
            .and(body_json(json!({ "name": "documents", "get_or_create": true })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "c0ffee",
                "name": "documents"
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    fn config_for(server: &MockServer) -> VectorStoreConfig {
        VectorStoreConfig {
            url: format!("{}/", server.uri()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_connect_gets_or_creates_collection() {
        let server = MockServer::start().await;
        mount_collection(&server).await;

        let backend = ChromaBackend::connect(&config_for(&server)).await.unwrap();
        assert_eq!(backend.collection(), "documents");
        assert_eq!(backend.collection_id, "c0ffee");
    }

    #[tokio::test]
    async fn test_upsert_sends_parallel_arrays() {
        let server = MockServer::start().await;
        mount_collection(&server).await;
        Mock::given(method("POST"))
            .and(path(format!("{COLLECTIONS}/c0ffee/upsert")))
            .and(body_json(json!({
                "ids": ["a"],
                "embeddings": [[1.0, 0.0]],
                "metadatas": [{ "filename": "a.txt", "checksum": "abc", "size_bytes": 11 }],
                "documents": ["hello world"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(true)))
            .expect(1)
            .mount(&server)
            .await;

        let backend = ChromaBackend::connect(&config_for(&server)).await.unwrap();
        backend
            .upsert(vec![StoredRecord {
                id: "a".to_string(),
                embedding: vec![1.0, 0.0],
                document: "hello world".to_string(),
                metadata: DocumentMetadata {
                    filename: "a.txt".to_string(),
                    checksum: "abc".to_string(),
                    size_bytes: 11,
                },
            }])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upsert_failure_is_upsert_error() {
        let server = MockServer::start().await;
        mount_collection(&server).await;
        Mock::given(method("POST"))
            .and(path(format!("{COLLECTIONS}/c0ffee/upsert")))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let backend = ChromaBackend::connect(&config_for(&server)).await.unwrap();
        let err = backend
            .upsert(vec![StoredRecord {
                id: "a".to_string(),
                embedding: vec![1.0],
                document: String::new(),
                metadata: DocumentMetadata::default(),
            }])
            .await
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::UpsertError(_)));
    }

    #[tokio::test]
    async fn test_query_keeps_store_order() {
        let server = MockServer::start().await;
        mount_collection(&server).await;
        Mock::given(method("POST"))
            .and(path(format!("{COLLECTIONS}/c0ffee/query")))
            .and(body_json(json!({
                "query_embeddings": [[0.9, 0.1]],
                "n_results": 5,
                "include": ["documents", "metadatas", "distances"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ids": [["a", "b"]],
                "documents": [["hello world", "goodbye world"]],
                "metadatas": [[{ "filename": "a.txt" }, null]],
                "distances": [[0.02, 1.62]]
            })))
            .mount(&server)
            .await;

        let backend = ChromaBackend::connect(&config_for(&server)).await.unwrap();
        let results = backend.query(vec![0.9, 0.1], 5).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "a");
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[0].document, "hello world");
        assert_eq!(results[0].filename.as_deref(), Some("a.txt"));
        assert_eq!(results[1].id, "b");
        assert_eq!(results[1].rank, 2);
        assert_eq!(results[1].filename, None);
        assert_eq!(results[1].distance, Some(1.62));
    }

    #[tokio::test]
    async fn test_query_on_empty_collection() {
        let server = MockServer::start().await;
        mount_collection(&server).await;
        Mock::given(method("POST"))
            .and(path(format!("{COLLECTIONS}/c0ffee/query")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ids": [[]],
                "documents": [[]],
                "metadatas": [[]],
                "distances": [[]]
            })))
            .mount(&server)
            .await;

        let backend = ChromaBackend::connect(&config_for(&server)).await.unwrap();
        assert!(backend.query(vec![1.0], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_mismatched_lengths_is_invalid() {
        let server = MockServer::start().await;
        mount_collection(&server).await;
        Mock::given(method("POST"))
            .and(path(format!("{COLLECTIONS}/c0ffee/query")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ids": [["a", "b"]],
                "documents": [["only one"]]
            })))
            .mount(&server)
            .await;

        let backend = ChromaBackend::connect(&config_for(&server)).await.unwrap();
        let err = backend.query(vec![1.0], 5).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_count_and_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(COLLECTIONS))
            .and(header("authorization", "Bearer k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "c0ffee" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{COLLECTIONS}/c0ffee/count")))
            .and(header("authorization", "Bearer k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!(2)))
            .mount(&server)
            .await;

        let config = VectorStoreConfig {
            api_key: Some("k".to_string()),
            ..config_for(&server)
        };
        let backend = ChromaBackend::connect(&config).await.unwrap();
        assert_eq!(backend.count().await.unwrap(), 2);
    }
}
