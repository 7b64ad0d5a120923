//! Embedding client for an Ollama-compatible `/api/embed` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;
use crate::utils::retry::{RetryPolicy, with_retry};

/// Turns text into an embedding vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Request body for the embed endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response from the embed endpoint. Only `embeddings` is consumed.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Client for interacting with the embedding server.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    url: String,
    model: String,
    auth_token: Option<String>,
    retry: RetryPolicy,
}

impl EmbeddingClient {
    /// Create a new embedding client with the given configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.trim().to_string(),
            model: config.model.clone(),
            auth_token: config.auth_token.clone().filter(|t| !t.is_empty()),
            retry: RetryPolicy::new(config.max_retries),
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let body = EmbedRequest {
            model: &self.model,
            input: text,
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(ref token) = self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                EmbeddingError::Timeout
            } else if e.is_connect() {
                EmbeddingError::ConnectionError(e.to_string())
            } else {
                EmbeddingError::RequestError(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let parsed: EmbedResponse = serde_json::from_slice(&bytes)
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        parsed
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embeddings array".to_string()))
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let result = with_retry(&self.retry, || self.request(text)).await;
        match &result {
            Ok(vector) => debug!(dimension = vector.len(), "embedding received"),
            Err(e) => warn!(error = %e, "Error getting embedding"),
        }
        result
    }
}
