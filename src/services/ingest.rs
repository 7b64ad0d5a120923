//! Ingestion pipeline: read, embed and upsert every document of a source.

use std::path::Path;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use super::embedding::Embedder;
use super::vector_store::VectorStore;
use crate::error::SourceError;
use crate::sources::LocalSource;
use crate::utils::file::relative_path;

/// Step at which a document was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Read,
    Embedding,
    Storage,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::Read => write!(f, "read"),
            FailureStage::Embedding => write!(f, "embedding"),
            FailureStage::Storage => write!(f, "storage"),
        }
    }
}

/// Result of processing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DocumentOutcome {
    Stored {
        id: String,
        filename: String,
    },
    Failed {
        filename: String,
        stage: FailureStage,
        error: String,
    },
}

impl DocumentOutcome {
    pub fn filename(&self) -> &str {
        match self {
            DocumentOutcome::Stored { filename, .. } | DocumentOutcome::Failed { filename, .. } => {
                filename
            }
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, DocumentOutcome::Stored { .. })
    }
}

/// Totals of one ingestion run, with one outcome per document in source order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestSummary {
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub duration_ms: u64,
    pub outcomes: Vec<DocumentOutcome>,
}

impl IngestSummary {
    fn record(&mut self, outcome: DocumentOutcome) {
        self.processed += 1;
        if outcome.is_stored() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }
}

/// Embeds documents and upserts them into a vector store.
///
/// Each document is embedded before it is stored, and a failing document
/// never stops the rest of the batch.
pub struct Ingestor<'a> {
    embedder: &'a dyn Embedder,
    store: &'a dyn VectorStore,
    concurrency: usize,
}

impl<'a> Ingestor<'a> {
    pub fn new(embedder: &'a dyn Embedder, store: &'a dyn VectorStore) -> Self {
        Self {
            embedder,
            store,
            concurrency: 1,
        }
    }

    /// Number of documents in flight at once. Outcomes are still reported in
    /// source order.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Ingest every document of `source`, calling `on_outcome` as each one
    /// finishes. Only enumerating the source can fail the whole run.
    pub async fn ingest<F>(
        &self,
        source: &LocalSource,
        mut on_outcome: F,
    ) -> Result<IngestSummary, SourceError>
    where
        F: FnMut(&DocumentOutcome),
    {
        let start = Instant::now();
        let files = source.collect_files()?;
        info!(
            count = files.len(),
            root = %source.root().display(),
            "found files to embed"
        );

        let mut summary = IngestSummary::default();
        let mut outcomes = std::pin::pin!(
            stream::iter(files.iter())
                .map(|path| self.process(source, path))
                .buffered(self.concurrency)
        );

        while let Some(outcome) = outcomes.next().await {
            on_outcome(&outcome);
            summary.record(outcome);
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "all files processed"
        );
        Ok(summary)
    }

    async fn process(&self, source: &LocalSource, path: &Path) -> DocumentOutcome {
        let filename = relative_path(source.root(), path);
        info!(file = %filename, "processing");

        let failed = |stage: FailureStage, error: String| {
            warn!(file = %filename, %stage, %error, "document skipped");
            DocumentOutcome::Failed {
                filename: filename.clone(),
                stage,
                error,
            }
        };

        let document = match source.read_document(path) {
            Ok(document) => document,
            Err(e) => return failed(FailureStage::Read, e.to_string()),
        };

        let embedding = match self.embedder.embed(&document.content).await {
            Ok(embedding) => embedding,
            Err(e) => return failed(FailureStage::Embedding, e.to_string()),
        };

        let id = document.id.clone();
        if let Err(e) = self.store.upsert(vec![document.into_record(embedding)]).await {
            return failed(FailureStage::Storage, e.to_string());
        }

        info!(file = %filename, %id, "embedded and stored");
        DocumentOutcome::Stored { id, filename }
    }
}
