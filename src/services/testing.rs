//! In-memory test doubles for the embedding service and the vector store.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::embedding::Embedder;
use super::vector_store::{VectorStore, assign_ranks};
use crate::error::{EmbeddingError, VectorStoreError};
use crate::models::{SearchResult, StoredRecord};

/// Returns a fixed vector per known text and fails for anything else.
#[derive(Default)]
pub struct StubEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
}

impl StubEmbedder {
    pub fn new(pairs: &[(&str, Vec<f32>)]) -> Self {
        Self {
            vectors: pairs
                .iter()
                .map(|(text, v)| (text.to_string(), v.clone()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| EmbeddingError::ServerError {
                status: 500,
                body: format!("no stub vector for {text:?}"),
            })
    }
}

/// Upsert-by-id store ranking by cosine distance, nearest first.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, StoredRecord>>,
    reject_ids: HashSet<String>,
    upserts: AtomicUsize,
    queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the upsert of any record with one of these ids.
    pub fn rejecting(ids: &[&str]) -> Self {
        Self {
            reject_ids: ids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.records.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<StoredRecord> {
        self.records.lock().unwrap().get(id).cloned()
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(true)
    }

    async fn count(&self) -> Result<u64, VectorStoreError> {
        Ok(self.records.lock().unwrap().len() as u64)
    }

    async fn upsert(&self, records: Vec<StoredRecord>) -> Result<(), VectorStoreError> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if let Some(bad) = records.iter().find(|r| self.reject_ids.contains(&r.id)) {
            return Err(VectorStoreError::UpsertError(format!("rejected {}", bad.id)));
        }
        let mut map = self.records.lock().unwrap();
        for record in records {
            map.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn query(
        &self,
        embedding: Vec<f32>,
        n_results: u64,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let map = self.records.lock().unwrap();
        let mut scored: Vec<(f32, &StoredRecord)> = map
            .values()
            .map(|r| (cosine_distance(&embedding, &r.embedding), r))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut results: Vec<SearchResult> = scored
            .into_iter()
            .take(n_results as usize)
            .map(|(distance, r)| SearchResult {
                rank: 0,
                id: r.id.clone(),
                document: r.document.clone(),
                filename: Some(r.metadata.filename.clone()),
                distance: Some(distance),
            })
            .collect();
        assign_ranks(&mut results);
        Ok(results)
    }

    fn collection(&self) -> &str {
        "memory"
    }
}
