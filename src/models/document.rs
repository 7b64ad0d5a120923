use serde::{Deserialize, Serialize};

/// A text file discovered by the document source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// File name without its extension; unique within a corpus.
    pub id: String,
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// Metadata stored next to every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Path relative to the source directory.
    pub filename: String,
    pub checksum: String,
    pub size_bytes: u64,
}

/// What the vector store persists for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(id: impl Into<String>, content: String, metadata: DocumentMetadata) -> Self {
        Self {
            id: id.into(),
            content,
            metadata,
        }
    }

    /// Pair the document with its embedding, consuming it.
    pub fn into_record(self, embedding: Vec<f32>) -> StoredRecord {
        StoredRecord {
            id: self.id,
            embedding,
            document: self.content,
            metadata: self.metadata,
        }
    }
}

impl StoredRecord {
    /// Qdrant point id for this record: a UUID v5 of the document id, stable
    /// across runs so re-ingesting overwrites the same point.
    pub fn point_id(&self) -> String {
        Self::point_id_for(&self.id)
    }

    pub fn point_id_for(document_id: &str) -> String {
        use uuid::Uuid;
        Uuid::new_v5(&Uuid::NAMESPACE_OID, document_id.as_bytes()).to_string()
    }
}
