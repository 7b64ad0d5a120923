//! Local file system document source.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::SourceError;
use crate::models::{Document, DocumentMetadata, IndexingConfig};
use crate::utils::file::{calculate_checksum, has_extension, read_file_content, relative_path};

/// Text files below a root directory, filtered by extension.
#[derive(Debug, Clone)]
pub struct LocalSource {
    /// Root path to scan
    root: PathBuf,

    /// Extension files must carry, without the dot
    extension: String,

    /// Glob patterns (matched against the path relative to `root`) to skip
    exclude_patterns: Vec<glob::Pattern>,

    /// Maximum file size
    max_file_size: u64,
}

impl LocalSource {
    /// Create a new local source. Invalid exclude patterns are rejected.
    pub fn new(
        root: PathBuf,
        extension: &str,
        exclude_patterns: &[String],
        max_file_size: u64,
    ) -> Result<Self, SourceError> {
        let exclude_patterns = exclude_patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p)
                    .map_err(|e| SourceError::WalkError(format!("invalid pattern {p}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            root,
            extension: extension.trim_start_matches('.').to_string(),
            exclude_patterns,
            max_file_size,
        })
    }

    pub fn from_config(root: PathBuf, config: &IndexingConfig) -> Result<Self, SourceError> {
        Self::new(
            root,
            &config.extension,
            &config.exclude_patterns,
            config.max_file_size,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All matching files, in lexicographic path order.
    pub fn collect_files(&self) -> Result<Vec<PathBuf>, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::NotFound(self.root.display().to_string()));
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| SourceError::WalkError(e.to_string()))?;
            let path = entry.path();

            if !entry.file_type().is_file() || !has_extension(path, &self.extension) {
                continue;
            }

            let relative = relative_path(&self.root, path);
            if self.exclude_patterns.iter().any(|p| p.matches(&relative)) {
                continue;
            }

            files.push(path.to_path_buf());
        }

        Ok(files)
    }

    /// Read a file and create a Document.
    pub fn read_document(&self, path: &Path) -> Result<Document, SourceError> {
        let content =
            read_file_content(path, self.max_file_size).map_err(|e| SourceError::ReadError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let metadata = DocumentMetadata {
            filename: relative_path(&self.root, path),
            checksum: calculate_checksum(&content),
            size_bytes: content.len() as u64,
        };

        Ok(Document::new(document_id(path), content, metadata))
    }
}

/// File name without its extension.
pub fn document_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
