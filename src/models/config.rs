use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::search::OutputFormat;
use crate::error::ConfigError;

pub const DEFAULT_CHROMA_URL: &str = "http://localhost:8000";
pub const DEFAULT_COLLECTION: &str = "documents";
pub const DEFAULT_SOURCE_DIR: &str = "./data";
pub const DEFAULT_EXTENSION: &str = "txt";
pub const DEFAULT_SEARCH_LIMIT: u32 = 5;
pub const DEFAULT_PREVIEW_CHARS: usize = 100;

/// Environment variables that override the file configuration.
pub mod env {
    pub const CONFIG_PATH: &str = "DOCEMBED_CONFIG";
    pub const EMBEDDING_URL: &str = "OLLAMA_URL";
    pub const AUTH_TOKEN: &str = "AUTH_TOKEN";
    pub const MODEL: &str = "MODEL";
    pub const CHROMA_URL: &str = "CHROMA_URL";
    pub const VECTOR_STORE_URL: &str = "VECTOR_STORE_URL";
    pub const VECTOR_DRIVER: &str = "VECTOR_DRIVER";
    pub const VECTOR_STORE_API_KEY: &str = "VECTOR_STORE_API_KEY";
    pub const COLLECTION: &str = "COLLECTION";
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("docembed").join("config.toml"))
    }

    /// Load the file configuration, apply environment overrides and validate.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Override values with whatever `lookup` returns for the known variables.
    /// Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(env::EMBEDDING_URL) {
            self.embedding.url = url;
        }
        if let Some(model) = get(env::MODEL) {
            self.embedding.model = model;
        }
        if let Some(token) = get(env::AUTH_TOKEN) {
            self.embedding.auth_token = Some(token);
        }
        if let Some(url) = get(env::VECTOR_STORE_URL).or_else(|| get(env::CHROMA_URL)) {
            self.vector_store.url = url;
        }
        if let Some(key) = get(env::VECTOR_STORE_API_KEY) {
            self.vector_store.api_key = Some(key);
        }
        if let Some(collection) = get(env::COLLECTION) {
            self.vector_store.collection = collection;
        }
        if let Some(driver) = get(env::VECTOR_DRIVER) {
            self.vector_store.driver = driver.parse().map_err(ConfigError::Invalid)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.url.trim().is_empty() {
            return Err(ConfigError::Missing(env::EMBEDDING_URL));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::Missing(env::MODEL));
        }
        if self.vector_store.url.trim().is_empty() {
            return Err(ConfigError::Missing(env::VECTOR_STORE_URL));
        }
        if self.search.limit == 0 {
            return Err(ConfigError::Invalid(
                "search.limit must be at least 1".to_string(),
            ));
        }
        if self.indexing.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "indexing.concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Full URL of the embed endpoint, e.g. `http://localhost:11434/api/embed`.
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Request timeout. The transport default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    3
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            model: String::new(),
            auth_token: None,
            timeout_secs: None,
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorDriver {
    #[default]
    Chroma,
    Qdrant,
}

impl std::fmt::Display for VectorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorDriver::Chroma => write!(f, "chroma"),
            VectorDriver::Qdrant => write!(f, "qdrant"),
        }
    }
}

impl std::str::FromStr for VectorDriver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chroma" | "chromadb" => Ok(VectorDriver::Chroma),
            "qdrant" => Ok(VectorDriver::Qdrant),
            other => Err(format!("unknown vector driver: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub driver: VectorDriver,

    #[serde(default = "default_chroma_url")]
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_tenant")]
    pub tenant: String,

    #[serde(default = "default_database")]
    pub database: String,
}

fn default_chroma_url() -> String {
    DEFAULT_CHROMA_URL.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_tenant() -> String {
    "default_tenant".to_string()
}

fn default_database() -> String {
    "default_database".to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            driver: VectorDriver::default(),
            url: default_chroma_url(),
            collection: default_collection(),
            api_key: None,
            tenant: default_tenant(),
            database: default_database(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Documents in flight at once. `1` keeps ingestion strictly sequential.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SOURCE_DIR)
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_concurrency() -> usize {
    1
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            extension: default_extension(),
            exclude_patterns: Vec::new(),
            max_file_size: default_max_file_size(),
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub limit: u32,

    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_limit() -> u32 {
    DEFAULT_SEARCH_LIMIT
}

fn default_preview_chars() -> usize {
    DEFAULT_PREVIEW_CHARS
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            preview_chars: default_preview_chars(),
            default_format: OutputFormat::Text,
        }
    }
}
