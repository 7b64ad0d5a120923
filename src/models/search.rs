//! Search-related models for queries and results.

use serde::{Deserialize, Serialize};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// Machine-parseable JSON format
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format: {s}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// One hit returned by the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// 1-based position in the store's ranking.
    pub rank: u32,

    pub id: String,

    pub document: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Distance or score as reported by the store; its meaning depends on
    /// the collection's metric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

/// Ranked results for one query, nearest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub duration_ms: u64,
}

impl SearchResults {
    pub fn new(query: String, results: Vec<SearchResult>, duration_ms: u64) -> Self {
        Self {
            query,
            results,
            duration_ms,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("markdown".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_search_results() {
        let results = SearchResults::new("test".to_string(), vec![], 50);
        assert!(results.is_empty());
        assert_eq!(results.len(), 0);
        assert_eq!(results.duration_ms, 50);
    }

    #[test]
    fn test_result_json_omits_missing_fields() {
        let result = SearchResult {
            rank: 1,
            id: "a".to_string(),
            document: "hello world".to_string(),
            filename: None,
            distance: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["id"], "a");
        assert!(json.get("distance").is_none());
        assert!(json.get("filename").is_none());
    }
}
