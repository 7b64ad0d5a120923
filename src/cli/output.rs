use std::fmt::Write as FmtWrite;

use console::style;
use serde::Serialize;

use crate::models::{OutputFormat, SearchResults};
use crate::services::{DocumentOutcome, FailureStage, IngestSummary};
use crate::utils::text::preview;

pub trait Formatter {
    fn format_search_results(&self, results: &SearchResults) -> String;
    /// Line reported as each document finishes, if the format reports them.
    fn format_outcome(&self, outcome: &DocumentOutcome) -> Option<String>;
    fn format_ingest_summary(&self, summary: &IngestSummary) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub embedding_url: String,
    pub embedding_model: String,
    pub vector_store_driver: String,
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    pub collection: String,
    pub records: Option<u64>,
}

pub struct TextFormatter {
    pub preview_chars: usize,
}

impl Formatter for TextFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        if results.is_empty() {
            return format!("No results found for: {}\n", results.query);
        }

        let mut output = String::new();
        writeln!(output, "Search results:").unwrap();
        for result in &results.results {
            writeln!(
                output,
                "- {}: {}",
                style(&result.id).bold(),
                preview(&result.document, self.preview_chars)
            )
            .unwrap();
        }
        output
    }

    fn format_outcome(&self, outcome: &DocumentOutcome) -> Option<String> {
        Some(match outcome {
            DocumentOutcome::Stored { filename, .. } => {
                format!("{} Embedded and stored {}", style("✓").green(), filename)
            }
            DocumentOutcome::Failed {
                filename,
                stage,
                error,
            } => format!(
                "{} Failed to {} {} ({})",
                style("✗").red(),
                match stage {
                    FailureStage::Read => "read",
                    FailureStage::Embedding => "embed",
                    FailureStage::Storage => "store",
                },
                filename,
                error
            ),
        })
    }

    fn format_ingest_summary(&self, summary: &IngestSummary) -> String {
        let mut output = String::new();
        writeln!(output, "All files processed.").unwrap();
        writeln!(output, "Processed: {}", summary.processed).unwrap();
        writeln!(output, "Succeeded: {}", summary.succeeded).unwrap();
        writeln!(output, "Failed:    {}", summary.failed).unwrap();
        writeln!(output, "Duration:  {}ms", summary.duration_ms).unwrap();
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();
        writeln!(output, "Embedding:     {}", status.embedding_url).unwrap();
        writeln!(output, "  Model:       {}", status.embedding_model).unwrap();
        writeln!(output).unwrap();

        let vector_status = if status.vector_store_connected {
            style("[CONNECTED]").green()
        } else {
            style("[DISCONNECTED]").red()
        };
        writeln!(
            output,
            "Vector Store:  {} ({})",
            status.vector_store_driver, vector_status
        )
        .unwrap();
        writeln!(output, "  URL:         {}", status.vector_store_url).unwrap();
        writeln!(output, "  Collection:  {}", status.collection).unwrap();
        if let Some(records) = status.records {
            writeln!(output, "  Records:     {}", records).unwrap();
        }
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> String {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        let mut json =
            json.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string());
        json.push('\n');
        json
    }
}

impl Formatter for JsonFormatter {
    fn format_search_results(&self, results: &SearchResults) -> String {
        self.to_json(results)
    }

    fn format_outcome(&self, _outcome: &DocumentOutcome) -> Option<String> {
        None
    }

    fn format_ingest_summary(&self, summary: &IngestSummary) -> String {
        self.to_json(summary)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        self.to_json(status)
    }

    fn format_message(&self, message: &str) -> String {
        self.to_json(&serde_json::json!({ "message": message }))
    }
}

pub fn get_formatter(format: OutputFormat, preview_chars: usize) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter { preview_chars }),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
