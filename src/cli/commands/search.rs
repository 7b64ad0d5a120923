use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{EmbeddingClient, open_store, search};

pub const USAGE: &str = "Usage: docembed search <QUERY>... [--limit <N>]";

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(num_args = 0.., help = "Search query text")]
    pub query: Vec<String>,

    #[arg(long, short = 'n', help = "Maximum number of results to return")]
    pub limit: Option<u32>,
}

impl SearchArgs {
    /// Query words joined with single spaces.
    pub fn query_text(&self) -> String {
        self.query.join(" ").trim().to_string()
    }
}

pub async fn handle_search(
    args: SearchArgs,
    config_path: Option<&Path>,
    format: Option<OutputFormat>,
    verbose: bool,
) -> Result<()> {
    let query = args.query_text();
    if query.is_empty() {
        println!("Please provide a search query.");
        println!("{USAGE}");
        return Ok(());
    }

    let config = Config::load(config_path).context("failed to load configuration")?;
    let formatter = get_formatter(
        format.unwrap_or(config.search.default_format),
        config.search.preview_chars,
    );

    let limit = args.limit.unwrap_or(config.search.limit);
    if limit == 0 {
        anyhow::bail!("limit must be at least 1");
    }

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Limit: {limit}");
        eprintln!("  Collection: {}", config.vector_store.collection);
    }

    let embedder =
        EmbeddingClient::new(&config.embedding).context("failed to create embedding client")?;
    let store = open_store(&config.vector_store)
        .await
        .context("failed to open vector store")?;

    let results = search(&embedder, store.as_ref(), &query, limit)
        .await
        .context("search failed")?;

    if verbose {
        eprintln!("Search took {}ms", results.duration_ms);
        eprintln!();
    }

    print!("{}", formatter.format_search_results(&results));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_query_needs_no_configuration() {
        let args = SearchArgs {
            query: vec!["  ".to_string()],
            limit: None,
        };
        let missing = Path::new("/nonexistent/docembed/config.toml");

        handle_search(args, Some(missing), None, false).await.unwrap();
    }

    #[test]
    fn test_query_text_trims() {
        let args = SearchArgs {
            query: vec!["".to_string(), "hello".to_string(), " ".to_string()],
            limit: None,
        };
        assert_eq!(args.query_text(), "hello");
    }
}
