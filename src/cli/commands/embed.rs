//! Embed command implementation.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{EmbeddingClient, Ingestor, open_store};
use crate::sources::LocalSource;

#[derive(Debug, Args)]
pub struct EmbedArgs {
    /// Directory holding the documents to embed
    #[arg(long, short = 'd')]
    pub dir: Option<PathBuf>,

    /// Number of documents embedded at once
    #[arg(long, short = 'j')]
    pub concurrency: Option<usize>,
}

pub async fn handle_embed(
    args: EmbedArgs,
    config_path: Option<&Path>,
    format: Option<OutputFormat>,
    verbose: bool,
) -> Result<()> {
    let config = Config::load(config_path).context("failed to load configuration")?;
    let format = format.unwrap_or(config.search.default_format);
    let formatter = get_formatter(format, config.search.preview_chars);

    let concurrency = args.concurrency.unwrap_or(config.indexing.concurrency);
    if concurrency == 0 {
        anyhow::bail!("concurrency must be at least 1");
    }

    let dir = args
        .dir
        .unwrap_or_else(|| config.indexing.source_dir.clone());
    let source = LocalSource::from_config(dir, &config.indexing)
        .context("failed to prepare document source")?;

    if verbose {
        eprintln!("Source: {}", source.root().display());
        eprintln!("  Model: {}", config.embedding.model);
        eprintln!("  Collection: {}", config.vector_store.collection);
        eprintln!("  Concurrency: {concurrency}");
    }

    let embedder =
        EmbeddingClient::new(&config.embedding).context("failed to create embedding client")?;
    let store = open_store(&config.vector_store)
        .await
        .context("failed to open vector store")?;

    let pb = if format == OutputFormat::Json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} files {msg}")?,
    );

    let summary = Ingestor::new(&embedder, store.as_ref())
        .with_concurrency(concurrency)
        .ingest(&source, |outcome| {
            pb.inc(1);
            pb.set_message(outcome.filename().to_string());
            if let Some(line) = formatter.format_outcome(outcome) {
                pb.println(line);
            }
        })
        .await
        .context("embedding run failed")?;

    pb.finish_and_clear();

    print!("{}", formatter.format_ingest_summary(&summary));

    Ok(())
}
