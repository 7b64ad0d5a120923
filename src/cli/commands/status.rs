use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat, VectorDriver};
use crate::services::open_store;

pub async fn handle_status(
    config_path: Option<&Path>,
    format: Option<OutputFormat>,
    _verbose: bool,
) -> Result<()> {
    let config = Config::load(config_path).context("failed to load configuration")?;
    let formatter = get_formatter(
        format.unwrap_or(config.search.default_format),
        config.search.preview_chars,
    );

    let (vector_store_connected, records) = match open_store(&config.vector_store).await {
        Ok(store) => {
            let connected = store.health_check().await.unwrap_or(false);
            let records = if connected {
                store.count().await.ok()
            } else {
                None
            };
            (connected, records)
        }
        Err(_) => (false, None),
    };

    let status = StatusInfo {
        embedding_url: config.embedding.url.clone(),
        embedding_model: config.embedding.model.clone(),
        vector_store_driver: config.vector_store.driver.to_string(),
        vector_store_url: config.vector_store.url.clone(),
        vector_store_connected,
        collection: config.vector_store.collection.clone(),
        records,
    };

    print!("{}", formatter.format_status(&status));

    if !vector_store_connected {
        eprintln!();
        match config.vector_store.driver {
            VectorDriver::Chroma => {
                eprintln!(
                    "Warning: Chroma not reachable. Start with: docker run -p 8000:8000 chromadb/chroma"
                );
            }
            VectorDriver::Qdrant => {
                eprintln!("Warning: Qdrant not running. Start with: docker-compose up -d qdrant");
            }
        }
    }

    Ok(())
}
