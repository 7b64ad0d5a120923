//! CLI module for docembed.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::{OutputFormat, env};

/// Embed local text documents into a vector store and search them by meaning.
#[derive(Debug, Parser)]
#[command(name = "docembed")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'c',
        global = true,
        env = env::CONFIG_PATH,
        help = "Path to a TOML configuration file"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, short = 'f', global = true, help = "Output format: text or json")]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Embed every document in the source directory and store it
    Embed(commands::EmbedArgs),

    /// Search stored documents by similarity to a query
    Search(commands::SearchArgs),

    /// Check embedding and vector store configuration and connectivity
    Status,
}
