use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tokio::signal;
use tracing_subscriber::EnvFilter;

use docembed::cli::commands::{handle_embed, handle_search, handle_status};
use docembed::cli::{Cli, Commands};
use docembed::error::{exit_code, exit_code_for};
use docembed::models::OutputFormat;

fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,docembed=info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Usage errors are not failures: print clap's message and exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(exit_code::SUCCESS);
        }
    };

    init_tracing(cli.verbose);

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        println!();
        return ExitCode::from(exit_code::SUCCESS);
    };

    tokio::select! {
        result = run_command(command, cli.config.as_deref(), cli.format, cli.verbose) => {
            match result {
                Ok(()) => ExitCode::from(exit_code::SUCCESS),
                Err(e) => {
                    eprintln!("Error: {e:#}");
                    ExitCode::from(exit_code_for(&e))
                }
            }
        }
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, cleaning up...");
            ExitCode::from(exit_code::OTHER)
        }
    }
}

async fn run_command(
    command: Commands,
    config_path: Option<&Path>,
    format: Option<OutputFormat>,
    verbose: bool,
) -> Result<()> {
    match command {
        Commands::Embed(args) => handle_embed(args, config_path, format, verbose).await,
        Commands::Search(args) => handle_search(args, config_path, format, verbose).await,
        Commands::Status => handle_status(config_path, format, verbose).await,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
