//! # Command Line Interface
//!
//! `generate` provisions or rotates the CA, node and client certificates of a
//! cluster; `status` reports whether each stored secret is still usable.

pub mod args;
pub mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::observability::{init_logging, log_run_config, LoggingOptions};
use crate::orchestrator::Orchestrator;
use crate::secrets::{FileSecretStore, InMemorySecretStore, SecretStore};
use args::GeneratorArgs;

#[derive(Parser)]
#[command(name = "self-signer")]
#[command(about = "Provision and rotate cluster TLS certificates")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory of the file-backed secret store
    #[arg(long, global = true, env = "SELF_SIGNER_STORE_DIR", default_value = "./secrets")]
    pub store_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true, env = "SELF_SIGNER_LOG_JSON")]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate missing or expiring certificates
    Generate {
        #[command(flatten)]
        generator: GeneratorArgs,

        /// Run against an empty in-memory store and persist nothing
        #[arg(long)]
        dry_run: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the state of the stored certificates without changing anything
    Status {
        #[command(flatten)]
        generator: GeneratorArgs,

        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    initialise_logging(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Generate { generator, dry_run, json } => {
            let store: Arc<dyn SecretStore> = if dry_run {
                info!("Dry run: using an in-memory secret store");
                Arc::new(InMemorySecretStore::new())
            } else {
                Arc::new(FileSecretStore::new(&cli.store_dir))
            };
            handle_generate(&generator, store, json).await?
        }
        Commands::Status { generator, json } => {
            let store: Arc<dyn SecretStore> = Arc::new(FileSecretStore::new(&cli.store_dir));
            handle_status(&generator, store, json).await?
        }
    }

    Ok(())
}

async fn handle_generate(
    generator: &GeneratorArgs,
    store: Arc<dyn SecretStore>,
    json: bool,
) -> anyhow::Result<()> {
    let config = generator.to_config().context("Invalid generator configuration")?;
    log_run_config(&config, &generator.namespace);

    let orchestrator = Orchestrator::new(store, config)?;
    let cancel = cancel_on_interrupt();

    let report = orchestrator
        .run(&cancel, &generator.namespace)
        .await
        .context("Certificate generation failed")?;

    if json {
        output::print_json(&report)?;
    } else {
        output::print_run_report(&report);
    }
    Ok(())
}

async fn handle_status(
    generator: &GeneratorArgs,
    store: Arc<dyn SecretStore>,
    json: bool,
) -> anyhow::Result<()> {
    let config = generator.to_config().context("Invalid generator configuration")?;
    let orchestrator = Orchestrator::new(store, config)?;
    let cancel = cancel_on_interrupt();

    let statuses = orchestrator
        .status(&cancel, &generator.namespace)
        .await
        .context("Failed to read certificate status")?;

    if json {
        let rows: Vec<output::StatusRow> = statuses.iter().map(output::StatusRow::from).collect();
        output::print_json(&rows)?;
    } else {
        output::print_status_table(&statuses);
    }

    if statuses.iter().any(|s| !s.readiness.is_ready()) {
        std::process::exit(1);
    }
    Ok(())
}

/// Token canceled on Ctrl-C
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, canceling");
            token.cancel();
        }
    });
    cancel
}

fn load_dotenv() {
    // A missing .env file is fine; anything else is worth a warning.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }
}

fn initialise_logging(verbose: bool, json: bool) {
    // Subscriber may already be set elsewhere (e.g. integration tests); ignore.
    let _ = init_logging(LoggingOptions { verbose, json });
}
