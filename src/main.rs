//! # cofid CLI
//!
//! ```bash
//! cofid [--config ./cofid.toml] [--progress human|json|off] <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cofid check` | Verify workbook, sheet, and required headers |
//! | `cofid load` | Write one document per food to the store |
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` for per-row detail.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cofid_loader::config;
use cofid_loader::loader;
use cofid_loader::models::LoadMode;
use cofid_loader::progress::ProgressMode;
use cofid_loader::store::{DocumentStore, FirestoreStore};

/// Import the CoFID nutrition dataset into Firestore.
#[derive(Parser)]
#[command(name = "cofid", version)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./cofid.toml` when present, otherwise built-in defaults
    /// for the CoFID 2021 workbook are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Progress output on stderr: `human`, `json`, or `off`.
    /// Defaults to `human` when stderr is a terminal.
    #[arg(long, global = true)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the workbook against the configured sheet and columns.
    ///
    /// Reads the sheet, reports every required header, and counts the
    /// documents a load would write. Never contacts the store.
    Check,

    /// Load the worksheet into the document store.
    Load {
        /// `upsert` (one document per normalized name, re-runnable) or
        /// `append` (store-assigned ids, duplicates on re-run).
        /// Overrides `[load].mode`.
        #[arg(long)]
        mode: Option<LoadMode>,

        /// Plan the load and print counts without opening the store.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Check => {
            cofid_loader::check::run_check(&cfg)?;
        }
        Commands::Load { mode, dry_run } => {
            let mode = mode.unwrap_or(cfg.load.mode);

            if dry_run {
                let report = loader::dry_run(&cfg, mode)?;
                loader::print_summary(&report, &cfg.store.collection);
                return Ok(());
            }

            let progress = cli
                .progress
                .unwrap_or_else(ProgressMode::default_for_tty)
                .reporter();
            let store = FirestoreStore::connect(&cfg.store)?;
            let result = loader::run_load(&cfg, &store, mode, progress.as_ref()).await;
            if let Err(e) = store.close().await {
                log::warn!("failed to close {}: {:#}", store.describe(), e);
            }

            loader::print_summary(&result?, &cfg.store.collection);
        }
    }

    Ok(())
}
