//! Command-line interface for kitchen-sync
//!
//! # Usage Examples
//!
//! ```bash
//! # Sync the declarations under the current directory
//! KITCHEN_SYNC_DB=postgresql://localhost/app kitchen-sync sync
//!
//! # Sync from another directory, reapplying creation defaults
//! kitchen-sync sync --db postgresql://localhost/app --path seeds --reset
//!
//! # Start from empty tables
//! kitchen-sync sync --db postgresql://localhost/app --clean
//!
//! # Only create the ledger table
//! kitchen-sync init --db postgresql://localhost/app
//!
//! # Truncate every table in the public schema
//! kitchen-sync drop --db postgresql://localhost/app
//! ```
//!
//! Logging is controlled with `RUST_LOG`, e.g. `RUST_LOG=info` for one line
//! per created entity or `RUST_LOG=debug` for every statement.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kitchen_sync::DatabaseOpts;
use kitchen_sync_postgresql::PostgresTarget;
use tracing::info;

#[derive(Parser)]
#[command(name = "kitchen-sync")]
#[command(about = "Keep PostgreSQL seed data in sync with declaration files")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bring the database in line with the declarations
    Sync {
        /// Database connection options
        #[command(flatten)]
        db_opts: DatabaseOpts,

        /// Directory to load declaration files from
        #[arg(long, default_value = ".", env = "KITCHEN_SYNC_PATH")]
        path: PathBuf,

        /// Also write `_defaults` fields to rows that already exist
        #[arg(long)]
        reset: bool,

        /// Truncate every table before syncing
        #[arg(long)]
        clean: bool,
    },

    /// Create the ledger table if it does not exist
    Init {
        /// Database connection options
        #[command(flatten)]
        db_opts: DatabaseOpts,
    },

    /// Truncate every table in the public schema, the ledger included
    Drop {
        /// Database connection options
        #[command(flatten)]
        db_opts: DatabaseOpts,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            db_opts,
            path,
            reset,
            clean,
        } => {
            let target = PostgresTarget::connect(&db_opts.db).await?;
            kitchen_sync::init(&target).await?;

            if clean {
                kitchen_sync::drop_all(&target).await?;
            }

            let report = kitchen_sync::sync(&target, &path, reset).await?;
            info!(
                "Synced {}: {} created, {} recreated, {} updated, {} skipped",
                path.display(),
                report.created,
                report.recreated,
                report.updated,
                report.skipped
            );
        }
        Commands::Init { db_opts } => {
            let target = PostgresTarget::connect(&db_opts.db).await?;
            kitchen_sync::init(&target).await?;
        }
        Commands::Drop { db_opts } => {
            let target = PostgresTarget::connect(&db_opts.db).await?;
            let tables = kitchen_sync::drop_all(&target).await?;
            for table in tables {
                info!("Truncated {table}");
            }
        }
    }

    Ok(())
}
