//! Kitchen Sync Library
//!
//! Declarative seed data for PostgreSQL. Entities are declared in TOML, YAML
//! or JSON files under a directory tree, keyed by table and a stable name,
//! and every sync pass brings the database in line with them.
//!
//! # Features
//!
//! - Idempotent sync: the `_kitchensync` ledger maps each declared entity to
//!   the row id it was created with, so re-running never duplicates rows
//! - References: `${table.name}` resolves to another entity's row id,
//!   creating that entity first when needed
//! - File literals: `$file(path)` substitutes a file's contents
//! - Drift repair: tracked rows that were deleted are created again
//! - Creation defaults: `_defaults` fields are only written on creation,
//!   unless the pass runs with reset
//!
//! # CLI Usage
//!
//! ```bash
//! # Create the ledger table and sync the declarations under ./seeds
//! kitchen-sync sync --db postgresql://localhost/app --path seeds
//!
//! # Reapply creation defaults to existing rows
//! kitchen-sync sync --db postgresql://localhost/app --path seeds --reset
//!
//! # Empty every table, ledger included
//! kitchen-sync drop --db postgresql://localhost/app
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use kitchen_sync_sink::RowSink;
use ledger::LedgerStore;
use tracing::info;

pub mod error;
pub mod materialize;
pub mod reconcile;
pub mod resolve;
pub mod testing;

pub use error::SyncError;
pub use materialize::Materializer;
pub use reconcile::{Reconciler, SyncReport};

/// A database that entity rows and ledger entries can be written to.
pub trait Target: RowSink + LedgerStore {}

impl<T: RowSink + LedgerStore + ?Sized> Target for T {}

#[derive(Parser, Clone)]
pub struct DatabaseOpts {
    /// PostgreSQL connection string
    #[arg(long, env = "KITCHEN_SYNC_DB")]
    pub db: String,
}

/// Create the ledger table if it does not exist yet.
pub async fn init<T: Target + ?Sized>(target: &T) -> Result<()> {
    target
        .init_ledger()
        .await
        .context("Failed to initialize ledger")?;
    info!("Ledger initialized");
    Ok(())
}

/// Empty every table of the target, the ledger included.
pub async fn drop_all<T: Target + ?Sized>(target: &T) -> Result<Vec<String>> {
    let tables = target
        .truncate_all()
        .await
        .context("Failed to drop data")?;
    info!("Truncated {} tables", tables.len());
    Ok(tables)
}

/// Load the declarations under `path` and run one sync pass.
///
/// Declarations are fully loaded and validated before any statement is
/// issued.
pub async fn sync<T: Target + ?Sized>(target: &T, path: &Path, reset: bool) -> Result<SyncReport> {
    let declarations = sync_core::load_declarations(path)
        .with_context(|| format!("Failed to load declarations from {}", path.display()))?;

    Reconciler::new(target, &declarations).run(reset).await
}
