//! RowSink trait definition.
//!
//! This trait abstracts over the target database, allowing the engine to be
//! compiled against a single interface that works with PostgreSQL and with
//! the in-memory test target.

use anyhow::Result;
use sync_core::ResolvedRow;

/// Trait for writing declared entities to a target database.
///
/// Table and column names reaching this trait have already been validated
/// as plain SQL identifiers; implementations may interpolate them.
///
/// # Usage Pattern
///
/// The engine uses generics for zero-cost dispatch:
///
/// ```ignore
/// pub async fn sync<T: RowSink + LedgerStore>(target: &T, ...) -> Result<SyncReport> {
///     let id = target.insert_row("users", &row).await?;
///     if !target.row_exists("users", id).await? { ... }
/// }
/// ```
#[async_trait::async_trait]
pub trait RowSink: Send + Sync {
    /// Insert a row and return the id the database assigned it.
    ///
    /// An empty row inserts all column defaults.
    async fn insert_row(&self, table: &str, row: &ResolvedRow) -> Result<i64>;

    /// Whether a row with `id` currently exists in `table`.
    async fn row_exists(&self, table: &str, id: i64) -> Result<bool>;

    /// Set every column in `row` on the row with `id`.
    ///
    /// Updating a missing id is not an error; it affects nothing.
    async fn update_row(&self, table: &str, id: i64, row: &ResolvedRow) -> Result<()>;

    /// Empty every table of the target, returning the table names affected.
    async fn truncate_all(&self) -> Result<Vec<String>>;
}
