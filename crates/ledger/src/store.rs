//! Ledger storage trait and types
//!
//! This module defines the LedgerStore trait for backend-agnostic
//! persistence of the identity ledger, plus the entry type it stores.

use anyhow::Result;
use async_trait::async_trait;
use sync_core::LogicalId;

/// Name of the table the ledger is persisted in.
pub const LEDGER_TABLE: &str = "_kitchensync";

/// One persisted `(table, name) -> id` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Table the entity lives in
    pub tablename: String,
    /// Entity name within the table
    pub name: String,
    /// Row id assigned on creation
    pub id: i64,
}

impl LedgerEntry {
    pub fn new(logical_id: &LogicalId, id: i64) -> Self {
        Self {
            tablename: logical_id.table.clone(),
            name: logical_id.name.clone(),
            id,
        }
    }

    pub fn logical_id(&self) -> LogicalId {
        LogicalId::new(self.tablename.as_str(), self.name.as_str())
    }
}

/// Trait for ledger storage operations.
///
/// This trait abstracts the storage backend for the ledger, allowing the
/// same engine to work with:
/// - PostgreSQL (`PostgresTarget` in kitchen-sync-postgresql)
/// - Memory (`MemoryStore`, for tests)
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Create the backing storage if it does not exist yet.
    async fn init_ledger(&self) -> Result<()>;

    /// Read every persisted entry.
    async fn load_ledger(&self) -> Result<Vec<LedgerEntry>>;

    /// Persist an entry, replacing any existing one for the same
    /// `(tablename, name)`.
    async fn record_entry(&self, entry: &LedgerEntry) -> Result<()>;
}
