//! Identity ledger for kitchen-sync
//!
//! The ledger maps a logical identity (`table`, `name`) to the row id the
//! database assigned when the entity was first created. It is what makes a
//! sync pass idempotent: an identity with a ledger entry is never inserted
//! again.
//!
//! # Architecture
//!
//! - [`Ledger`] is the in-memory mapping a sync pass owns. It is loaded
//!   wholesale from a store at the start of the pass and updated as
//!   entities are created, so later reference resolution sees new ids.
//! - [`LedgerStore`] persists entries. Implementations write through on
//!   every creation; nothing is batched.
//!
//! ## Storage Backends
//!
//! - `PostgresTarget` (kitchen-sync-postgresql) - the `_kitchensync` table
//! - [`MemoryStore`] - a mutex-guarded map for tests

use std::collections::BTreeMap;

use anyhow::Result;
use sync_core::LogicalId;

mod memory;
pub mod store;


pub use memory::MemoryStore;
pub use store::{LedgerEntry, LedgerStore, LEDGER_TABLE};

/// In-memory view of the ledger for one sync pass.
///
/// It is not a cache: ids are never evicted and never re-verified against
/// the database on lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    ids: BTreeMap<LogicalId, i64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every persisted entry from `store`.
    pub async fn load<S: LedgerStore + ?Sized>(store: &S) -> Result<Self> {
        let entries = store.load_ledger().await?;
        tracing::debug!("Loaded {} ledger entries", entries.len());
        Ok(entries.into_iter().collect())
    }

    pub fn get(&self, id: &LogicalId) -> Option<i64> {
        self.ids.get(id).copied()
    }

    pub fn contains(&self, id: &LogicalId) -> bool {
        self.ids.contains_key(id)
    }

    /// Record `row_id` for `id`, returning the id it replaces, if any.
    pub fn insert(&mut self, id: LogicalId, row_id: i64) -> Option<i64> {
        self.ids.insert(id, row_id)
    }

    /// Forget `id` in memory. The persisted entry is left untouched.
    pub fn remove(&mut self, id: &LogicalId) -> Option<i64> {
        self.ids.remove(id)
    }

    /// Snapshot of all entries, ordered by logical identity.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.ids
            .iter()
            .map(|(id, row_id)| LedgerEntry::new(id, *row_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<LedgerEntry> for Ledger {
    fn from_iter<I: IntoIterator<Item = LedgerEntry>>(iter: I) -> Self {
        Self {
            ids: iter
                .into_iter()
                .map(|entry| (entry.logical_id(), entry.id))
                .collect(),
        }
    }
}
