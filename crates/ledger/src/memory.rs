//! In-memory ledger storage implementation.

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::store::{LedgerEntry, LedgerStore};

/// Memory implementation of LedgerStore trait.
///
/// Entries are keyed by `(tablename, name)` like the persisted table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<(String, String), i64>>,
    initialized: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing entries.
    pub fn with_entries(entries: impl IntoIterator<Item = LedgerEntry>) -> Self {
        let store = Self::new();
        {
            let mut map = store.lock_entries();
            for entry in entries {
                map.insert((entry.tablename, entry.name), entry.id);
            }
        }
        store
    }

    pub fn is_initialized(&self) -> bool {
        *self
            .initialized
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the stored entries.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.lock_entries()
            .iter()
            .map(|((tablename, name), id)| LedgerEntry {
                tablename: tablename.clone(),
                name: name.clone(),
                id: *id,
            })
            .collect()
    }

    /// Drop every entry, as a truncate of the ledger table would.
    pub fn clear(&self) {
        self.lock_entries().clear();
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<(String, String), i64>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn init_ledger(&self) -> Result<()> {
        *self
            .initialized
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = true;
        Ok(())
    }

    async fn load_ledger(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.entries())
    }

    async fn record_entry(&self, entry: &LedgerEntry) -> Result<()> {
        self.lock_entries()
            .insert((entry.tablename.clone(), entry.name.clone()), entry.id);
        Ok(())
    }
}
