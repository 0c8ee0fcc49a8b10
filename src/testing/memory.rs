//! In-memory sync target

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Result};
use async_trait::async_trait;
use kitchen_sync_sink::RowSink;
use ledger::{LedgerEntry, LedgerStore, MemoryStore, LEDGER_TABLE};
use sync_core::{ColumnValue, ResolvedRow};

/// A statement a [`MemoryTarget`] was asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert { table: String, id: i64 },
    Exists { table: String, id: i64 },
    Update { table: String, id: i64 },
    Truncate,
}

impl Statement {
    pub fn is_insert(&self) -> bool {
        matches!(self, Statement::Insert { .. })
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Statement::Update { .. })
    }
}

#[derive(Debug, Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, ResolvedRow>,
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<String, Table>,
    statements: Vec<Statement>,
    failing: BTreeSet<String>,
}

/// Tables with serial ids plus a ledger, all held in memory.
///
/// Ids are assigned per table starting at 1 and are never reused, even after
/// a delete or a truncate, matching a `bigserial` column.
#[derive(Debug, Default)]
pub struct MemoryTarget {
    ledger: MemoryStore,
    state: Mutex<State>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ledger entries persisted so far.
    pub fn ledger(&self) -> &MemoryStore {
        &self.ledger
    }

    pub fn row(&self, table: &str, id: i64) -> Option<ResolvedRow> {
        self.lock()
            .tables
            .get(table)
            .and_then(|t| t.rows.get(&id))
            .cloned()
    }

    /// All rows of `table`, ordered by id.
    pub fn rows(&self, table: &str) -> Vec<(i64, ResolvedRow)> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.rows.iter().map(|(id, row)| (*id, row.clone())).collect())
            .unwrap_or_default()
    }

    /// Delete a row behind the engine's back. Returns whether it existed.
    pub fn delete_row(&self, table: &str, id: i64) -> bool {
        self.lock()
            .tables
            .get_mut(table)
            .is_some_and(|t| t.rows.remove(&id).is_some())
    }

    /// Overwrite one column of an existing row, as a user editing data would.
    pub fn set_column(&self, table: &str, id: i64, column: &str, value: ColumnValue) -> bool {
        match self
            .lock()
            .tables
            .get_mut(table)
            .and_then(|t| t.rows.get_mut(&id))
        {
            Some(row) => {
                row.insert(column.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Make every later insert into `table` fail.
    pub fn fail_inserts_into(&self, table: &str) {
        self.lock().failing.insert(table.to_string());
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.lock().statements.clone()
    }

    /// Return the statements recorded so far and start a fresh log.
    pub fn take_statements(&self) -> Vec<Statement> {
        std::mem::take(&mut self.lock().statements)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RowSink for MemoryTarget {
    async fn insert_row(&self, table: &str, row: &ResolvedRow) -> Result<i64> {
        let mut state = self.lock();
        if state.failing.contains(table) {
            bail!("Insert into {table} rejected");
        }

        let t = state.tables.entry(table.to_string()).or_default();
        t.last_id += 1;
        let id = t.last_id;
        t.rows.insert(id, row.clone());

        state.statements.push(Statement::Insert {
            table: table.to_string(),
            id,
        });
        Ok(id)
    }

    async fn row_exists(&self, table: &str, id: i64) -> Result<bool> {
        let mut state = self.lock();
        state.statements.push(Statement::Exists {
            table: table.to_string(),
            id,
        });
        Ok(state
            .tables
            .get(table)
            .is_some_and(|t| t.rows.contains_key(&id)))
    }

    async fn update_row(&self, table: &str, id: i64, row: &ResolvedRow) -> Result<()> {
        let mut state = self.lock();
        state.statements.push(Statement::Update {
            table: table.to_string(),
            id,
        });
        if let Some(existing) = state.tables.get_mut(table).and_then(|t| t.rows.get_mut(&id)) {
            existing.extend(row.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Ok(())
    }

    async fn truncate_all(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = {
            let mut state = self.lock();
            state.statements.push(Statement::Truncate);
            for table in state.tables.values_mut() {
                table.rows.clear();
            }
            state.tables.keys().cloned().collect()
        };
        self.ledger.clear();

        names.push(LEDGER_TABLE.to_string());
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl LedgerStore for MemoryTarget {
    async fn init_ledger(&self) -> Result<()> {
        self.ledger.init_ledger().await
    }

    async fn load_ledger(&self) -> Result<Vec<LedgerEntry>> {
        self.ledger.load_ledger().await
    }

    async fn record_entry(&self, entry: &LedgerEntry) -> Result<()> {
        self.ledger.record_entry(entry).await
    }
}
