//! One sync pass: create missing, recreate deleted, update existing.

use anyhow::{Context, Result};
use ledger::Ledger;
use sync_core::Declarations;
use tracing::{debug, info, warn};

use crate::materialize::Materializer;
use crate::Target;

/// Counts of what a sync pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entities inserted for the first time
    pub created: usize,
    /// Tracked rows that had been deleted and were inserted again
    pub recreated: usize,
    /// Rows an update was issued for
    pub updated: usize,
    /// Ledger entries with no declaration, left untouched
    pub skipped: usize,
}

/// Drives a declaration set into a target.
///
/// Phases run strictly in order and the pass stops at the first error.
/// Statements already issued stay applied; re-running the pass picks up
/// where it left off.
pub struct Reconciler<'a, T: ?Sized> {
    target: &'a T,
    declarations: &'a Declarations,
}

impl<'a, T: Target + ?Sized> Reconciler<'a, T> {
    pub fn new(target: &'a T, declarations: &'a Declarations) -> Self {
        Self {
            target,
            declarations,
        }
    }

    /// Load the ledger from the target and run a pass against it.
    ///
    /// With `reset`, `_defaults` fields are written to existing rows too;
    /// otherwise they are only used when a row is created.
    pub async fn run(&self, reset: bool) -> Result<SyncReport> {
        let mut ledger = Ledger::load(self.target)
            .await
            .context("Failed to load ledger")?;
        self.run_with_ledger(&mut ledger, reset).await
    }

    /// Run a pass against an already loaded ledger, which is updated in
    /// place.
    pub async fn run_with_ledger(&self, ledger: &mut Ledger, reset: bool) -> Result<SyncReport> {
        let materializer = Materializer::new(self.target, self.declarations);
        let mut report = SyncReport::default();

        info!(
            "Starting sync of {} declared entities against {} ledger entries (reset: {reset})",
            self.declarations.len(),
            ledger.len()
        );

        // Create any entities that aren't in the ledger
        let before = ledger.len();
        for (id, _) in self.declarations.iter() {
            if !ledger.contains(&id) {
                materializer
                    .materialize(ledger, &mut Vec::new(), &id)
                    .await?;
            }
        }
        report.created = ledger.len() - before;

        // Forget any rows that were recorded, but have since been deleted
        let mut deleted = Vec::new();
        for entry in ledger.entries() {
            let id = entry.logical_id();
            if !self.declarations.contains(&id) {
                warn!(
                    "Ledger entry {id} (id {}) is no longer declared, leaving it untouched",
                    entry.id
                );
                report.skipped += 1;
                continue;
            }

            let exists = self
                .target
                .row_exists(&id.table, entry.id)
                .await
                .with_context(|| format!("Failed to check whether {id} still exists"))?;
            if !exists {
                info!("Row {} of {id} was deleted, recreating", entry.id);
                ledger.remove(&id);
                deleted.push(id);
            }
        }

        // Re-create them. All stale ids are gone from the ledger first, so a
        // reference to another deleted entity recreates that one on demand.
        for id in &deleted {
            if !ledger.contains(id) {
                materializer
                    .materialize(ledger, &mut Vec::new(), id)
                    .await
                    .with_context(|| format!("Failed to recreate {id}"))?;
            }
        }
        report.recreated = deleted.len();

        // Update all existing rows
        for entry in ledger.entries() {
            let id = entry.logical_id();
            let Some(entity) = self.declarations.get(&id) else {
                continue;
            };

            let row = materializer
                .resolve_fields(ledger, &mut Vec::new(), entity, reset)
                .await
                .with_context(|| format!("Failed to resolve fields of {id}"))?;
            if row.is_empty() {
                debug!("{id} has no fields to update");
                continue;
            }

            self.target
                .update_row(&id.table, entry.id, &row)
                .await
                .with_context(|| format!("Failed to update {id}"))?;
            report.updated += 1;
        }

        info!(
            "Sync finished: {} created, {} recreated, {} updated, {} skipped",
            report.created, report.recreated, report.updated, report.skipped
        );

        Ok(report)
    }
}
