//! Creating rows for declared entities.

use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use ledger::{Ledger, LedgerEntry};
use sync_core::{Declarations, LogicalId};
use tracing::info;

use crate::error::SyncError;
use crate::Target;

/// Creates rows for declared entities and records them in the ledger.
///
/// Materializing resolves the entity's fields, and resolving a reference to
/// an entity without a ledger entry materializes that entity first. The two
/// recurse into each other through [`Materializer::materialize`]; `stack`
/// holds the identities currently being materialized so that a cycle fails
/// instead of recursing forever.
pub struct Materializer<'a, T: ?Sized> {
    pub(crate) target: &'a T,
    pub(crate) declarations: &'a Declarations,
}

impl<'a, T: Target + ?Sized> Materializer<'a, T> {
    pub fn new(target: &'a T, declarations: &'a Declarations) -> Self {
        Self {
            target,
            declarations,
        }
    }

    /// Ensure `id` has a row and a ledger entry, returning its row id.
    ///
    /// An identity already in `ledger` is left alone. Otherwise the entity
    /// is inserted with its defaults, and the new id is persisted (replacing
    /// any stale entry) and then recorded in `ledger`. If the ledger write
    /// fails after the insert succeeded, the row is left behind untracked.
    pub fn materialize<'b>(
        &'b self,
        ledger: &'b mut Ledger,
        stack: &'b mut Vec<LogicalId>,
        id: &'b LogicalId,
    ) -> BoxFuture<'b, Result<i64>> {
        async move {
            if let Some(row_id) = ledger.get(id) {
                return Ok(row_id);
            }

            let entity = self
                .declarations
                .get(id)
                .ok_or_else(|| SyncError::UnknownEntity(id.clone()))?;

            if stack.contains(id) {
                return Err(SyncError::circular(stack, id).into());
            }

            stack.push(id.clone());
            let resolved = self.resolve_fields(ledger, stack, entity, true).await;
            stack.pop();
            let row = resolved?;

            let row_id = self
                .target
                .insert_row(&id.table, &row)
                .await
                .with_context(|| format!("Failed to create {id}"))?;

            self.target
                .record_entry(&LedgerEntry::new(id, row_id))
                .await
                .with_context(|| format!("Created {id} as id {row_id} but failed to record it"))?;
            ledger.insert(id.clone(), row_id);

            info!("Created {id} with id {row_id}");
            Ok(row_id)
        }
        .boxed()
    }
}
