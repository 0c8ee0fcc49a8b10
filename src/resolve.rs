//! Turning declared field values into bindable column values.

use std::path::Path;

use anyhow::{Context, Result};
use ledger::Ledger;
use sync_core::{ColumnValue, EntityDecl, FieldValue, LogicalId, ResolvedRow};
use tracing::warn;

use crate::materialize::Materializer;
use crate::Target;

impl<T: Target + ?Sized> Materializer<'_, T> {
    /// Resolve every field of `entity` into a column value.
    ///
    /// With `include_defaults`, the `_defaults` fields are resolved as well
    /// and win over a same-named regular field. References to entities not
    /// yet in `ledger` are materialized on the spot.
    pub async fn resolve_fields(
        &self,
        ledger: &mut Ledger,
        stack: &mut Vec<LogicalId>,
        entity: &EntityDecl,
        include_defaults: bool,
    ) -> Result<ResolvedRow> {
        let mut row = ResolvedRow::new();

        for (column, value) in &entity.fields {
            let resolved = self.resolve_value(ledger, stack, value).await?;
            row.insert(column.clone(), resolved);
        }

        if include_defaults {
            for (column, value) in &entity.defaults {
                let resolved = self.resolve_value(ledger, stack, value).await?;
                row.insert(column.clone(), resolved);
            }
        }

        Ok(row)
    }

    async fn resolve_value(
        &self,
        ledger: &mut Ledger,
        stack: &mut Vec<LogicalId>,
        value: &FieldValue,
    ) -> Result<ColumnValue> {
        let resolved = match value {
            FieldValue::Reference(target) => {
                let row_id = match ledger.get(target) {
                    Some(row_id) => row_id,
                    None => self
                        .materialize(ledger, stack, target)
                        .await
                        .with_context(|| format!("Failed to resolve reference to {target}"))?,
                };
                ColumnValue::Integer(row_id)
            }
            FieldValue::File(path) => ColumnValue::Text(read_file_literal(path).await),
            FieldValue::Text(s) => ColumnValue::Text(s.clone()),
            FieldValue::Integer(i) => ColumnValue::Integer(*i),
            FieldValue::Float(f) => ColumnValue::Float(*f),
            FieldValue::Bool(b) => ColumnValue::Bool(*b),
            FieldValue::Null => ColumnValue::Null,
        };
        Ok(resolved)
    }
}

/// Contents of a `$file(...)` marker.
///
/// A file that cannot be read, or is not UTF-8, becomes the empty string.
pub async fn read_file_literal(path: &Path) -> String {
    match tokio::fs::read(path).await {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(contents) => contents,
            Err(_) => {
                warn!("File {} is not valid UTF-8, using empty value", path.display());
                String::new()
            }
        },
        Err(e) => {
            warn!("Failed to read file {}: {e}, using empty value", path.display());
            String::new()
        }
    }
}
