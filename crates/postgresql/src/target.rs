//! PostgreSQL implementation of the row sink and ledger store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use kitchen_sync_sink::RowSink;
use ledger::{LedgerEntry, LedgerStore};
use sync_core::{ColumnValue, ResolvedRow};
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info};

use crate::statement;
use crate::value::PgValue;

/// A connected PostgreSQL database acting as the sync target.
///
/// Statements are issued one at a time on a single client; nothing is
/// wrapped in a transaction.
pub struct PostgresTarget {
    client: Client,
}

impl PostgresTarget {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect to `uri` and spawn the connection driver on the runtime.
    pub async fn connect(uri: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(uri, NoTls)
            .await
            .context("Failed to connect to PostgreSQL")?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {e}");
            }
        });

        info!("Connected to PostgreSQL");
        Ok(Self::new(client))
    }
}

fn params<'a>(values: &'a [PgValue<'a>]) -> Vec<&'a (dyn ToSql + Sync)> {
    values.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

fn describe(row: &ResolvedRow) -> String {
    row.iter()
        .map(|(column, value)| format!("{column}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read a `RETURNING id` column that may be `bigserial` or `serial`.
fn read_id(row: &Row) -> Result<i64> {
    if let Ok(id) = row.try_get::<_, i64>(0) {
        Ok(id)
    } else if let Ok(id) = row.try_get::<_, i32>(0) {
        Ok(i64::from(id))
    } else if let Ok(id) = row.try_get::<_, i16>(0) {
        Ok(i64::from(id))
    } else {
        Err(anyhow::anyhow!(
            "Failed to read returned id - the id column must be an integer type"
        ))
    }
}

#[async_trait]
impl RowSink for PostgresTarget {
    async fn insert_row(&self, table: &str, row: &ResolvedRow) -> Result<i64> {
        let columns: Vec<&str> = row.keys().map(String::as_str).collect();
        let values: Vec<PgValue<'_>> = row.values().map(PgValue).collect();
        let sql = statement::insert_row(table, &columns);

        debug!("Executing query {sql} [{}]", describe(row));
        let returned = self
            .client
            .query_one(&sql, &params(&values))
            .await
            .with_context(|| format!("Failed to insert into {table}"))?;

        read_id(&returned).with_context(|| format!("Failed to insert into {table}"))
    }

    async fn row_exists(&self, table: &str, id: i64) -> Result<bool> {
        let id_value = ColumnValue::Integer(id);
        let sql = statement::row_exists(table);

        debug!("Executing query {sql} [id={id}]");
        let found = self
            .client
            .query_opt(&sql, &[&PgValue(&id_value)])
            .await
            .with_context(|| format!("Failed to check for {table} row {id}"))?;

        Ok(found.is_some())
    }

    async fn update_row(&self, table: &str, id: i64, row: &ResolvedRow) -> Result<()> {
        if row.is_empty() {
            debug!("Nothing to update for {table} row {id}");
            return Ok(());
        }

        let columns: Vec<&str> = row.keys().map(String::as_str).collect();
        let id_value = ColumnValue::Integer(id);
        let values: Vec<PgValue<'_>> = row
            .values()
            .chain(std::iter::once(&id_value))
            .map(PgValue)
            .collect();
        let sql = statement::update_row(table, &columns);

        debug!("Executing query {sql} [{}, id={id}]", describe(row));
        self.client
            .execute(&sql, &params(&values))
            .await
            .with_context(|| format!("Failed to update {table} row {id}"))?;

        Ok(())
    }

    async fn truncate_all(&self) -> Result<Vec<String>> {
        let tables: Vec<String> = self
            .client
            .query(statement::LIST_PUBLIC_TABLES, &[])
            .await
            .context("Failed to list tables")?
            .iter()
            .map(|row| row.get::<_, String>(0))
            .collect();

        let Some(sql) = statement::truncate_tables(&tables) else {
            info!("No tables to truncate");
            return Ok(tables);
        };

        debug!("Executing query {sql}");
        self.client
            .batch_execute(&sql)
            .await
            .context("Failed to truncate tables")?;

        Ok(tables)
    }
}

#[async_trait]
impl LedgerStore for PostgresTarget {
    async fn init_ledger(&self) -> Result<()> {
        self.client
            .batch_execute(&statement::create_ledger_table())
            .await
            .context("Failed to create ledger table")
    }

    async fn load_ledger(&self) -> Result<Vec<LedgerEntry>> {
        let rows = self
            .client
            .query(&statement::select_ledger(), &[])
            .await
            .context("Failed to load ledger")?;

        rows.iter()
            .map(|row| -> Result<LedgerEntry> {
                Ok(LedgerEntry {
                    tablename: row.try_get(0)?,
                    name: row.try_get(1)?,
                    id: row.try_get(2)?,
                })
            })
            .collect()
    }

    async fn record_entry(&self, entry: &LedgerEntry) -> Result<()> {
        self.client
            .execute(
                &statement::upsert_ledger_entry(),
                &[&entry.tablename, &entry.name, &entry.id],
            )
            .await
            .with_context(|| {
                format!(
                    "Failed to record ledger entry {}.{} = {}",
                    entry.tablename, entry.name, entry.id
                )
            })?;
        Ok(())
    }
}
