//! SQL text for the statements the target issues.
//!
//! Table and column names are interpolated unquoted: the declaration loader
//! only admits plain identifiers, and leaving them unquoted keeps
//! PostgreSQL's case folding. Values are always `$n` parameters.

use ledger::LEDGER_TABLE;

/// Idempotent creation of the ledger table.
pub fn create_ledger_table() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {LEDGER_TABLE} (
            tablename TEXT NOT NULL,
            name TEXT NOT NULL,
            id BIGINT NOT NULL,
            PRIMARY KEY (tablename, name)
        )"
    )
}

pub fn select_ledger() -> String {
    format!("SELECT tablename, name, id FROM {LEDGER_TABLE}")
}

/// Insert or overwrite the id of one ledger entry.
pub fn upsert_ledger_entry() -> String {
    format!(
        "INSERT INTO {LEDGER_TABLE} (tablename, name, id) VALUES ($1, $2, $3) \
         ON CONFLICT (tablename, name) DO UPDATE SET id = EXCLUDED.id"
    )
}

/// Base tables of the `public` schema, the set `TRUNCATE` can act on.
pub const LIST_PUBLIC_TABLES: &str = "SELECT table_name FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_type = 'BASE TABLE' ORDER BY table_name";

pub fn insert_row(table: &str, columns: &[&str]) -> String {
    if columns.is_empty() {
        return format!("INSERT INTO {table} DEFAULT VALUES RETURNING id");
    }

    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("${i}")).collect();
    format!(
        "INSERT INTO {table} ({}) VALUES ({}) RETURNING id",
        columns.join(", "),
        placeholders.join(", ")
    )
}

pub fn row_exists(table: &str) -> String {
    format!("SELECT 1 FROM {table} WHERE id = $1")
}

/// `UPDATE` setting `columns` from `$1..$n`; the row id is `$n+1`.
pub fn update_row(table: &str, columns: &[&str]) -> String {
    let assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{column} = ${}", i + 1))
        .collect();
    format!(
        "UPDATE {table} SET {} WHERE id = ${}",
        assignments.join(", "),
        columns.len() + 1
    )
}

/// One `TRUNCATE ... CASCADE` over every table, or `None` if there are none.
///
/// These names come from the catalog rather than from declarations, so
/// they are quoted.
pub fn truncate_tables(tables: &[String]) -> Option<String> {
    if tables.is_empty() {
        return None;
    }
    let quoted: Vec<String> = tables.iter().map(|t| quote_identifier(t)).collect();
    Some(format!("TRUNCATE {} CASCADE", quoted.join(", ")))
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
