//! PostgreSQL target for kitchen-sync
//!
//! This library provides the PostgreSQL implementation of the engine's
//! seams: [`PostgresTarget`] implements `RowSink` for entity rows and
//! `LedgerStore` for the `_kitchensync` ledger table, over a single
//! `tokio_postgres` client.

pub mod statement;
mod target;
mod value;

pub use target::PostgresTarget;
pub use value::PgValue;
