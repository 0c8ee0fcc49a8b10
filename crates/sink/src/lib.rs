//! Row sink trait abstraction.
//!
//! This crate defines the `RowSink` trait the sync engine writes through.
//! `kitchen-sync-postgresql` implements it against a live database and the
//! root crate's `testing` module implements it in memory.
//!
//! The trait takes sync-core types (`ResolvedRow`) so the engine never sees
//! driver-specific parameter types.

mod traits;

pub use traits::RowSink;
