//! Test infrastructure for sync passes
//!
//! [`MemoryTarget`] keeps tables and the ledger in memory and records every
//! statement it is asked to run, so tests can assert both on the resulting
//! rows and on the statements a pass issued. The [`postgresql`] module sets
//! up a real database for the end-to-end tests.

pub mod memory;
pub mod postgresql;

pub use memory::{MemoryTarget, Statement};
