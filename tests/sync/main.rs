//! Sync pass E2E tests
//!
//! These run full passes against the in-memory target, either from
//! declarations built in code or loaded from a temporary directory.

mod declarations_from_files;
