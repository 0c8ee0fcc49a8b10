//! Core types for the kitchen-sync framework.
//!
//! This crate provides the declaration data model shared by the engine and
//! the database targets:
//!
//! - [`LogicalId`] - The `(table, name)` handle declarations use for an entity
//! - [`FieldValue`] - A declared field value, with reference and file markers
//!   already parsed into their own variants
//! - [`EntityDecl`] / [`Declarations`] - The nested `table -> entity -> fields` mapping
//! - [`ColumnValue`] / [`ResolvedRow`] - Values ready to be bound to a statement
//! - [`load_declarations`] - Walks a directory tree and parses declaration files
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    ├─── ledger                   (logical identity -> row id mapping)
//!    ├─── kitchen-sync-sink        (row writes against a target)
//!    ├─── kitchen-sync-postgresql  (binds ColumnValue to PostgreSQL types)
//!    └─── kitchen-sync             (resolves FieldValue into ColumnValue)
//! ```
//!
//! # Example
//!
//! ```rust
//! use sync_core::{FieldValue, LogicalId};
//!
//! let value = FieldValue::parse_str("${users.admin}").unwrap();
//! assert_eq!(value, FieldValue::Reference(LogicalId::new("users", "admin")));
//! ```

pub mod declaration;
pub mod error;
pub mod identity;
pub mod load;
pub mod values;

pub use declaration::{Declarations, EntityDecl, DEFAULTS_FIELD, RESERVED_PREFIX};
pub use error::DeclarationError;
pub use identity::{is_entity_name, is_sql_identifier, LogicalId};
pub use load::{load_declarations, parse_document, DocumentFormat};
pub use values::{ColumnValue, FieldValue, ResolvedRow};
