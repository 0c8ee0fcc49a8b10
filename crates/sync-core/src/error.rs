//! Error types for declaration loading.

use std::path::PathBuf;

use crate::identity::LogicalId;

/// Error type for declaration operations.
#[derive(Debug, thiserror::Error)]
pub enum DeclarationError {
    /// Error reading a declaration file or directory
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing TOML
    #[error("Failed to parse TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Error parsing YAML
    #[error("Failed to parse YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Error parsing JSON
    #[error("Failed to parse JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The same logical identity is declared more than once
    #[error("Entity '{0}' is declared more than once")]
    DuplicateEntity(LogicalId),

    /// A table, column or entity name is not usable
    #[error("Invalid {kind} name '{name}'")]
    InvalidIdentifier { kind: &'static str, name: String },

    /// `_defaults` is present but is not a mapping
    #[error("'_defaults' of entity '{0}' must be a mapping")]
    InvalidDefaults(LogicalId),

    /// A field holds a value kind that cannot become a column value
    #[error("Field '{field}' of entity '{entity}' has unsupported value: {value}")]
    UnsupportedValue {
        entity: LogicalId,
        field: String,
        value: String,
    },

    /// A string looks like a reference or file marker but is malformed
    #[error("Malformed marker '{0}'")]
    InvalidMarker(String),
}
