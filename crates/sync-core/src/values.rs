//! Value representations for declared fields and resolved columns.
//!
//! A [`FieldValue`] is what a declaration file says; a [`ColumnValue`] is
//! what gets bound to a statement once references and file markers have
//! been resolved.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::DeclarationError;
use crate::identity::LogicalId;

const REFERENCE_OPEN: &str = "${";
const REFERENCE_CLOSE: char = '}';
const FILE_OPEN: &str = "$file(";
const FILE_CLOSE: char = ')';

/// A declared field value.
///
/// Reference (`${table.name}`) and file (`$file(path)`) markers are
/// recognised once, when the declaration is parsed, and never re-detected
/// downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Explicit null
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit floating point
    Float(f64),

    /// Plain string, stored as-is
    Text(String),

    /// Row id of another declared entity
    Reference(LogicalId),

    /// Contents of a file
    File(PathBuf),
}

impl FieldValue {
    /// Classify a declared string.
    ///
    /// A marker has to span the whole string; anything else is plain text.
    pub fn parse_str(s: &str) -> Result<Self, DeclarationError> {
        if let Some(inner) = s
            .strip_prefix(REFERENCE_OPEN)
            .and_then(|rest| rest.strip_suffix(REFERENCE_CLOSE))
        {
            return LogicalId::parse(inner)
                .map(Self::Reference)
                .ok_or_else(|| DeclarationError::InvalidMarker(s.to_string()));
        }

        if let Some(inner) = s
            .strip_prefix(FILE_OPEN)
            .and_then(|rest| rest.strip_suffix(FILE_CLOSE))
        {
            if inner.trim().is_empty() {
                return Err(DeclarationError::InvalidMarker(s.to_string()));
            }
            return Ok(Self::File(PathBuf::from(inner)));
        }

        Ok(Self::Text(s.to_string()))
    }

    /// Convert a parsed document value.
    ///
    /// Arrays and mappings have no column representation and are rejected,
    /// as are integers outside the `i64` range.
    pub fn from_json(
        entity: &LogicalId,
        field: &str,
        value: &serde_json::Value,
    ) -> Result<Self, DeclarationError> {
        match value {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Integer(i))
                } else if let Some(f) = n.as_f64().filter(|f| n.is_f64() && f.is_finite()) {
                    Ok(Self::Float(f))
                } else {
                    Err(unsupported(entity, field, value))
                }
            }
            serde_json::Value::String(s) => Self::parse_str(s),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Err(unsupported(entity, field, value))
            }
        }
    }

    /// Anchor a relative file marker at `base`. Other values are unchanged.
    pub fn relative_to(self, base: &Path) -> Self {
        match self {
            Self::File(path) if path.is_relative() => Self::File(base.join(path)),
            other => other,
        }
    }
}

fn unsupported(entity: &LogicalId, field: &str, value: &serde_json::Value) -> DeclarationError {
    DeclarationError::UnsupportedValue {
        entity: entity.clone(),
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// A value ready to be bound as a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// Column name to resolved value, in column-name order.
pub type ResolvedRow = BTreeMap<String, ColumnValue>;
