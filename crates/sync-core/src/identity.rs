//! Logical identity of a declared entity.

use std::fmt;

/// The `(table, name)` pair declarations use to refer to an entity,
/// independent of the row id the database assigns it.
///
/// Renders as `table.name`, the same form used inside reference markers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalId {
    pub table: String,
    pub name: String,
}

impl LogicalId {
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
        }
    }

    /// Parse the `table.name` payload of a reference marker.
    ///
    /// Exactly one `.` is allowed; the table part must be a SQL identifier
    /// and the name part an entity name.
    pub fn parse(compound: &str) -> Option<Self> {
        let (table, name) = compound.split_once('.')?;
        if !is_sql_identifier(table) || !is_entity_name(name) {
            return None;
        }
        Some(Self::new(table, name))
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}

/// Whether `s` can be interpolated into a statement as an unquoted
/// table or column name: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_sql_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether `s` is a valid entity name: `[A-Za-z0-9_-]+`.
pub fn is_entity_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
