//! The declaration set: `table -> entity name -> field mapping`.

use std::collections::BTreeMap;

use crate::error::DeclarationError;
use crate::identity::{is_entity_name, is_sql_identifier, LogicalId};
use crate::values::FieldValue;

/// Field keys starting with this prefix are metadata, never columns.
pub const RESERVED_PREFIX: char = '_';

/// Holds fields that are only written on creation or on a reset pass.
pub const DEFAULTS_FIELD: &str = "_defaults";

/// One declared entity.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityDecl {
    /// Always-converging fields
    pub fields: BTreeMap<String, FieldValue>,
    /// Fields from `_defaults`
    pub defaults: BTreeMap<String, FieldValue>,
}

impl EntityDecl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper for a regular field.
    pub fn field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Builder-style helper for a `_defaults` field.
    pub fn default_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.defaults.insert(name.into(), value);
        self
    }

    /// Build an entity from a parsed field mapping.
    ///
    /// Keys with the reserved prefix are dropped, except `_defaults`, whose
    /// mapping becomes [`EntityDecl::defaults`].
    pub fn from_mapping(
        id: &LogicalId,
        mapping: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, DeclarationError> {
        let mut entity = Self::new();

        for (key, value) in mapping {
            if key == DEFAULTS_FIELD {
                let defaults = value
                    .as_object()
                    .ok_or_else(|| DeclarationError::InvalidDefaults(id.clone()))?;
                for (default_key, default_value) in defaults {
                    if default_key.starts_with(RESERVED_PREFIX) {
                        continue;
                    }
                    check_column(default_key)?;
                    entity.defaults.insert(
                        default_key.clone(),
                        FieldValue::from_json(id, default_key, default_value)?,
                    );
                }
                continue;
            }

            if key.starts_with(RESERVED_PREFIX) {
                continue;
            }

            check_column(key)?;
            entity
                .fields
                .insert(key.clone(), FieldValue::from_json(id, key, value)?);
        }

        Ok(entity)
    }
}

fn check_column(name: &str) -> Result<(), DeclarationError> {
    if is_sql_identifier(name) {
        Ok(())
    } else {
        Err(DeclarationError::InvalidIdentifier {
            kind: "column",
            name: name.to_string(),
        })
    }
}

/// All declared entities, grouped by table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Declarations {
    tables: BTreeMap<String, BTreeMap<String, EntityDecl>>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity. A second declaration of the same identity is an error.
    pub fn insert(&mut self, id: LogicalId, entity: EntityDecl) -> Result<(), DeclarationError> {
        if !is_sql_identifier(&id.table) {
            return Err(DeclarationError::InvalidIdentifier {
                kind: "table",
                name: id.table,
            });
        }
        if !is_entity_name(&id.name) {
            return Err(DeclarationError::InvalidIdentifier {
                kind: "entity",
                name: id.name,
            });
        }

        let table = self.tables.entry(id.table.clone()).or_default();
        if table.contains_key(&id.name) {
            return Err(DeclarationError::DuplicateEntity(id));
        }
        table.insert(id.name, entity);
        Ok(())
    }

    /// Builder-style [`Declarations::insert`] for fixtures; panics on conflict.
    pub fn with(mut self, table: &str, name: &str, entity: EntityDecl) -> Self {
        if let Err(e) = self.insert(LogicalId::new(table, name), entity) {
            panic!("invalid fixture declaration: {e}");
        }
        self
    }

    /// Merge another declaration set into this one.
    pub fn extend(&mut self, other: Declarations) -> Result<(), DeclarationError> {
        for (table, entities) in other.tables {
            for (name, entity) in entities {
                self.insert(LogicalId::new(table.clone(), name), entity)?;
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &LogicalId) -> Option<&EntityDecl> {
        self.tables.get(&id.table)?.get(&id.name)
    }

    pub fn contains(&self, id: &LogicalId) -> bool {
        self.get(id).is_some()
    }

    /// Every declared entity with its identity, table by table.
    pub fn iter(&self) -> impl Iterator<Item = (LogicalId, &EntityDecl)> {
        self.tables.iter().flat_map(|(table, entities)| {
            entities
                .iter()
                .map(move |(name, entity)| (LogicalId::new(table.as_str(), name.as_str()), entity))
        })
    }

    /// Number of declared entities across all tables.
    pub fn len(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
