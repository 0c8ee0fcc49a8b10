//! Loading declarations from a directory tree.
//!
//! Every `.toml`, `.yaml`/`.yml` and `.json` file below the root is parsed
//! as a document of the shape `table -> entity -> fields`:
//!
//! ```toml
//! [users.admin]
//! name = "Ada"
//!
//! [users.admin._defaults]
//! password = "changeme"
//!
//! [posts.welcome]
//! author = "${users.admin}"
//! body = "$file(bodies/welcome.md)"
//! ```
//!
//! Documents are merged; declaring the same entity twice is an error.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::declaration::{Declarations, EntityDecl};
use crate::error::DeclarationError;
use crate::identity::LogicalId;
use crate::values::FieldValue;

type RawDocument = BTreeMap<String, BTreeMap<String, serde_json::Map<String, serde_json::Value>>>;

/// Supported declaration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick a format from a file extension; `None` means "not a declaration file".
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Walk `root` recursively and parse every declaration file into one set.
///
/// Relative `$file(...)` paths are anchored at `root`. Hidden files and
/// directories are skipped. Files are visited in sorted path order.
pub fn load_declarations(root: &Path) -> Result<Declarations, DeclarationError> {
    let mut files = Vec::new();
    collect_files(root, &mut files)?;
    files.sort();

    let mut declarations = Declarations::new();
    for (path, format) in files.iter().filter_map(|p| Some((p, DocumentFormat::from_path(p)?))) {
        let contents = fs::read_to_string(path).map_err(|source| DeclarationError::Io {
            path: path.clone(),
            source,
        })?;
        let document = parse_document(&contents, format, path, root)?;
        tracing::debug!(
            "Loaded {} entities from {}",
            document.len(),
            path.display()
        );
        declarations.extend(document)?;
    }

    tracing::info!(
        "Loaded {} declared entities from {} files under {}",
        declarations.len(),
        files.len(),
        root.display()
    );

    Ok(declarations)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), DeclarationError> {
    let io_err = |source| DeclarationError::Io {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();

        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        if entry.file_type().map_err(io_err)?.is_dir() {
            collect_files(&path, out)?;
        } else if DocumentFormat::from_path(&path).is_some() {
            out.push(path);
        }
    }

    Ok(())
}

/// Parse a single document.
///
/// `path` is only used for error messages; `base_dir` anchors relative
/// file markers.
pub fn parse_document(
    contents: &str,
    format: DocumentFormat,
    path: &Path,
    base_dir: &Path,
) -> Result<Declarations, DeclarationError> {
    if contents.trim().is_empty() {
        return Ok(Declarations::new());
    }

    let raw: RawDocument = match format {
        DocumentFormat::Toml => {
            let toml_err = |source| DeclarationError::Toml {
                path: path.to_path_buf(),
                source,
            };
            let value = toml::Value::Table(toml::from_str(contents).map_err(toml_err)?);
            reject_non_finite(non_finite_toml(&value, &mut Vec::new()))?;
            value.try_into().map_err(toml_err)?
        }
        DocumentFormat::Yaml => {
            let yaml_err = |source| DeclarationError::Yaml {
                path: path.to_path_buf(),
                source,
            };
            let value: serde_yaml::Value = serde_yaml::from_str(contents).map_err(yaml_err)?;
            reject_non_finite(non_finite_yaml(&value, &mut Vec::new()))?;
            serde_yaml::from_value(value).map_err(yaml_err)?
        }
        DocumentFormat::Json => {
            serde_json::from_str(contents).map_err(|source| DeclarationError::Json {
                path: path.to_path_buf(),
                source,
            })?
        }
    };

    let mut declarations = Declarations::new();
    for (table, entities) in raw {
        for (name, mapping) in entities {
            let id = LogicalId::new(table.clone(), name);
            let mut entity = EntityDecl::from_mapping(&id, &mapping)?;
            anchor_files(&mut entity, base_dir);
            declarations.insert(id, entity)?;
        }
    }

    Ok(declarations)
}

/// A non-finite float found while scanning a document: the key path to it
/// and its rendering.
type NonFinite = (Vec<String>, String);

// NaN and infinities have no JSON representation and would turn into null.
fn non_finite_toml(value: &toml::Value, keys: &mut Vec<String>) -> Option<NonFinite> {
    match value {
        toml::Value::Float(f) if !f.is_finite() => Some((keys.clone(), f.to_string())),
        toml::Value::Table(table) => table.iter().find_map(|(key, value)| {
            keys.push(key.clone());
            let found = non_finite_toml(value, keys);
            keys.pop();
            found
        }),
        toml::Value::Array(items) => items.iter().find_map(|item| non_finite_toml(item, keys)),
        _ => None,
    }
}

fn non_finite_yaml(value: &serde_yaml::Value, keys: &mut Vec<String>) -> Option<NonFinite> {
    match value {
        serde_yaml::Value::Number(n) if n.is_nan() || n.is_infinite() => {
            Some((keys.clone(), n.to_string()))
        }
        serde_yaml::Value::Mapping(mapping) => mapping.iter().find_map(|(key, value)| {
            keys.push(key.as_str().map_or_else(|| format!("{key:?}"), str::to_string));
            let found = non_finite_yaml(value, keys);
            keys.pop();
            found
        }),
        serde_yaml::Value::Sequence(items) => {
            items.iter().find_map(|item| non_finite_yaml(item, keys))
        }
        serde_yaml::Value::Tagged(tagged) => non_finite_yaml(&tagged.value, keys),
        _ => None,
    }
}

/// Keys are `table`, `entity`, then the field (under `_defaults` for a
/// default).
fn reject_non_finite(found: Option<NonFinite>) -> Result<(), DeclarationError> {
    let Some((keys, value)) = found else {
        return Ok(());
    };
    let table = keys.first().cloned().unwrap_or_default();
    let name = keys.get(1).cloned().unwrap_or_default();
    Err(DeclarationError::UnsupportedValue {
        entity: LogicalId::new(table, name),
        field: keys.get(2..).map(|rest| rest.join(".")).unwrap_or_default(),
        value,
    })
}

fn anchor_files(entity: &mut EntityDecl, base_dir: &Path) {
    for value in entity.fields.values_mut().chain(entity.defaults.values_mut()) {
        *value = std::mem::replace(value, FieldValue::Null).relative_to(base_dir);
    }
}
