//! Loading catalog entities from YAML files.
//!
//! Catalog location files hold any number of entities as `---`-separated
//! YAML documents. Empty documents are skipped.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::entity::Entity;

/// Error type for entity loading
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse entity document {index}: {source}")]
    Parse {
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Load all entities from a multi-document YAML file.
///
/// # Arguments
///
/// * `path` - Path to the YAML file
///
/// # Example
///
/// ```ignore
/// use eda_catalog::loader::load_entities;
///
/// let entities = load_entities("catalog/entities.yaml")?;
/// ```
pub fn load_entities<P: AsRef<Path>>(path: P) -> Result<Vec<Entity>, LoadError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.display().to_string(),
        source,
    })?;

    parse_entities(&contents)
}

/// Parse all entities from a multi-document YAML string.
///
/// Document indexes in errors count every document, empty ones included,
/// starting at 0.
pub fn parse_entities(contents: &str) -> Result<Vec<Entity>, LoadError> {
    let mut entities = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_str(contents).enumerate() {
        let value = serde_yaml::Value::deserialize(document).map_err(|source| LoadError::Parse { index, source })?;
        if value.is_null() {
            continue;
        }

        let entity = serde_yaml::from_value(value).map_err(|source| LoadError::Parse { index, source })?;
        entities.push(entity);
    }

    Ok(entities)
}
