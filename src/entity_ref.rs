//! Entity references in the `[<kind>:][<namespace>/]<name>` string form.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::DEFAULT_NAMESPACE;

/// Error type for entity reference parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityRefError {
    #[error("Entity reference \"{0}\" was not on the form [<kind>:][<namespace>/]<name>")]
    Malformed(String),

    #[error("Entity reference \"{0}\" had missing or empty kind (e.g. did not start with \"component:\" or similar)")]
    MissingKind(String),
}

/// A fully qualified entity reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompoundEntityRef {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl CompoundEntityRef {
    pub fn new(kind: impl Into<String>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

/// Renders the canonical string form: kind and namespace lowercased, name as-is.
impl fmt::Display for CompoundEntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}/{}",
            self.kind.to_lowercase(),
            self.namespace.to_lowercase(),
            self.name
        )
    }
}

/// Defaults applied to the parts a reference string leaves out.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefDefaults<'a> {
    pub kind: Option<&'a str>,
    pub namespace: Option<&'a str>,
}

/// Parse an entity reference string.
///
/// A `/` that appears before the first `:` means the string has no kind
/// part. Missing namespaces fall back to `defaults.namespace`, then to
/// `default`; a missing kind with no default is an error.
///
/// # Example
/// ```
/// use eda_catalog::entity_ref::{parse_entity_ref, RefDefaults};
///
/// let owner = parse_entity_ref("team-a", RefDefaults { kind: Some("Group"), namespace: None }).unwrap();
/// assert_eq!(owner.to_string(), "group:default/team-a");
/// ```
pub fn parse_entity_ref(reference: &str, defaults: RefDefaults<'_>) -> Result<CompoundEntityRef, EntityRefError> {
    let slash = reference.find('/');
    let colon = reference.find(':').filter(|c| slash.map_or(true, |s| *c < s));

    let kind = colon.map(|c| &reference[..c]);
    let name_start = colon.map_or(0, |c| c + 1);
    let namespace = slash.map(|s| &reference[name_start..s]);
    let name = &reference[slash.map_or(name_start, |s| s + 1)..];

    if kind == Some("") || namespace == Some("") || name.is_empty() {
        return Err(EntityRefError::Malformed(reference.to_string()));
    }

    let kind = kind
        .or(defaults.kind)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| EntityRefError::MissingKind(reference.to_string()))?;
    let namespace = namespace
        .or(defaults.namespace)
        .unwrap_or(DEFAULT_NAMESPACE);

    Ok(CompoundEntityRef::new(kind, namespace, name))
}
