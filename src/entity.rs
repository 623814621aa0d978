//! Catalog entity envelope and shared constants.
//!
//! This module provides the host-agnostic shape of a catalog entity
//! (`apiVersion`, `kind`, `metadata`, `spec`) that the processor consumes
//! and emits. The `spec` stays an open JSON object so that entities of any
//! kind can flow through unchanged.

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::entity_ref::CompoundEntityRef;

/// Namespace used when an entity or reference does not name one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Annotation that links a derived entity back to the entity it came from.
pub const ANNOTATION_PARENT: &str = "backstage.io/parent";

/// Labels propagated from an `API` entity into the Events derived from it.
pub const LABEL_DOMAIN: &str = "eda.io/domain";
pub const LABEL_SUBDOMAIN: &str = "eda.io/subdomain";

pub const RELATION_OWNED_BY: &str = "ownedBy";
pub const RELATION_OWNER_OF: &str = "ownerOf";
pub const RELATION_PART_OF: &str = "partOf";
pub const RELATION_HAS_PART: &str = "hasPart";

const MAX_NAME_LENGTH: usize = 63;

/// A catalog entity.
///
/// Unknown top-level properties are kept in `extra` rather than dropped, so
/// that kind validation can reject them and round-trips stay lossless.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub metadata: EntityMeta,

    #[serde(default, skip_serializing_if = "JsonValue::is_null")]
    pub spec: JsonValue,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<EntityRelation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JsonValue>,

    #[serde(flatten)]
    pub extra: IndexMap<String, JsonValue>,
}

/// Entity metadata block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EntityMeta {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub labels: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub annotations: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, JsonValue>,
}

/// A directed relation between two entities, as stored on the source entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntityRelation {
    #[serde(rename = "type")]
    pub relation_type: String,
    pub target_ref: String,
}

impl Entity {
    /// Create an entity with an empty spec.
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            metadata: EntityMeta {
                name: name.into(),
                ..EntityMeta::default()
            },
            ..Self::default()
        }
    }

    /// Builder-style setter for the spec object.
    pub fn with_spec(mut self, spec: JsonValue) -> Self {
        self.spec = spec;
        self
    }

    /// Look up a spec field.
    pub fn spec_field(&self, key: &str) -> Option<&JsonValue> {
        self.spec.as_object().and_then(|spec| spec.get(key))
    }

    /// Look up a spec field that holds a string.
    ///
    /// Returns `None` both when the field is absent and when it holds a
    /// non-string value.
    pub fn spec_str(&self, key: &str) -> Option<&str> {
        self.spec_field(key).and_then(JsonValue::as_str)
    }

    /// Namespace of this entity, falling back to [`DEFAULT_NAMESPACE`].
    pub fn namespace(&self) -> &str {
        self.metadata
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    /// Compound reference (`kind`, `namespace`, `name`) of this entity.
    pub fn compound_ref(&self) -> CompoundEntityRef {
        CompoundEntityRef::new(&self.kind, self.namespace(), &self.metadata.name)
    }

    /// Returns true when `apiVersion` and `kind` match exactly.
    pub fn is(&self, api_version: &str, kind: &str) -> bool {
        self.api_version == api_version && self.kind == kind
    }
}

/// Check an entity name against the catalog naming rule: alphanumeric
/// segments joined by single `-`, `_` or `.`, at most 63 characters.
pub fn is_valid_entity_name(name: &str) -> bool {
    static NAME_PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = NAME_PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9]+([-_.][a-zA-Z0-9]+)*$").expect("entity name pattern is valid")
    });

    !name.is_empty() && name.len() <= MAX_NAME_LENGTH && pattern.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_from_yaml() {
        let yaml = r#"
apiVersion: backstage.io/v1alpha1
kind: API
metadata:
  name: example-asyncapi-api
  labels:
    eda.io/domain: user
spec:
  type: asyncapi
  owner: guests
"#;
        let entity: Entity = serde_yaml::from_str(yaml).unwrap();

        assert!(entity.is("backstage.io/v1alpha1", "API"));
        assert_eq!(entity.metadata.name, "example-asyncapi-api");
        assert_eq!(entity.metadata.labels.get(LABEL_DOMAIN).map(String::as_str), Some("user"));
        assert_eq!(entity.spec_str("type"), Some("asyncapi"));
        assert_eq!(entity.spec_str("missing"), None);
        assert_eq!(entity.namespace(), DEFAULT_NAMESPACE);
        assert!(entity.extra.is_empty());
    }

    #[test]
    fn test_unknown_top_level_fields_are_kept() {
        let entity: Entity = serde_json::from_value(json!({
            "apiVersion": "eda.io/v1alpha1",
            "kind": "Event",
            "metadata": { "name": "test" },
            "annotations": "Test"
        }))
        .unwrap();

        assert_eq!(entity.extra.get("annotations"), Some(&json!("Test")));

        let back = serde_json::to_value(&entity).unwrap();
        assert_eq!(back["annotations"], json!("Test"));
    }

    #[test]
    fn test_spec_str_ignores_non_strings() {
        let entity = Entity::new("eda.io/v1alpha1", "Event", "test")
            .with_spec(json!({ "type": 7 }));

        assert!(entity.spec_field("type").is_some());
        assert_eq!(entity.spec_str("type"), None);
    }

    #[test]
    fn test_compound_ref_uses_namespace() {
        let mut entity = Entity::new("backstage.io/v1alpha1", "API", "orders");
        entity.metadata.namespace = Some("payments".to_string());

        assert_eq!(entity.compound_ref().to_string(), "api:payments/orders");
    }

    #[test]
    fn test_entity_name_rule() {
        assert!(is_valid_entity_name("example-asyncapi-api-usercreated"));
        assert!(is_valid_entity_name("a.b_c-d"));
        assert!(!is_valid_entity_name(""));
        assert!(!is_valid_entity_name("-leading"));
        assert!(!is_valid_entity_name("double--dash"));
        assert!(!is_valid_entity_name("has space"));
        assert!(!is_valid_entity_name(&"a".repeat(64)));
    }
}
