//! The `Event` entity kind.
//!
//! Events describe the messages Components exchange over a channel. They are
//! derived from `API` entities of type `asyncapi`, one per channel/message.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::entity::{is_valid_entity_name, Entity};

pub const EVENT_KIND: &str = "Event";

/// Accepted `apiVersion`s for Event entities; the first is the default.
pub const EVENT_API_VERSIONS: [&str; 2] = ["eda.io/v1alpha1", "eda.io/v1beta1"];

/// Typed view of an Event entity's `spec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSpec {
    #[serde(rename = "type")]
    pub event_type: String,
    pub lifecycle: String,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    pub channel: String,
    pub topic: String,
    pub message_name: String,
    /// Resolved message definition
    pub message: JsonValue,
    /// Reference to the API entity this Event was derived from
    pub api_ref: String,
    /// Scoped AsyncAPI document, as YAML
    pub definition: String,
}

/// Error type for Event kind validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be a non-empty string")]
    InvalidField { field: String },

    #[error("metadata.name \"{0}\" is not a valid entity name")]
    InvalidName(String),

    #[error("spec must be an object")]
    InvalidSpec,

    #[error("entity must NOT have additional properties: {}", .0.join(", "))]
    AdditionalProperties(Vec<String>),
}

/// Returns true when `apiVersion`/`kind` identify an Event entity.
pub fn is_event_entity(entity: &Entity) -> bool {
    entity.kind == EVENT_KIND && EVENT_API_VERSIONS.contains(&entity.api_version.as_str())
}

/// Validate an entity against the Event kind.
///
/// # Returns
/// * `Ok(true)` - the entity is a valid Event
/// * `Ok(false)` - the entity is not an Event (other apiVersion or kind)
/// * `Err(e)` - the entity claims to be an Event but is malformed
pub fn validate_event_entity(entity: &Entity) -> Result<bool, ValidationError> {
    if !is_event_entity(entity) {
        return Ok(false);
    }

    // Anything outside apiVersion/kind/metadata/spec/relations/status lands in `extra`.
    let extra: Vec<String> = entity.extra.keys().cloned().collect();
    if !extra.is_empty() {
        return Err(ValidationError::AdditionalProperties(extra));
    }

    if !is_valid_entity_name(&entity.metadata.name) {
        return Err(ValidationError::InvalidName(entity.metadata.name.clone()));
    }

    let spec = entity.spec.as_object().ok_or(ValidationError::InvalidSpec)?;
    for field in ["type", "lifecycle", "owner", "definition"] {
        if !is_non_empty_string(spec.get(field)) {
            return Err(ValidationError::InvalidField {
                field: format!("spec.{}", field),
            });
        }
    }
    if let Some(system) = spec.get("system") {
        if !is_non_empty_string(Some(system)) {
            return Err(ValidationError::InvalidField {
                field: "spec.system".to_string(),
            });
        }
    }

    Ok(true)
}

fn is_non_empty_string(value: Option<&JsonValue>) -> bool {
    value.and_then(JsonValue::as_str).is_some_and(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event() -> Entity {
        Entity::new("eda.io/v1alpha1", "Event", "test").with_spec(json!({
            "type": "asyncapi",
            "lifecycle": "production",
            "owner": "me",
            "definition": "asyncapi: '3.0.0'\n",
            "system": "system",
        }))
    }

    fn spec_mut(entity: &mut Entity) -> &mut serde_json::Map<String, JsonValue> {
        entity.spec.as_object_mut().unwrap()
    }

    fn rejected_field(entity: &Entity) -> String {
        validate_event_entity(entity).unwrap_err().to_string()
    }

    #[test]
    fn test_accepts_valid_event() {
        assert_eq!(validate_event_entity(&event()), Ok(true));
    }

    #[test]
    fn test_accepts_v1beta1() {
        let mut entity = event();
        entity.api_version = "eda.io/v1beta1".to_string();
        assert_eq!(validate_event_entity(&entity), Ok(true));
    }

    #[test]
    fn test_ignores_unknown_api_version_and_kind() {
        let mut entity = event();
        entity.api_version = "backstage.io/v1beta0".to_string();
        assert_eq!(validate_event_entity(&entity), Ok(false));

        let mut entity = event();
        entity.kind = "Wizard".to_string();
        assert_eq!(validate_event_entity(&entity), Ok(false));
    }

    #[test]
    fn test_rejects_missing_wrong_or_empty_required_fields() {
        for field in ["type", "lifecycle", "owner", "definition"] {
            let mut missing = event();
            spec_mut(&mut missing).remove(field);
            assert!(rejected_field(&missing).contains(field), "missing {field}");

            let mut wrong = event();
            spec_mut(&mut wrong).insert(field.to_string(), json!(7));
            assert!(rejected_field(&wrong).contains(field), "wrong {field}");

            let mut empty = event();
            spec_mut(&mut empty).insert(field.to_string(), json!(""));
            assert!(rejected_field(&empty).contains(field), "empty {field}");
        }
    }

    #[test]
    fn test_system_is_optional_but_typed() {
        let mut entity = event();
        spec_mut(&mut entity).remove("system");
        assert_eq!(validate_event_entity(&entity), Ok(true));

        spec_mut(&mut entity).insert("system".to_string(), json!(7));
        assert!(rejected_field(&entity).contains("system"));

        spec_mut(&mut entity).insert("system".to_string(), json!(""));
        assert!(rejected_field(&entity).contains("system"));
    }

    #[test]
    fn test_rejects_additional_properties() {
        let mut entity = event();
        entity.extra.insert("annotations".to_string(), json!("Test"));

        let message = rejected_field(&entity);
        assert!(message.contains("additional properties"));
        assert!(message.contains("annotations"));
    }

    #[test]
    fn test_rejects_invalid_name() {
        let mut entity = event();
        entity.metadata.name = "not a name".to_string();
        assert!(matches!(validate_event_entity(&entity), Err(ValidationError::InvalidName(_))));
    }

    #[test]
    fn test_event_spec_serializes_in_camel_case() {
        let spec = EventSpec {
            event_type: "asyncapi".to_string(),
            lifecycle: "experimental".to_string(),
            owner: "guests".to_string(),
            system: None,
            domain: Some("user".to_string()),
            subdomain: None,
            channel: "userCreated".to_string(),
            topic: "users".to_string(),
            message_name: "UserCreated".to_string(),
            message: json!({ "name": "UserCreated" }),
            api_ref: "api:default/example".to_string(),
            definition: "asyncapi: 3.0.0\n".to_string(),
        };

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["type"], json!("asyncapi"));
        assert_eq!(value["messageName"], json!("UserCreated"));
        assert_eq!(value["apiRef"], json!("api:default/example"));
        assert!(value.get("system").is_none());
        assert_eq!(value["domain"], json!("user"));
    }
}
