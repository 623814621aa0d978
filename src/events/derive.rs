//! Derivation of Event entities from an `asyncapi` API entity.
//!
//! `draft_events` does the document work (walk, resolve, scope) and
//! `event_entity` turns a draft into the entity handed to the catalog.
//! Nothing here touches the sink; the processor decides what to do with
//! the result.

use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use tracing::warn;

use crate::asyncapi::{
    derive_topic, resolve_message, scalar_key, scope_document, AsyncDocument, DeriveError, Resolution, ScopeOptions,
};
use crate::config::{ProcessorConfig, RefPolicy};
use crate::entity::{is_valid_entity_name, Entity, EntityMeta, ANNOTATION_PARENT, LABEL_DOMAIN, LABEL_SUBDOMAIN};
use crate::events::kind::{EventSpec, EVENT_KIND};

/// One channel/message pair, ready to become an Event entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub channel_name: String,
    pub message_key: String,
    pub resolved_message: Value,
    pub topic: String,
    pub scoped_document: Mapping,
}

impl EventDraft {
    /// `name` of the resolved message, falling back to the message key.
    pub fn message_name(&self) -> &str {
        self.resolved_message
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(&self.message_key)
    }
}

/// Walk a document and build one draft per channel/message pair.
///
/// # Errors
/// Structural problems found while walking, and unresolved references
/// under [`RefPolicy::Reject`]
pub fn draft_events(document: &AsyncDocument, config: &ProcessorConfig) -> Result<Vec<EventDraft>, DeriveError> {
    let options = ScopeOptions {
        prune_schemas: config.prune_schemas,
    };
    let mut drafts = Vec::new();

    for slot in document.channel_messages() {
        let slot = slot?;
        let resolution = resolve_message(document, slot.message);

        if let Resolution::Unresolved { reference, .. } = resolution {
            match config.unresolved_refs {
                RefPolicy::PassThrough => {}
                RefPolicy::Skip => {
                    warn!(
                        channel = %slot.channel_name,
                        message = %slot.message_key,
                        reference,
                        "skipping message with unresolved reference"
                    );
                    continue;
                }
                RefPolicy::Reject => {
                    return Err(DeriveError::UnresolvedRef {
                        channel: slot.channel_name.to_string(),
                        message: slot.message_key.to_string(),
                        reference: reference.to_string(),
                    });
                }
            }
        }

        drafts.push(EventDraft {
            channel_name: slot.channel_name.to_string(),
            message_key: slot.message_key.to_string(),
            resolved_message: resolution.message().clone(),
            topic: derive_topic(&slot.channel_name, slot.channel),
            scoped_document: scope_document(document, &slot, &resolution, options),
        });
    }

    Ok(drafts)
}

/// Build the Event entity for a draft.
///
/// # Arguments
/// * `parent` - The `API` entity the definition came from
/// * `draft` - The channel/message pair
/// * `config` - Defaults and output settings
pub fn event_entity(parent: &Entity, draft: &EventDraft, config: &ProcessorConfig) -> Result<Entity, DeriveError> {
    let parent_ref = parent.compound_ref().to_string();
    let name = format!("{}-{}", parent.metadata.name, draft.message_key).to_lowercase();
    if !is_valid_entity_name(&name) {
        warn!(entity = %name, "derived event name does not satisfy catalog naming rules");
    }

    let message = stringify_keys(&draft.resolved_message);
    let message = serde_json::to_value(&message).map_err(|source| DeriveError::Conversion {
        message: draft.message_key.clone(),
        source,
    })?;
    let definition = serde_yaml::to_string(&draft.scoped_document).map_err(DeriveError::Serialize)?;

    let label = |key: &str| {
        config
            .propagate_domain_labels
            .then(|| parent.metadata.labels.get(key).cloned())
            .flatten()
    };
    let spec = EventSpec {
        event_type: parent.spec_str("type").unwrap_or("asyncapi").to_string(),
        lifecycle: non_empty(parent.spec_str("lifecycle")).unwrap_or(&config.default_lifecycle).to_string(),
        owner: non_empty(parent.spec_str("owner")).unwrap_or(&config.default_owner).to_string(),
        system: non_empty(parent.spec_str("system")).map(str::to_string),
        domain: label(LABEL_DOMAIN),
        subdomain: label(LABEL_SUBDOMAIN),
        channel: draft.channel_name.clone(),
        topic: draft.topic.clone(),
        message_name: draft.message_name().to_string(),
        message,
        api_ref: parent_ref.clone(),
        definition,
    };
    let spec = serde_json::to_value(&spec).map_err(|source| DeriveError::Conversion {
        message: draft.message_key.clone(),
        source,
    })?;

    let mut metadata = EntityMeta {
        name,
        namespace: parent.metadata.namespace.clone(),
        ..EntityMeta::default()
    };
    metadata.annotations.insert(ANNOTATION_PARENT.to_string(), parent_ref);

    Ok(Entity {
        api_version: config.event_api_version.clone(),
        kind: EVENT_KIND.to_string(),
        metadata,
        spec,
        ..Entity::default()
    })
}

/// Derive every Event entity for an API entity's AsyncAPI definition.
///
/// All-or-nothing for document errors: on error, no entities are
/// returned. A message that cannot be represented as JSON only drops its
/// own pair.
///
/// # Example
/// ```
/// use eda_catalog::{derive_events, Entity, ProcessorConfig};
/// use serde_json::json;
///
/// let api = Entity::new("backstage.io/v1alpha1", "API", "orders").with_spec(json!({
///     "type": "asyncapi",
///     "owner": "team-a",
/// }));
/// let definition = "channels:\n  placed:\n    messages:\n      OrderPlaced:\n        name: OrderPlaced\n";
///
/// let events = derive_events(&api, definition, &ProcessorConfig::default()).unwrap();
/// assert_eq!(events[0].metadata.name, "orders-orderplaced");
/// ```
pub fn derive_events(parent: &Entity, definition: &str, config: &ProcessorConfig) -> Result<Vec<Entity>, DeriveError> {
    let document = AsyncDocument::parse(definition)?;
    let mut events = Vec::new();

    for draft in draft_events(&document, config)? {
        match event_entity(parent, &draft, config) {
            Ok(event) => events.push(event),
            Err(err @ DeriveError::Conversion { .. }) => {
                warn!(
                    channel = %draft.channel_name,
                    message = %draft.message_key,
                    error = %err,
                    "skipping message that cannot be represented as JSON"
                );
            }
            Err(err) => return Err(err),
        }
    }

    Ok(events)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Copy of `value` with null, number and bool mapping keys turned into
/// strings, so the result has a JSON form. Collection keys are left alone.
fn stringify_keys(value: &Value) -> Value {
    match value {
        Value::Mapping(mapping) => Value::Mapping(
            mapping
                .iter()
                .map(|(key, child)| {
                    let key = match key {
                        Value::Null => Value::String("null".to_string()),
                        other => scalar_key(other)
                            .map(|k| Value::String(k.into_owned()))
                            .unwrap_or_else(|| other.clone()),
                    };
                    (key, stringify_keys(child))
                })
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(items.iter().map(stringify_keys).collect()),
        Value::Tagged(tagged) => Value::Tagged(Box::new(TaggedValue {
            tag: tagged.tag.clone(),
            value: stringify_keys(&tagged.value),
        })),
        other => other.clone(),
    }
}
