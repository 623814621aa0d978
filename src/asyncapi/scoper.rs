//! Reduction of a document to a single channel/message.
//!
//! The scoped document keeps every top-level field of the source in its
//! original position. `channels` holds only the retained channel with only
//! the retained message entry; `components.messages` holds only the
//! component that entry references; `operations` holds only operations
//! bound to the retained channel. The source document is never modified.

use indexmap::IndexSet;
use serde_yaml::{Mapping, Value};

use super::document::AsyncDocument;
use super::resolver::{reference_of, Resolution};
use super::walker::MessageSlot;
use super::{escape_pointer_segment, unescape_pointer_segment};

const COMPONENT_SCHEMA_PREFIX: &str = "#/components/schemas/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeOptions {
    /// Keep only the schemas reachable from the retained channel, message
    /// and the other `components` sections carried along
    pub prune_schemas: bool,
}

impl Default for ScopeOptions {
    fn default() -> Self {
        Self { prune_schemas: true }
    }
}

/// Build the document for one channel/message pair.
///
/// # Arguments
/// * `document` - Source document
/// * `slot` - The channel/message pair being retained
/// * `resolution` - How `slot.message` resolved
/// * `options` - Scoping options
///
/// # Returns
/// A new top-level mapping
pub fn scope_document(
    document: &AsyncDocument,
    slot: &MessageSlot<'_>,
    resolution: &Resolution<'_>,
    options: ScopeOptions,
) -> Mapping {
    let channel = scoped_channel(slot);
    let mut scoped = Mapping::new();
    let mut channels_written = false;

    for (key, value) in document.root() {
        match key.as_str() {
            Some("channels") => {
                scoped.insert(key.clone(), Value::Mapping(single_entry(&slot.channel_name, channel.clone())));
                channels_written = true;
            }
            Some("components") => {
                let components = scoped_components(document, &channel, resolution, options);
                if !components.is_empty() {
                    scoped.insert(key.clone(), Value::Mapping(components));
                }
            }
            Some("operations") => match value {
                Value::Mapping(operations) => {
                    let operations = scoped_operations(operations, slot);
                    if !operations.is_empty() {
                        scoped.insert(key.clone(), Value::Mapping(operations));
                    }
                }
                other => {
                    scoped.insert(key.clone(), other.clone());
                }
            },
            _ => {
                scoped.insert(key.clone(), value.clone());
            }
        }
    }

    if !channels_written {
        scoped.insert(
            Value::String("channels".to_string()),
            Value::Mapping(single_entry(&slot.channel_name, channel)),
        );
    }

    scoped
}

/// The retained channel with `messages` cut down to the retained entry.
fn scoped_channel(slot: &MessageSlot<'_>) -> Value {
    let mut channel = slot.channel.clone();
    channel.insert(
        Value::String("messages".to_string()),
        Value::Mapping(single_entry(&slot.message_key, slot.message.clone())),
    );
    Value::Mapping(channel)
}

fn scoped_components(
    document: &AsyncDocument,
    channel: &Value,
    resolution: &Resolution<'_>,
    options: ScopeOptions,
) -> Mapping {
    let mut components = Mapping::new();

    for (key, value) in document.components() {
        let section = match key.as_str() {
            Some("messages") => match resolution {
                Resolution::Component { name, message } => {
                    Value::Mapping(single_entry(name, (*message).clone()))
                }
                _ => continue,
            },
            Some("schemas") if options.prune_schemas => {
                // Sections copied as-is (traits, parameters, ...) may point at schemas too.
                let mut roots = vec![channel, resolution.message()];
                roots.extend(
                    document
                        .components()
                        .iter()
                        .filter(|(section, _)| !matches!(section.as_str(), Some("messages" | "schemas")))
                        .map(|(_, section)| section),
                );
                let reachable = reachable_schemas(document, &roots);
                let schemas: Mapping = document
                    .component_schemas()
                    .iter()
                    .filter(|(name, _)| name.as_str().is_some_and(|name| reachable.contains(name)))
                    .map(|(name, schema)| (name.clone(), schema.clone()))
                    .collect();
                Value::Mapping(schemas)
            }
            _ => value.clone(),
        };

        if !is_empty_section(&section) {
            components.insert(key.clone(), section);
        }
    }

    components
}

/// Operations whose `channel` points at the retained channel. An operation
/// that lists `messages` keeps only the entries pointing at the retained
/// message, and is dropped when none remain.
fn scoped_operations(operations: &Mapping, slot: &MessageSlot<'_>) -> Mapping {
    let channel_pointer = format!("#/channels/{}", escape_pointer_segment(&slot.channel_name));
    let message_pointer = format!("{}/messages/{}", channel_pointer, escape_pointer_segment(&slot.message_key));

    let mut scoped = Mapping::new();
    for (name, operation) in operations {
        let bound_channel = operation.get("channel").and_then(reference_of);
        if bound_channel != Some(channel_pointer.as_str()) {
            continue;
        }

        let mut operation = operation.clone();
        if let Some(Value::Sequence(messages)) = operation.get_mut("messages") {
            if !messages.is_empty() {
                messages.retain(|message| reference_of(message) == Some(message_pointer.as_str()));
                if messages.is_empty() {
                    continue;
                }
            }
        }
        scoped.insert(name.clone(), operation);
    }
    scoped
}

/// Names of the component schemas referenced from `roots`, following
/// references between schemas transitively.
fn reachable_schemas(document: &AsyncDocument, roots: &[&Value]) -> IndexSet<String> {
    let mut found = IndexSet::new();
    let mut pending: Vec<&Value> = roots.to_vec();

    while let Some(value) = pending.pop() {
        let mut references = Vec::new();
        collect_schema_references(value, &mut references);

        for name in references {
            if found.insert(name.clone()) {
                if let Some(schema) = document.component_schemas().get(name.as_str()) {
                    pending.push(schema);
                }
            }
        }
    }

    found
}

fn collect_schema_references(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Mapping(mapping) => {
            for (key, child) in mapping {
                if key.as_str() == Some("$ref") {
                    if let Some(pointer) = child.as_str().and_then(|r| r.strip_prefix(COMPONENT_SCHEMA_PREFIX)) {
                        // Only the schema name; deeper pointers still need the whole schema.
                        let name = pointer.split('/').next().unwrap_or(pointer);
                        out.push(unescape_pointer_segment(name));
                    }
                } else {
                    collect_schema_references(child, out);
                }
            }
        }
        Value::Sequence(items) => items.iter().for_each(|item| collect_schema_references(item, out)),
        Value::Tagged(tagged) => collect_schema_references(&tagged.value, out),
        _ => {}
    }
}

fn single_entry(key: &str, value: Value) -> Mapping {
    let mut mapping = Mapping::new();
    mapping.insert(Value::String(key.to_string()), value);
    mapping
}

fn is_empty_section(value: &Value) -> bool {
    match value {
        Value::Mapping(mapping) => mapping.is_empty(),
        Value::Null => true,
        _ => false,
    }
}
