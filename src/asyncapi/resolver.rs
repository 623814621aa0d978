//! Resolution of message `$ref` pointers.

use serde_yaml::Value;

use super::document::AsyncDocument;
use super::unescape_pointer_segment;

/// Prefix of the only reference shape that is resolved.
pub const COMPONENT_MESSAGE_PREFIX: &str = "#/components/messages/";

/// Outcome of resolving a channel's message entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// The entry is an inline message definition.
    Inline(&'a Value),
    /// The entry referenced `components.messages.<name>`, which exists.
    Component { name: &'a str, message: &'a Value },
    /// The entry is a `$ref` that does not point at an existing component
    /// message. `raw` is the reference object itself.
    Unresolved { reference: &'a str, raw: &'a Value },
}

impl<'a> Resolution<'a> {
    /// The message definition to use downstream. For an unresolved
    /// reference this is the raw `{ $ref }` object.
    pub fn message(&self) -> &'a Value {
        match self {
            Resolution::Inline(message) => message,
            Resolution::Component { message, .. } => message,
            Resolution::Unresolved { raw, .. } => raw,
        }
    }

    /// Name of the referenced component message, if any.
    pub fn component_name(&self) -> Option<&'a str> {
        match self {
            Resolution::Component { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Resolution::Unresolved { .. })
    }
}

/// The `$ref` string of a reference object, if `value` is one.
pub fn reference_of(value: &Value) -> Option<&str> {
    value.as_mapping()?.get("$ref")?.as_str()
}

/// Resolve a channel message entry against `components.messages`.
///
/// Never fails: entries that are not references come back as
/// [`Resolution::Inline`], references that cannot be followed come back as
/// [`Resolution::Unresolved`].
///
/// # Example
/// ```
/// use eda_catalog::asyncapi::{resolve_message, AsyncDocument};
///
/// let doc = AsyncDocument::parse(r#"
/// components:
///   messages:
///     UserCreated:
///       name: UserCreated
/// "#).unwrap();
/// let entry: serde_yaml::Value = serde_yaml::from_str("$ref: '#/components/messages/UserCreated'").unwrap();
///
/// let resolved = resolve_message(&doc, &entry);
/// assert_eq!(resolved.component_name(), Some("UserCreated"));
/// ```
pub fn resolve_message<'a>(document: &'a AsyncDocument, value: &'a Value) -> Resolution<'a> {
    let Some(reference) = reference_of(value) else {
        return Resolution::Inline(value);
    };

    let unresolved = Resolution::Unresolved { reference, raw: value };
    let Some(pointer) = reference.strip_prefix(COMPONENT_MESSAGE_PREFIX) else {
        return unresolved;
    };
    if pointer.is_empty() || pointer.contains('/') {
        return unresolved;
    }

    let name = unescape_pointer_segment(pointer);
    document
        .component_messages()
        .iter()
        .find_map(|(key, message)| {
            key.as_str()
                .filter(|key| *key == name)
                .map(|name| Resolution::Component { name, message })
        })
        .unwrap_or(unresolved)
}
