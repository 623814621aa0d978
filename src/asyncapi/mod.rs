//! AsyncAPI document handling.
//!
//! Parses an AsyncAPI YAML document, walks its channel/message pairs,
//! resolves local message references and cuts the document down to a single
//! channel/message for each derived Event.

pub mod document;
pub mod error;
pub mod resolver;
pub mod scoper;
pub mod topic;
pub mod walker;

pub use document::AsyncDocument;
pub use error::DeriveError;
pub use resolver::{resolve_message, Resolution};
pub use scoper::{scope_document, ScopeOptions};
pub use topic::derive_topic;
pub use walker::{ChannelMessages, MessageSlot};

use std::borrow::Cow;

use serde_yaml::Value;

/// Escape a name for use as a JSON pointer segment (`~` → `~0`, `/` → `~1`).
pub(crate) fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Inverse of [`escape_pointer_segment`].
pub(crate) fn unescape_pointer_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// String form of a scalar mapping key. YAML reads `404:` or `true:` as a
/// number or bool; those keys are used as `"404"` / `"true"`. Null and
/// collection keys have no string form.
pub(crate) fn scalar_key(key: &Value) -> Option<Cow<'_, str>> {
    match key {
        Value::String(s) => Some(Cow::Borrowed(s)),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}
