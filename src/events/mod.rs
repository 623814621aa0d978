//! The Event kind and its derivation from AsyncAPI definitions.

pub mod derive;
pub mod kind;

pub use derive::{derive_events, draft_events, event_entity, EventDraft};
pub use kind::{is_event_entity, validate_event_entity, EventSpec, ValidationError, EVENT_API_VERSIONS, EVENT_KIND};
