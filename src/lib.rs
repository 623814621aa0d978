//! # eda-catalog: Event entities from AsyncAPI definitions
//!
//! A catalog processor that reads the AsyncAPI document embedded in an `API`
//! entity and derives one `Event` entity per channel/message pair. Each
//! Event carries a copy of the definition cut down to its own channel and
//! message, so consumers can render or validate a single event without the
//! rest of the API.
//!
//! ## Features
//!
//! - **AsyncAPI walking**: lazy iteration over every channel's messages, in document order
//! - **Reference resolution**: `#/components/messages/<name>` pointers, with a configurable policy for the rest
//! - **Document scoping**: per-event definitions that never leak sibling channels, messages or schemas
//! - **Event kind**: validation of `eda.io/v1alpha1` / `eda.io/v1beta1` Event entities and their relations
//! - **Processor interface**: host-agnostic `CatalogProcessor` trait with an `Emit` sink
//!
//! ## Example: API entity
//!
//! ```yaml
//! apiVersion: backstage.io/v1alpha1
//! kind: API
//! metadata:
//!   name: example-asyncapi-api
//! spec:
//!   type: asyncapi
//!   lifecycle: experimental
//!   owner: guests
//!   definition: |
//!     asyncapi: '3.0.0'
//!     channels:
//!       userCreated:
//!         bindings:
//!           kafka:
//!             topic: users
//!         messages:
//!           UserCreated:
//!             $ref: '#/components/messages/UserCreated'
//!     components:
//!       messages:
//!         UserCreated:
//!           name: UserCreated
//! ```
//!
//! ## Example: derived Event
//!
//! ```yaml
//! apiVersion: eda.io/v1alpha1
//! kind: Event
//! metadata:
//!   name: example-asyncapi-api-usercreated
//!   annotations:
//!     backstage.io/parent: api:default/example-asyncapi-api
//! spec:
//!   type: asyncapi
//!   lifecycle: experimental
//!   owner: guests
//!   channel: userCreated
//!   topic: users
//!   messageName: UserCreated
//!   # message, apiRef, definition ...
//! ```

// Core modules
pub mod entity;
pub mod entity_ref;
pub mod config;
pub mod serialization;
pub mod loader;

// AsyncAPI parsing, walking and scoping
pub mod asyncapi;

// Event kind and derivation
pub mod events;

// Catalog processor interface
pub mod processor;

// Re-export key types
pub use entity::{Entity, EntityMeta, EntityRelation};
pub use entity_ref::{parse_entity_ref, CompoundEntityRef, EntityRefError, RefDefaults};
pub use config::{ConfigError, ProcessorConfig, RefPolicy};
pub use serialization::{OutputFormat, SerializationError};
pub use loader::{load_entities, parse_entities, LoadError};

pub use asyncapi::{AsyncDocument, DeriveError};
pub use events::{derive_events, validate_event_entity, EventDraft, EventSpec, ValidationError};
pub use processor::{
    CatalogProcessor, Emit, EventEntitiesProcessor, LocationSpec, ProcessingResult, ProcessorError, RelationSpec,
};
