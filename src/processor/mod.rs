//! Catalog processor interface.
//!
//! A processor is invoked by the catalog engine for every entity on every
//! processing pass. It can claim entity kinds it knows how to validate and
//! emit derived entities and relations through an [`Emit`] sink.

pub mod event_entities;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::Entity;
use crate::entity_ref::{CompoundEntityRef, EntityRefError};
use crate::events::ValidationError;

pub use event_entities::EventEntitiesProcessor;

/// Where an entity was read from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocationSpec {
    #[serde(rename = "type")]
    pub location_type: String,
    pub target: String,
}

impl LocationSpec {
    pub fn new(location_type: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            location_type: location_type.into(),
            target: target.into(),
        }
    }
}

/// A relation emitted by a processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSpec {
    pub source: CompoundEntityRef,
    #[serde(rename = "type")]
    pub relation_type: String,
    pub target: CompoundEntityRef,
}

/// Output of a processor, handed to the catalog engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProcessingResult {
    Entity { location: LocationSpec, entity: Entity },
    Relation { relation: RelationSpec },
}

impl ProcessingResult {
    pub fn entity(location: LocationSpec, entity: Entity) -> Self {
        ProcessingResult::Entity { location, entity }
    }

    pub fn relation(source: CompoundEntityRef, relation_type: &str, target: CompoundEntityRef) -> Self {
        ProcessingResult::Relation {
            relation: RelationSpec {
                source,
                relation_type: relation_type.to_string(),
                target,
            },
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            ProcessingResult::Entity { entity, .. } => Some(entity),
            _ => None,
        }
    }

    pub fn into_entity(self) -> Option<Entity> {
        match self {
            ProcessingResult::Entity { entity, .. } => Some(entity),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&RelationSpec> {
        match self {
            ProcessingResult::Relation { relation } => Some(relation),
            _ => None,
        }
    }
}

/// Sink for processing results.
///
/// Implemented for closures and for `Vec<ProcessingResult>`. A panicking
/// sink is not caught by processors.
pub trait Emit {
    fn emit(&mut self, result: ProcessingResult);
}

impl<F> Emit for F
where
    F: FnMut(ProcessingResult),
{
    fn emit(&mut self, result: ProcessingResult) {
        self(result)
    }
}

impl Emit for Vec<ProcessingResult> {
    fn emit(&mut self, result: ProcessingResult) {
        self.push(result);
    }
}

/// Error type for processor failures that the catalog engine must see
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Invalid {field} reference on {entity}: {source}")]
    InvalidReference {
        entity: String,
        field: &'static str,
        #[source]
        source: EntityRefError,
    },
}

/// A processor plugged into the catalog engine.
///
/// Both hooks have pass-through defaults so a processor only implements
/// what it needs.
#[allow(async_fn_in_trait)]
pub trait CatalogProcessor {
    fn processor_name(&self) -> &'static str;

    /// Claim an entity kind. `Ok(false)` hands the entity to the next
    /// processor in the chain; `Err` marks the entity invalid.
    async fn validate_entity_kind(&self, _entity: &Entity) -> Result<bool, ValidationError> {
        Ok(false)
    }

    /// Runs after an entity has been validated. Returns the (possibly
    /// modified) entity.
    async fn post_process_entity(
        &self,
        entity: Entity,
        _location: &LocationSpec,
        _emit: &mut dyn Emit,
    ) -> Result<Entity, ProcessorError> {
        Ok(entity)
    }
}
