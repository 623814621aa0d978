//! Processor that turns `asyncapi` API entities into Event entities.

use tracing::{debug, info, info_span, warn, Span};

use crate::config::ProcessorConfig;
use crate::entity::{Entity, RELATION_HAS_PART, RELATION_OWNED_BY, RELATION_OWNER_OF, RELATION_PART_OF};
use crate::entity_ref::{parse_entity_ref, CompoundEntityRef, RefDefaults};
use crate::events::{derive_events, is_event_entity, validate_event_entity, ValidationError};

use super::{CatalogProcessor, Emit, LocationSpec, ProcessingResult, ProcessorError};

pub const PROCESSOR_NAME: &str = "EventEntitiesProcessor";

const API_VERSION_BACKSTAGE: &str = "backstage.io/v1alpha1";
const API_KIND: &str = "API";
const ASYNCAPI_TYPE: &str = "asyncapi";

/// Derives one Event entity per channel/message of every `asyncapi` API,
/// and validates and relates the Event entities themselves.
///
/// Holds no state between calls beyond its configuration and span.
#[derive(Debug, Clone)]
pub struct EventEntitiesProcessor {
    config: ProcessorConfig,
    span: Span,
}

impl EventEntitiesProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self::with_span(config, info_span!("processor", name = PROCESSOR_NAME))
    }

    /// Create a processor that logs under the given span.
    pub fn with_span(config: ProcessorConfig, span: Span) -> Self {
        span.in_scope(|| info!("{} constructor", PROCESSOR_NAME));
        Self { config, span }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    fn emit_events(&self, entity: &Entity, location: &LocationSpec, emit: &mut dyn Emit) {
        let name = &entity.metadata.name;
        info!(entity = %name, "{} API found of type {}", API_VERSION_BACKSTAGE, ASYNCAPI_TYPE);

        let Some(definition) = entity.spec_str("definition").filter(|d| !d.trim().is_empty()) else {
            debug!(entity = %name, "no asyncapi definition, nothing to derive");
            return;
        };

        match derive_events(entity, definition, &self.config) {
            Ok(events) => {
                for event in events {
                    info!(entity = %event.metadata.name, "emitting event entity");
                    emit.emit(ProcessingResult::entity(location.clone(), event));
                }
            }
            Err(e) => {
                warn!(entity = %name, error = %e, "failed to derive events from asyncapi definition");
            }
        }
    }

    fn emit_event_relations(&self, entity: &Entity, emit: &mut dyn Emit) -> Result<(), ProcessorError> {
        let self_ref = entity.compound_ref();

        if let Some(owner) = entity.spec_str("owner").filter(|o| !o.is_empty()) {
            let owner_ref = resolve_reference(entity, "owner", owner, "Group")?;
            emit_pair(emit, &self_ref, RELATION_OWNED_BY, RELATION_OWNER_OF, owner_ref);
        }

        if let Some(system) = entity.spec_str("system").filter(|s| !s.is_empty()) {
            let system_ref = resolve_reference(entity, "system", system, "System")?;
            emit_pair(emit, &self_ref, RELATION_PART_OF, RELATION_HAS_PART, system_ref);
        }

        Ok(())
    }
}

impl Default for EventEntitiesProcessor {
    fn default() -> Self {
        Self::new(ProcessorConfig::default())
    }
}

impl CatalogProcessor for EventEntitiesProcessor {
    fn processor_name(&self) -> &'static str {
        PROCESSOR_NAME
    }

    async fn validate_entity_kind(&self, entity: &Entity) -> Result<bool, ValidationError> {
        self.span.in_scope(|| {
            debug!(
                api_version = %entity.api_version,
                kind = %entity.kind,
                name = %entity.metadata.name,
                "validateEntityKind"
            );
            validate_event_entity(entity)
        })
    }

    async fn post_process_entity(
        &self,
        entity: Entity,
        location: &LocationSpec,
        emit: &mut dyn Emit,
    ) -> Result<Entity, ProcessorError> {
        self.span.in_scope(|| {
            debug!(
                api_version = %entity.api_version,
                kind = %entity.kind,
                name = %entity.metadata.name,
                "postProcessEntity"
            );

            if is_asyncapi_api(&entity) {
                self.emit_events(&entity, location, emit);
            }

            if is_event_entity(&entity) {
                self.emit_event_relations(&entity, emit)?;
            }

            Ok(entity)
        })
    }
}

fn is_asyncapi_api(entity: &Entity) -> bool {
    entity.is(API_VERSION_BACKSTAGE, API_KIND) && entity.spec_str("type") == Some(ASYNCAPI_TYPE)
}

fn resolve_reference(
    entity: &Entity,
    field: &'static str,
    reference: &str,
    default_kind: &str,
) -> Result<CompoundEntityRef, ProcessorError> {
    let defaults = RefDefaults {
        kind: Some(default_kind),
        namespace: Some(entity.namespace()),
    };
    parse_entity_ref(reference, defaults).map_err(|source| ProcessorError::InvalidReference {
        entity: entity.compound_ref().to_string(),
        field,
        source,
    })
}

fn emit_pair(emit: &mut dyn Emit, from: &CompoundEntityRef, forward: &str, reverse: &str, to: CompoundEntityRef) {
    emit.emit(ProcessingResult::relation(from.clone(), forward, to.clone()));
    emit.emit(ProcessingResult::relation(to, reverse, from.clone()));
}
