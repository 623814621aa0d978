//! Integration tests for the Event entities processor

use eda_catalog::{
    derive_events, load_entities, CatalogProcessor, Entity, EventEntitiesProcessor, LocationSpec, ProcessingResult,
    ProcessorConfig, RefPolicy,
};
use serde_json::json;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/entities.yaml");

fn api_entity(definition: &str) -> Entity {
    Entity::new("backstage.io/v1alpha1", "API", "example-asyncapi-api").with_spec(json!({
        "type": "asyncapi",
        "lifecycle": "experimental",
        "owner": "guests",
        "definition": definition,
    }))
}

async fn post_process(processor: &EventEntitiesProcessor, entity: Entity) -> (Entity, Vec<ProcessingResult>) {
    let mut emitted = Vec::new();
    let location = LocationSpec::new("url", "https://example.com/catalog-info.yaml");
    let returned = processor
        .post_process_entity(entity, &location, &mut emitted)
        .await
        .unwrap();
    (returned, emitted)
}

fn emitted_entities(results: &[ProcessingResult]) -> Vec<&Entity> {
    results.iter().filter_map(ProcessingResult::as_entity).collect()
}

fn fixture_api() -> Entity {
    load_entities(FIXTURE)
        .unwrap()
        .into_iter()
        .find(|e| e.kind == "API")
        .unwrap()
}

fn definition_of(entity: &Entity) -> serde_yaml::Value {
    serde_yaml::from_str(entity.spec_str("definition").unwrap()).unwrap()
}

#[tokio::test]
async fn test_inline_message_scenario() {
    let processor = EventEntitiesProcessor::default();
    let source = api_entity(
        r#"
asyncapi: '3.0.0'
channels:
  userCreated:
    bindings:
      kafka:
        topic: users
    messages:
      UserCreated:
        name: UserCreated
"#,
    );

    let (returned, results) = post_process(&processor, source.clone()).await;
    let events = emitted_entities(&results);

    assert_eq!(returned, source);
    assert_eq!(events.len(), 1);
    let event = events[0];
    assert_eq!(event.metadata.name, "example-asyncapi-api-usercreated");
    assert_eq!(event.spec_str("topic"), Some("users"));
    assert_eq!(event.spec_str("channel"), Some("userCreated"));
    assert_eq!(event.spec_str("messageName"), Some("UserCreated"));

    match &results[0] {
        ProcessingResult::Entity { location, .. } => {
            assert_eq!(location.target, "https://example.com/catalog-info.yaml");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_one_event_per_channel() {
    let processor = EventEntitiesProcessor::default();
    let source = api_entity(
        r#"
channels:
  orderPlaced:
    messages:
      OrderPlaced: { name: OrderPlaced }
  orderShipped:
    messages:
      OrderShipped: { name: OrderShipped }
  orderCancelled:
    messages:
      OrderCancelled: { name: OrderCancelled }
"#,
    );

    let (_, results) = post_process(&processor, source).await;
    let names: Vec<&str> = emitted_entities(&results)
        .iter()
        .map(|e| e.metadata.name.as_str())
        .collect();

    assert_eq!(
        names,
        vec![
            "example-asyncapi-api-orderplaced",
            "example-asyncapi-api-ordershipped",
            "example-asyncapi-api-ordercancelled",
        ]
    );
}

#[tokio::test]
async fn test_fixture_api_derives_scoped_events() {
    let processor = EventEntitiesProcessor::default();
    let (_, results) = post_process(&processor, fixture_api()).await;
    let events = emitted_entities(&results);

    assert_eq!(events.len(), 2);

    let created = events[0];
    assert_eq!(created.metadata.name, "example-asyncapi-api-usercreated");
    assert_eq!(created.spec["message"]["name"], "UserCreated");
    assert_eq!(created.spec_str("topic"), Some("users"));
    assert_eq!(created.spec_str("system"), Some("examples"));
    assert_eq!(created.spec_str("domain"), Some("identity"));
    assert_eq!(created.spec_str("subdomain"), Some("users"));
    assert_eq!(created.spec_str("apiRef"), Some("api:default/example-asyncapi-api"));

    let text = created.spec_str("definition").unwrap();
    assert!(!text.contains("userUpdated"));
    assert!(!text.contains("UserUpdated"));

    let definition = definition_of(created);
    let channels = definition["channels"].as_mapping().unwrap();
    assert_eq!(channels.len(), 1);
    assert!(channels.contains_key("userCreated"));
    assert_eq!(
        definition["channels"]["userCreated"]["messages"]["UserCreated"]["$ref"],
        "#/components/messages/UserCreated"
    );

    let messages = definition["components"]["messages"].as_mapping().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages.contains_key("UserCreated"));

    let schemas = definition["components"]["schemas"].as_mapping().unwrap();
    assert_eq!(schemas.len(), 1);
    assert!(schemas.contains_key("UserCreatedPayload"));

    let operations = definition["operations"].as_mapping().unwrap();
    assert_eq!(operations.len(), 1);
    assert!(operations.contains_key("onUserCreated"));

    let updated = events[1];
    assert_eq!(updated.spec_str("topic"), Some("user/updated"));
    assert!(!updated.spec_str("definition").unwrap().contains("UserCreated"));
}

#[test]
fn test_topic_fallback_chain() {
    let definition = r#"
channels:
  withKafka:
    address: ignored/address
    bindings:
      kafka:
        topic: users
    messages:
      A: { name: A }
  withAddress:
    address: user/created
    messages:
      B: { name: B }
  bare:
    messages:
      C: { name: C }
"#;

    let events = derive_events(&api_entity(definition), definition, &ProcessorConfig::default()).unwrap();
    let topics: Vec<&str> = events.iter().map(|e| e.spec_str("topic").unwrap()).collect();

    assert_eq!(topics, vec!["users", "user/created", "bare"]);
}

#[tokio::test]
async fn test_malformed_definition_emits_nothing() {
    let processor = EventEntitiesProcessor::default();

    for broken in ["channels: [unclosed", "- a\n- list\n", "channels:\n  c:\n    messages: 42\n"] {
        let source = api_entity(broken);
        let (returned, results) = post_process(&processor, source.clone()).await;

        assert_eq!(returned, source);
        assert!(results.is_empty(), "emitted for {broken:?}");
    }
}

#[test]
fn test_derivation_is_idempotent() {
    let api = fixture_api();
    let definition = api.spec_str("definition").unwrap();
    let config = ProcessorConfig::default();

    let first = derive_events(&api, definition, &config).unwrap();
    let second = derive_events(&api, definition, &config).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_yaml::to_string(&first).unwrap(),
        serde_yaml::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_unresolved_reference_policies() {
    let definition = r#"
channels:
  known:
    messages:
      Known:
        $ref: '#/components/messages/Known'
  missing:
    messages:
      Missing:
        $ref: '#/components/messages/Missing'
components:
  messages:
    Known:
      name: Known
"#;

    let count = |policy: RefPolicy| {
        let config = ProcessorConfig {
            unresolved_refs: policy,
            ..ProcessorConfig::default()
        };
        async move {
            let processor = EventEntitiesProcessor::new(config);
            let (_, results) = post_process(&processor, api_entity(definition)).await;
            emitted_entities(&results).len()
        }
    };

    assert_eq!(count(RefPolicy::PassThrough).await, 2);
    assert_eq!(count(RefPolicy::Skip).await, 1);
    assert_eq!(count(RefPolicy::Reject).await, 0);
}

#[tokio::test]
async fn test_fixture_validation_and_relations() {
    let processor = EventEntitiesProcessor::default();
    let entities = load_entities(FIXTURE).unwrap();
    assert_eq!(entities.len(), 3);

    let mut verdicts = Vec::new();
    for entity in &entities {
        verdicts.push(processor.validate_entity_kind(entity).await);
    }
    assert_eq!(verdicts, vec![Ok(false), Ok(false), Ok(true)]);

    let event = entities[2].clone();
    let (_, results) = post_process(&processor, event).await;
    let relations: Vec<String> = results
        .iter()
        .filter_map(ProcessingResult::as_relation)
        .map(|r| format!("{} {} {}", r.source, r.relation_type, r.target))
        .collect();

    assert_eq!(
        relations,
        vec![
            "event:default/billing-invoiceissued ownedBy group:finance/billing-team".to_string(),
            "group:finance/billing-team ownerOf event:default/billing-invoiceissued".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_derived_events_pass_kind_validation() {
    let processor = EventEntitiesProcessor::default();
    let (_, results) = post_process(&processor, fixture_api()).await;

    for event in emitted_entities(&results) {
        assert_eq!(processor.validate_entity_kind(event).await, Ok(true));
    }
}
