//! Record lifecycle through `RecordService` and the in-memory document store

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};

use policyhub::record::{
    Application, CreateRecord, InMemoryDocumentStore, Policy, RecordError, RecordService,
    RecordSettings, SchemaChangePolicy, UpdateRecord,
};
use policyhub::schema::{Payload, SchemaPatch};

fn policies(schema_change: SchemaChangePolicy) -> RecordService<Policy> {
    RecordService::new(
        Arc::new(InMemoryDocumentStore::new()),
        RecordSettings {
            schema_change,
            ..RecordSettings::default()
        },
    )
}

fn policy_request(title: &str, extra: Value) -> CreateRecord<policyhub::record::PolicyInput> {
    let mut body = json!({
        "policyType": "health",
        "title": title,
        "policyStartDate": "2024-01-01",
        "policyEndDate": "2025-01-01",
        "policyStatus": "active",
        "policyAmount": 500000,
        "policyTerm": 12
    });
    if let (Some(base), Value::Object(extra)) = (body.as_object_mut(), extra) {
        base.extend(extra);
    }
    serde_json::from_value(body).unwrap()
}

fn payload(value: Value) -> Payload {
    serde_json::from_value(value).unwrap()
}

fn health_schema() -> Value {
    json!({
        "smoker": { "type": "boolean", "label": "Smoker", "default": false },
        "cigarettesPerDay": {
            "type": "number",
            "label": "Cigarettes per day",
            "required": true,
            "min": 1,
            "dependsOn": { "field": "smoker", "value": true }
        },
        "bmi": { "type": "number", "label": "BMI", "required": true, "min": 10, "max": 60 }
    })
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn test_create_then_get_round_trips_schema_and_payload() {
    let service = policies(SchemaChangePolicy::Permissive);
    let created = service
        .create(
            policy_request(
                "Family Shield",
                json!({ "schemaDefinition": health_schema(), "dynamicFields": { "bmi": 24.5 } }),
            ),
            "agent-1",
        )
        .unwrap();

    assert!(created.attributes.policy_number.starts_with("POL-"));
    let fetched = service.get(created.id).unwrap();
    assert_eq!(fetched, created);
    assert_eq!(
        fetched.dynamic_fields.as_ref().and_then(|p| p.get("bmi")),
        Some(&json!(24.5))
    );
    assert!(fetched.schema_definition.as_ref().unwrap().contains("cigarettesPerDay"));
}

#[test]
fn test_defaults_fill_absent_keys_before_validation() {
    let service = policies(SchemaChangePolicy::Permissive);
    let created = service
        .create(
            policy_request(
                "Defaults",
                json!({ "schemaDefinition": health_schema(), "dynamicFields": { "bmi": 30 } }),
            ),
            "agent-1",
        )
        .unwrap();

    assert_eq!(created.dynamic_fields.unwrap().get("smoker"), Some(&json!(false)));
}

#[test]
fn test_create_rejects_with_every_violation() {
    let service = policies(SchemaChangePolicy::Permissive);
    let err = service
        .create(
            policy_request(
                "Invalid",
                json!({ "schemaDefinition": health_schema(), "dynamicFields": { "smoker": true, "bmi": 5 } }),
            ),
            "agent-1",
        )
        .unwrap_err();

    let violations = err.violations().unwrap();
    let paths: Vec<_> = violations.iter().map(|v| v.path.as_str()).collect();
    assert_eq!(paths, vec!["bmi", "cigarettesPerDay"]);
    assert_eq!(err.status_code(), 400);

    let page = service.list_params(&HashMap::new()).unwrap();
    assert_eq!(page.total, 0);
}

#[test]
fn test_rejected_fields_update_leaves_stored_payload_unchanged() {
    let service = policies(SchemaChangePolicy::Permissive);
    let created = service
        .create(
            policy_request(
                "Stable",
                json!({ "schemaDefinition": health_schema(), "dynamicFields": { "bmi": 22 } }),
            ),
            "agent-1",
        )
        .unwrap();

    let err = service
        .update_dynamic_fields(created.id, payload(json!({ "bmi": 99 })))
        .unwrap_err();
    assert!(matches!(err, RecordError::Validation(_)));
    assert_eq!(service.get(created.id).unwrap().dynamic_fields, created.dynamic_fields);

    let updated = service
        .update_dynamic_fields(created.id, payload(json!({ "bmi": 31, "smoker": false })))
        .unwrap();
    assert_eq!(updated.dynamic_fields.unwrap().get("bmi"), Some(&json!(31)));
}

#[test]
fn test_partial_update_merges_schema_and_payload() {
    let service = policies(SchemaChangePolicy::Permissive);
    let created = service
        .create(
            policy_request(
                "Merge",
                json!({ "schemaDefinition": health_schema(), "dynamicFields": { "bmi": 22 } }),
            ),
            "agent-1",
        )
        .unwrap();

    let patch: UpdateRecord<policyhub::record::PolicyPatch> = serde_json::from_value(json!({
        "policyStatus": "lapsed",
        "schemaDefinition": {
            "nominee": { "type": "string", "label": "Nominee", "required": true }
        },
        "dynamicFields": { "nominee": "Kavya" }
    }))
    .unwrap();

    let updated = service.update(created.id, patch).unwrap();
    assert_eq!(updated.attributes.policy_status, "lapsed");
    assert_eq!(updated.attributes.title, "Merge");

    let schema = updated.schema_definition.unwrap();
    assert!(schema.contains("bmi") && schema.contains("nominee"));
    let fields = updated.dynamic_fields.unwrap();
    assert_eq!(fields.get("bmi"), Some(&json!(22)));
    assert_eq!(fields.get("nominee"), Some(&json!("Kavya")));
}

#[test]
fn test_update_that_breaks_merged_schema_is_not_persisted() {
    let service = policies(SchemaChangePolicy::Permissive);
    let created = service
        .create(
            policy_request(
                "Guarded",
                json!({ "schemaDefinition": health_schema(), "dynamicFields": { "bmi": 22 } }),
            ),
            "agent-1",
        )
        .unwrap();

    let patch: UpdateRecord<policyhub::record::PolicyPatch> = serde_json::from_value(json!({
        "title": "Renamed",
        "schemaDefinition": {
            "nominee": { "type": "string", "label": "Nominee", "required": true }
        }
    }))
    .unwrap();

    assert!(matches!(
        service.update(created.id, patch),
        Err(RecordError::Validation(_))
    ));
    assert_eq!(service.get(created.id).unwrap(), created);
}

#[test]
fn test_permissive_schema_change_keeps_nonconforming_payload() {
    let service = policies(SchemaChangePolicy::Permissive);
    let created = service
        .create(
            policy_request(
                "Permissive",
                json!({ "schemaDefinition": health_schema(), "dynamicFields": { "bmi": 22 } }),
            ),
            "agent-1",
        )
        .unwrap();

    let strict: SchemaPatch = serde_json::from_value(json!({
        "occupation": { "type": "string", "label": "Occupation", "required": true }
    }))
    .unwrap();

    let updated = service.update_schema(created.id, strict).unwrap();
    assert!(updated.schema_definition.unwrap().contains("occupation"));
    assert_eq!(updated.dynamic_fields, created.dynamic_fields);
}

#[test]
fn test_revalidating_schema_change_rejects_nonconforming_payload() {
    let service = policies(SchemaChangePolicy::Revalidate);
    let created = service
        .create(
            policy_request(
                "Revalidate",
                json!({ "schemaDefinition": health_schema(), "dynamicFields": { "bmi": 22 } }),
            ),
            "agent-1",
        )
        .unwrap();

    let strict: SchemaPatch = serde_json::from_value(json!({
        "occupation": { "type": "string", "label": "Occupation", "required": true }
    }))
    .unwrap();

    let err = service.update_schema(created.id, strict).unwrap_err();
    assert_eq!(err.violations().unwrap().as_slice()[0].path, "occupation");
    assert_eq!(service.get(created.id).unwrap(), created);
}

#[test]
fn test_malformed_schema_is_a_client_error() {
    let service = policies(SchemaChangePolicy::Permissive);
    let err = service
        .create(
            policy_request(
                "Broken",
                json!({ "schemaDefinition": { "age": { "type": "number", "label": "Age", "step": -1 } } }),
            ),
            "agent-1",
        )
        .unwrap_err();

    assert!(matches!(err, RecordError::InvalidSchema(_)));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_duplicate_policy_number_conflicts() {
    let service = policies(SchemaChangePolicy::Permissive);
    service
        .create(policy_request("One", json!({ "policyNumber": "POL-FIXED001" })), "agent-1")
        .unwrap();

    let err = service
        .create(policy_request("Two", json!({ "policyNumber": "POL-FIXED001" })), "agent-1")
        .unwrap_err();
    assert_eq!(err.status_code(), 409);
}

#[test]
fn test_delete_is_hard_and_reports_missing() {
    let service = policies(SchemaChangePolicy::Permissive);
    let created = service.create(policy_request("Gone", json!({})), "agent-1").unwrap();

    service.delete(created.id).unwrap();
    assert!(matches!(service.get(created.id), Err(RecordError::NotFound("Policy"))));
    assert!(matches!(service.delete(created.id), Err(RecordError::NotFound(_))));
}

#[test]
fn test_list_filters_and_paginates_newest_first() {
    let service = policies(SchemaChangePolicy::Permissive);
    for i in 0..5 {
        let policy_type = if i % 2 == 0 { "health" } else { "motor" };
        service
            .create(
                policy_request(
                    &format!("Plan {}", i),
                    json!({
                        "policyType": policy_type,
                        "schemaDefinition": { "region": { "type": "string", "label": "Region" } },
                        "dynamicFields": { "region": if i < 3 { "west" } else { "north" } }
                    }),
                ),
                "agent-1",
            )
            .unwrap();
    }

    let page = service
        .list_params(&params(&[("policyType", "health"), ("limit", "2")]))
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert!(page.items[0].created_at >= page.items[1].created_at);

    let second = service
        .list_params(&params(&[("policyType", "health"), ("limit", "2"), ("page", "2")]))
        .unwrap();
    assert_eq!(second.items.len(), 1);

    let west = service.list_params(&params(&[("dynamic.region", "west")])).unwrap();
    assert_eq!(west.total, 3);

    let titled = service.list_params(&params(&[("title", "plan 4")])).unwrap();
    assert_eq!(titled.total, 1);
    assert_eq!(titled.items[0].attributes.title, "Plan 4");
}

#[test]
fn test_list_rejects_limit_above_maximum() {
    let service = policies(SchemaChangePolicy::Permissive);
    let err = service.list_params(&params(&[("limit", "500")])).unwrap_err();
    assert!(matches!(err, RecordError::LimitExceeded(500, 100)));
}

#[test]
fn test_applications_default_creator_and_unique_title() {
    let service: RecordService<Application> = RecordService::new(
        Arc::new(InMemoryDocumentStore::new()),
        RecordSettings::default(),
    );
    let request = || -> CreateRecord<policyhub::record::ApplicationInput> {
        serde_json::from_value(json!({
            "title": "Crop cover",
            "rules": ["Farmers only"],
            "isActive": true,
            "expiryDate": "2030-12-31"
        }))
        .unwrap()
    };

    let created = service.create(request(), "agent-42").unwrap();
    assert_eq!(created.attributes.created_by, "agent-42");

    let err = service.create(request(), "agent-7").unwrap_err();
    assert!(matches!(err, RecordError::Conflict { .. }));

    let mine = service
        .list_params(&params(&[("createdBy", "agent-42"), ("isActive", "true")]))
        .unwrap();
    assert_eq!(mine.total, 1);
}
