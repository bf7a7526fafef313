//! Payload validation against a dynamic schema
//!
//! Validation semantics:
//! - Walks schema entries, not payload keys; undeclared payload keys are ignored
//! - A field whose `dependsOn` gate is unmet is skipped entirely
//! - Absent and null values are equivalent; only `required` reports them
//! - A type mismatch stops further checks for that field only
//! - Every other rule failure is collected; nothing short-circuits globally
//!
//! The validator is pure: no I/O, no shared state, no panics on payload data.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::errors::Violation;
use super::types::{ArrayRules, FieldDef, FieldKind, NumberRules, Payload, Schema, StringRules};

/// Absolute tolerance, in units of `step`, for the `step` multiple check
const STEP_TOLERANCE: f64 = 1e-9;

/// Validates payloads against one schema.
pub struct SchemaValidator<'a> {
    schema: &'a Schema,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Returns every violation found in `payload`; empty means valid.
    pub fn validate(&self, payload: &Payload) -> Vec<Violation> {
        let mut violations = Vec::new();
        self.validate_scope(self.schema, payload, "", &mut violations);
        violations
    }

    fn validate_scope(&self, schema: &Schema, scope: &Payload, prefix: &str, out: &mut Vec<Violation>) {
        for (name, def) in schema.iter() {
            let path = make_path(prefix, name);
            self.validate_slot(def, scope, scope.get(name), &path, out);
        }
    }

    /// Dependency gate, then presence, then type dispatch.
    fn validate_slot(
        &self,
        def: &FieldDef,
        scope: &Payload,
        value: Option<&Value>,
        path: &str,
        out: &mut Vec<Violation>,
    ) {
        if !dependency_met(def, scope) {
            return;
        }

        let value = match value {
            Some(v) if !v.is_null() => v,
            _ => {
                if def.required {
                    out.push(Violation::required(path));
                }
                return;
            }
        };

        match &def.kind {
            FieldKind::String(rules) => check_string(rules, value, path, out),
            FieldKind::Number(rules) => check_number(rules, value, path, out),
            FieldKind::Date => {
                if !is_date(value) {
                    out.push(Violation::type_mismatch(path, "a valid date"));
                }
            }
            FieldKind::Boolean => {
                if !value.is_boolean() {
                    out.push(Violation::type_mismatch(path, "a boolean"));
                }
            }
            FieldKind::Array(rules) => self.check_array(rules, scope, value, path, out),
            FieldKind::Object(rules) => {
                let Some(obj) = value.as_object() else {
                    out.push(Violation::type_mismatch(path, "an object"));
                    return;
                };
                if let Some(properties) = &rules.properties {
                    self.validate_scope(properties, obj, path, out);
                }
            }
        }
    }

    fn check_array(
        &self,
        rules: &ArrayRules,
        scope: &Payload,
        value: &Value,
        path: &str,
        out: &mut Vec<Violation>,
    ) {
        let Some(items) = value.as_array() else {
            out.push(Violation::type_mismatch(path, "an array"));
            return;
        };

        let len = items.len() as u64;
        if let Some(min) = rules.min_items {
            if len < min {
                out.push(Violation::new(
                    path,
                    format!("{} must have at least {} items (minItems)", path, min),
                ));
            }
        }
        if let Some(max) = rules.max_items {
            if len > max {
                out.push(Violation::new(
                    path,
                    format!("{} must have at most {} items (maxItems)", path, max),
                ));
            }
        }
        if rules.unique_items == Some(true) && has_duplicates(items) {
            out.push(Violation::new(path, format!("{} must have unique items (uniqueItems)", path)));
        }

        if let Some(item_def) = &rules.items {
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, index);
                self.validate_slot(item_def, scope, Some(item), &item_path, out);
            }
        }
    }
}

/// Validates `payload` against `schema`.
pub fn validate(schema: &Schema, payload: &Payload) -> Vec<Violation> {
    SchemaValidator::new(schema).validate(payload)
}

fn dependency_met(def: &FieldDef, scope: &Payload) -> bool {
    match &def.depends_on {
        None => true,
        Some(dep) => scope.get(&dep.field).is_some_and(|v| json_eq(v, &dep.value)),
    }
}

fn check_string(rules: &StringRules, value: &Value, path: &str, out: &mut Vec<Violation>) {
    let Some(s) = value.as_str() else {
        out.push(Violation::type_mismatch(path, "a string"));
        return;
    };

    let len = s.chars().count() as u64;
    if let Some(min) = rules.min_length {
        if len < min {
            out.push(Violation::new(
                path,
                format!("{} must be at least {} characters (minLength)", path, min),
            ));
        }
    }
    if let Some(max) = rules.max_length {
        if len > max {
            out.push(Violation::new(
                path,
                format!("{} must be at most {} characters (maxLength)", path, max),
            ));
        }
    }
    if let Some(pattern) = &rules.pattern {
        if !pattern.is_match(s) {
            out.push(Violation::new(
                path,
                format!("{} does not match the required pattern (pattern)", path),
            ));
        }
    }
    if let Some(allowed) = &rules.allowed {
        if !allowed.iter().any(|a| a == s) {
            out.push(Violation::new(
                path,
                format!("{} must be one of: {} (enum)", path, allowed.join(", ")),
            ));
        }
    }
}

fn check_number(rules: &NumberRules, value: &Value, path: &str, out: &mut Vec<Violation>) {
    let Some(n) = value.as_f64() else {
        out.push(Violation::type_mismatch(path, "a number"));
        return;
    };

    if let Some(min) = rules.min {
        if n < min {
            out.push(Violation::new(path, format!("{} must be at least {} (min)", path, min)));
        }
    }
    if let Some(max) = rules.max {
        if n > max {
            out.push(Violation::new(path, format!("{} must be at most {} (max)", path, max)));
        }
    }
    if let Some(step) = rules.step {
        if !is_multiple_of(n, step) {
            out.push(Violation::new(
                path,
                format!("{} must be a multiple of {} (step)", path, step),
            ));
        }
    }
}

/// `value / step` must be within a fixed tolerance of an integer.
fn is_multiple_of(value: f64, step: f64) -> bool {
    let quotient = value / step;
    if !quotient.is_finite() {
        return false;
    }
    (quotient - quotient.round()).abs() <= STEP_TOLERANCE
}

fn has_duplicates(items: &[Value]) -> bool {
    items
        .iter()
        .enumerate()
        .any(|(i, item)| items[i + 1..].iter().any(|other| json_eq(item, other)))
}

/// Structural equality where numbers compare by value, so `1` equals `1.0`.
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_eq(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| json_eq(v, w)))
        }
        _ => a == b,
    }
}

fn is_date(value: &Value) -> bool {
    value.as_str().and_then(parse_date).is_some()
}

/// Parses RFC 3339 date-times, naive `YYYY-MM-DDTHH:MM:SS[.fff]`
/// (taken as UTC) and plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    fn payload(value: Value) -> Payload {
        value.as_object().unwrap().clone()
    }

    fn paths(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.path.as_str()).collect()
    }

    #[test]
    fn test_valid_payload_passes() {
        let s = schema(json!({
            "name": { "type": "string", "label": "Name", "required": true },
            "age": { "type": "number", "label": "Age" },
            "married": { "type": "boolean", "label": "Married" }
        }));
        let p = payload(json!({ "name": "Asha", "age": 31, "married": false }));
        assert!(validate(&s, &p).is_empty());
    }

    #[test]
    fn test_missing_required_field_reported_once() {
        let s = schema(json!({ "name": { "type": "string", "label": "Name", "required": true } }));
        let violations = validate(&s, &payload(json!({})));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "name");
        assert_eq!(violations[0].message, "name is required");
    }

    #[test]
    fn test_null_counts_as_absent() {
        let s = schema(json!({
            "a": { "type": "string", "label": "A", "required": true },
            "b": { "type": "string", "label": "B" }
        }));
        let violations = validate(&s, &payload(json!({ "a": null, "b": null })));
        assert_eq!(paths(&violations), vec!["a"]);
    }

    #[test]
    fn test_unmet_dependency_skips_required() {
        let s = schema(json!({
            "a": { "type": "boolean", "label": "A", "required": false },
            "b": {
                "type": "string",
                "label": "B",
                "required": true,
                "dependsOn": { "field": "a", "value": true }
            }
        }));
        assert!(validate(&s, &payload(json!({}))).is_empty());
        assert!(validate(&s, &payload(json!({ "a": false }))).is_empty());

        let violations = validate(&s, &payload(json!({ "a": true })));
        assert_eq!(paths(&violations), vec!["b"]);
    }

    #[test]
    fn test_dependency_skips_type_checks_too() {
        let s = schema(json!({
            "kind": { "type": "string", "label": "Kind" },
            "rate": {
                "type": "number",
                "label": "Rate",
                "dependsOn": { "field": "kind", "value": "floating" }
            }
        }));
        let p = payload(json!({ "kind": "fixed", "rate": "not a number" }));
        assert!(validate(&s, &p).is_empty());
    }

    #[test]
    fn test_string_length_constraints() {
        let s = schema(json!({
            "code": { "type": "string", "label": "Code", "minLength": 3, "maxLength": 5 }
        }));

        let short = validate(&s, &payload(json!({ "code": "ab" })));
        assert_eq!(short.len(), 1);
        assert!(short[0].message.contains("minLength"));

        let long = validate(&s, &payload(json!({ "code": "abcdef" })));
        assert_eq!(long.len(), 1);
        assert!(long[0].message.contains("maxLength"));

        assert!(validate(&s, &payload(json!({ "code": "abcd" }))).is_empty());
    }

    #[test]
    fn test_string_length_counts_characters() {
        let s = schema(json!({ "name": { "type": "string", "label": "Name", "maxLength": 4 } }));
        assert!(validate(&s, &payload(json!({ "name": "शिव" }))).is_empty());
    }

    #[test]
    fn test_string_checks_are_independent() {
        let s = schema(json!({
            "code": {
                "type": "string",
                "label": "Code",
                "minLength": 4,
                "pattern": "^[A-Z]+$",
                "enum": ["ABCD", "WXYZ"]
            }
        }));
        let violations = validate(&s, &payload(json!({ "code": "ab" })));
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn test_type_mismatch_stops_field_checks() {
        let s = schema(json!({
            "code": { "type": "string", "label": "Code", "minLength": 4, "pattern": "^x$" }
        }));
        let violations = validate(&s, &payload(json!({ "code": 12 })));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "code must be a string");
    }

    #[test]
    fn test_number_step() {
        let s = schema(json!({ "premium": { "type": "number", "label": "Premium", "step": 5 } }));

        let violations = validate(&s, &payload(json!({ "premium": 12 })));
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("step"));

        assert!(validate(&s, &payload(json!({ "premium": 10 }))).is_empty());
        assert!(validate(&s, &payload(json!({ "premium": -15 }))).is_empty());
    }

    #[test]
    fn test_fractional_step_uses_tolerance() {
        let s = schema(json!({ "rate": { "type": "number", "label": "Rate", "step": 0.1 } }));
        assert!(validate(&s, &payload(json!({ "rate": 0.3 }))).is_empty());
        assert!(validate(&s, &payload(json!({ "rate": 1.7 }))).is_empty());
        assert_eq!(validate(&s, &payload(json!({ "rate": 0.35 }))).len(), 1);
    }

    #[test]
    fn test_number_bounds() {
        let s = schema(json!({ "age": { "type": "number", "label": "Age", "min": 18, "max": 65 } }));
        assert_eq!(validate(&s, &payload(json!({ "age": 17 }))).len(), 1);
        assert_eq!(validate(&s, &payload(json!({ "age": 66 }))).len(), 1);
        assert!(validate(&s, &payload(json!({ "age": 18 }))).is_empty());
        assert_eq!(validate(&s, &payload(json!({ "age": "18" }))).len(), 1);
    }

    #[test]
    fn test_date_formats() {
        let s = schema(json!({ "dob": { "type": "date", "label": "DOB" } }));
        assert!(validate(&s, &payload(json!({ "dob": "1990-04-12" }))).is_empty());
        assert!(validate(&s, &payload(json!({ "dob": "1990-04-12T10:30:00Z" }))).is_empty());
        assert!(validate(&s, &payload(json!({ "dob": "1990-04-12T10:30:00.250" }))).is_empty());
        assert_eq!(validate(&s, &payload(json!({ "dob": "12/04/1990" }))).len(), 1);
        assert_eq!(validate(&s, &payload(json!({ "dob": 1990 }))).len(), 1);
    }

    #[test]
    fn test_boolean_type() {
        let s = schema(json!({ "smoker": { "type": "boolean", "label": "Smoker" } }));
        assert!(validate(&s, &payload(json!({ "smoker": true }))).is_empty());
        assert_eq!(validate(&s, &payload(json!({ "smoker": "yes" }))).len(), 1);
    }

    #[test]
    fn test_array_item_enum_violation_path() {
        let s = schema(json!({
            "field": {
                "type": "array",
                "label": "Field",
                "items": { "type": "string", "label": "Item", "enum": ["x", "y"] }
            }
        }));
        let violations = validate(&s, &payload(json!({ "field": ["x", "z"] })));
        assert_eq!(paths(&violations), vec!["field[1]"]);
    }

    #[test]
    fn test_array_size_and_uniqueness() {
        let s = schema(json!({
            "tags": {
                "type": "array",
                "label": "Tags",
                "minItems": 2,
                "maxItems": 3,
                "uniqueItems": true
            }
        }));
        assert_eq!(validate(&s, &payload(json!({ "tags": ["a"] }))).len(), 1);
        assert_eq!(validate(&s, &payload(json!({ "tags": ["a", "b", "c", "d"] }))).len(), 1);
        assert_eq!(validate(&s, &payload(json!({ "tags": ["a", "a"] }))).len(), 1);
        assert_eq!(validate(&s, &payload(json!({ "tags": [{"k": 1}, {"k": 1}] }))).len(), 1);
        assert!(validate(&s, &payload(json!({ "tags": ["a", "b"] }))).is_empty());
        assert_eq!(validate(&s, &payload(json!({ "tags": "a,b" }))).len(), 1);
    }

    #[test]
    fn test_null_array_item_against_required_items() {
        let s = schema(json!({
            "ids": {
                "type": "array",
                "label": "IDs",
                "items": { "type": "number", "label": "ID", "required": true }
            }
        }));
        let violations = validate(&s, &payload(json!({ "ids": [1, null, 3] })));
        assert_eq!(paths(&violations), vec!["ids[1]"]);
        assert_eq!(violations[0].message, "ids[1] is required");
    }

    #[test]
    fn test_object_missing_required_property() {
        let s = schema(json!({
            "field": {
                "type": "object",
                "label": "Field",
                "properties": { "city": { "type": "string", "label": "City", "required": true } }
            }
        }));
        let violations = validate(&s, &payload(json!({ "field": {} })));
        assert_eq!(paths(&violations), vec!["field.city"]);
    }

    #[test]
    fn test_object_type_mismatch() {
        let s = schema(json!({ "address": { "type": "object", "label": "Address" } }));
        assert_eq!(validate(&s, &payload(json!({ "address": [1] }))).len(), 1);
        assert_eq!(validate(&s, &payload(json!({ "address": "x" }))).len(), 1);
        assert!(validate(&s, &payload(json!({ "address": { "any": 1 } }))).is_empty());
    }

    #[test]
    fn test_nested_array_of_objects() {
        let s = schema(json!({
            "nominees": {
                "type": "array",
                "label": "Nominees",
                "items": {
                    "type": "object",
                    "label": "Nominee",
                    "properties": {
                        "name": { "type": "string", "label": "Name", "required": true },
                        "share": { "type": "number", "label": "Share", "max": 100 }
                    }
                }
            }
        }));
        let p = payload(json!({
            "nominees": [
                { "name": "Ravi", "share": 50 },
                { "share": 150 }
            ]
        }));
        let mut found = paths(&validate(&s, &p)).into_iter().map(String::from).collect::<Vec<_>>();
        found.sort();
        assert_eq!(found, vec!["nominees[1].name", "nominees[1].share"]);
    }

    #[test]
    fn test_nested_dependency_uses_object_scope() {
        let s = schema(json!({
            "vehicle": {
                "type": "object",
                "label": "Vehicle",
                "properties": {
                    "financed": { "type": "boolean", "label": "Financed" },
                    "lender": {
                        "type": "string",
                        "label": "Lender",
                        "required": true,
                        "dependsOn": { "field": "financed", "value": true }
                    }
                }
            }
        }));
        assert!(validate(&s, &payload(json!({ "vehicle": { "financed": false } }))).is_empty());
        let violations = validate(&s, &payload(json!({ "vehicle": { "financed": true } })));
        assert_eq!(paths(&violations), vec!["vehicle.lender"]);
    }

    #[test]
    fn test_undeclared_payload_keys_ignored() {
        let s = schema(json!({ "a": { "type": "string", "label": "A" } }));
        assert!(validate(&s, &payload(json!({ "a": "x", "extra": 42 }))).is_empty());
    }

    #[test]
    fn test_is_multiple_of() {
        assert!(is_multiple_of(0.0, 0.25));
        assert!(is_multiple_of(1e12, 1000.0));
        assert!(!is_multiple_of(7.0, 2.0));
        assert!(is_multiple_of(0.3, 0.1));
    }

    #[test]
    fn test_step_rejects_half_step_off_large_values() {
        assert!(!is_multiple_of(1_000_000_000.5, 1.0));
        assert!(!is_multiple_of(2_000_000_000_500.0, 1000.0));

        let s = schema(json!({ "sumAssured": { "type": "number", "label": "Sum assured", "step": 1 } }));
        let violations = validate(&s, &payload(json!({ "sumAssured": 1_000_000_000.5 })));
        assert_eq!(paths(&violations), vec!["sumAssured"]);
        assert!(validate(&s, &payload(json!({ "sumAssured": 1_000_000_000u64 }))).is_empty());
    }

    #[test]
    fn test_dependency_gate_compares_numbers_by_value() {
        let s = schema(json!({
            "count": { "type": "number", "label": "Count" },
            "detail": {
                "type": "string",
                "label": "Detail",
                "required": true,
                "dependsOn": { "field": "count", "value": 1 }
            }
        }));
        let violations = validate(&s, &payload(json!({ "count": 1.0 })));
        assert_eq!(paths(&violations), vec!["detail"]);
    }

    #[test]
    fn test_unique_items_compares_numbers_by_value() {
        let s = schema(json!({
            "codes": { "type": "array", "label": "Codes", "uniqueItems": true }
        }));
        let violations = validate(&s, &payload(json!({ "codes": [1, 1.0] })));
        assert_eq!(paths(&violations), vec!["codes"]);
        assert_eq!(validate(&s, &payload(json!({ "codes": [[1, {"a": 2}], [1.0, {"a": 2.0}]] }))).len(), 1);
        assert!(validate(&s, &payload(json!({ "codes": [1, 2] }))).is_empty());
    }

    #[test]
    fn test_json_eq() {
        assert!(json_eq(&json!(1), &json!(1.0)));
        assert!(json_eq(&json!({"a": [1, "x"]}), &json!({"a": [1.0, "x"]})));
        assert!(!json_eq(&json!(1), &json!("1")));
        assert!(!json_eq(&json!([1]), &json!([1, 1])));
    }
}
