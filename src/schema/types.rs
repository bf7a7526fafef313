//! Dynamic field definitions
//!
//! Supported types:
//! - string: UTF-8 string with length, pattern and enum constraints
//! - number: JSON number with min, max and step constraints
//! - date: RFC 3339 / ISO-8601 date string
//! - boolean
//! - object: nested schema of named properties
//! - array: homogeneous list described by a single item definition
//!
//! Each type carries only its own constraint set, so a definition such as
//! "string with a `min` bound" cannot be represented.

use std::collections::BTreeMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::wire::{self, FieldDefWire, SchemaPatch};

/// Maximum object/array nesting accepted in an authored schema
pub const MAX_SCHEMA_DEPTH: usize = 16;

/// Submitted values for a record's dynamic fields
pub type Payload = serde_json::Map<String, Value>;

/// Compiled regular expression for the string `pattern` constraint
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.0.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// String constraints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringRules {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<Pattern>,
    /// Allowed values (`enum` on the wire)
    pub allowed: Option<Vec<String>>,
}

/// Number constraints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberRules {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Value must be an integer multiple of `step`, measured from 0
    pub step: Option<f64>,
}

/// Array constraints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayRules {
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: Option<bool>,
    /// Shape of every element
    pub items: Option<Box<FieldDef>>,
}

/// Object constraints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectRules {
    pub properties: Option<Schema>,
}

/// Field type together with the constraints that apply to it
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String(StringRules),
    Number(NumberRules),
    Date,
    Boolean,
    Object(ObjectRules),
    Array(ArrayRules),
}

impl FieldKind {
    /// Returns the wire tag for this type
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::String(_) => "string",
            FieldKind::Number(_) => "number",
            FieldKind::Date => "date",
            FieldKind::Boolean => "boolean",
            FieldKind::Object(_) => "object",
            FieldKind::Array(_) => "array",
        }
    }
}

/// Gate: the field is only evaluated when `payload[field] == value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependsOn {
    pub field: String,
    pub value: Value,
}

/// Display-only metadata, carried through unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiHints {
    pub description: Option<String>,
    pub placeholder: Option<String>,
    pub help_text: Option<String>,
    pub display_order: Option<i64>,
    pub hidden: Option<bool>,
}

/// One schema slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FieldDefWire", into = "FieldDefWire")]
pub struct FieldDef {
    pub label: String,
    pub required: bool,
    pub kind: FieldKind,
    pub depends_on: Option<DependsOn>,
    /// Applied by record construction when the payload omits the field
    pub default: Option<Value>,
    pub ui: UiHints,
}

impl FieldDef {
    /// Create an optional field of the given kind
    pub fn new(label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            label: label.into(),
            required: false,
            kind,
            depends_on: None,
            default: None,
            ui: UiHints::default(),
        }
    }

    pub fn string(label: impl Into<String>) -> Self {
        Self::new(label, FieldKind::String(StringRules::default()))
    }

    pub fn number(label: impl Into<String>) -> Self {
        Self::new(label, FieldKind::Number(NumberRules::default()))
    }

    pub fn date(label: impl Into<String>) -> Self {
        Self::new(label, FieldKind::Date)
    }

    pub fn boolean(label: impl Into<String>) -> Self {
        Self::new(label, FieldKind::Boolean)
    }

    pub fn object(label: impl Into<String>, properties: Schema) -> Self {
        Self::new(
            label,
            FieldKind::Object(ObjectRules {
                properties: Some(properties),
            }),
        )
    }

    pub fn array(label: impl Into<String>, items: FieldDef) -> Self {
        Self::new(
            label,
            FieldKind::Array(ArrayRules {
                items: Some(Box::new(items)),
                ..ArrayRules::default()
            }),
        )
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Gate the field on a sibling's value
    pub fn depends_on(mut self, field: impl Into<String>, value: Value) -> Self {
        self.depends_on = Some(DependsOn {
            field: field.into(),
            value,
        });
        self
    }

    /// Set the default applied at record creation
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Returns the wire tag of this field's type
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

impl TryFrom<FieldDefWire> for FieldDef {
    type Error = SchemaError;

    fn try_from(wire: FieldDefWire) -> SchemaResult<Self> {
        wire::compile_field(wire, "", 0)
    }
}

/// Mapping from field name to definition.
///
/// Deserializing a `Schema` runs the authoring checks (type/constraint
/// agreement, sibling dependencies, depth), so a `Schema` value is always
/// well-formed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SchemaPatch", into = "SchemaPatch")]
pub struct Schema {
    fields: BTreeMap<String, FieldDef>,
}

impl Schema {
    /// Build a schema from definitions, running the same checks as
    /// deserialization (constraint bounds, sibling dependencies, depth)
    pub fn new(fields: BTreeMap<String, FieldDef>) -> SchemaResult<Self> {
        Schema::try_from(SchemaPatch::from(Self { fields }))
    }

    /// Build a schema from `(name, definition)` pairs
    pub fn from_fields<I, K>(fields: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = (K, FieldDef)>,
        K: Into<String>,
    {
        Self::new(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub(crate) fn from_checked(fields: BTreeMap<String, FieldDef>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldDef)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names ordered by `displayOrder` (unordered fields last, by name)
    pub fn display_order(&self) -> Vec<&str> {
        let mut names: Vec<(&str, Option<i64>)> = self
            .fields
            .iter()
            .map(|(name, def)| (name.as_str(), def.ui.display_order))
            .collect();
        names.sort_by(|a, b| match (a.1, b.1) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.0.cmp(b.0)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(b.0),
        });
        names.into_iter().map(|(name, _)| name).collect()
    }

    /// Overlay a partial schema on this one, replacing definitions by name.
    ///
    /// The merged result is checked as a whole, so a patch may reference
    /// siblings that only exist in the stored schema.
    pub fn merge(&self, patch: SchemaPatch) -> SchemaResult<Schema> {
        let mut merged: SchemaPatch = self.clone().into();
        merged.extend(patch);
        Schema::try_from(merged)
    }

    /// Fill absent top-level payload entries from field defaults
    pub fn apply_defaults(&self, payload: &mut Payload) {
        for (name, def) in &self.fields {
            if let Some(default) = &def.default {
                payload
                    .entry(name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    }
}

impl TryFrom<SchemaPatch> for Schema {
    type Error = SchemaError;

    fn try_from(wire: SchemaPatch) -> SchemaResult<Self> {
        wire::compile_schema(wire, "", 0)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        write!(f, "Schema[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn address_schema() -> Schema {
        Schema::from_fields([
            ("city", FieldDef::string("City").required()),
            ("zip", FieldDef::string("ZIP")),
        ])
        .unwrap()
    }

    #[test]
    fn test_field_type_names() {
        assert_eq!(FieldDef::string("a").type_name(), "string");
        assert_eq!(FieldDef::number("a").type_name(), "number");
        assert_eq!(FieldDef::date("a").type_name(), "date");
        assert_eq!(FieldDef::boolean("a").type_name(), "boolean");
        assert_eq!(FieldDef::object("a", Schema::default()).type_name(), "object");
        assert_eq!(FieldDef::array("a", FieldDef::string("b")).type_name(), "array");
    }

    #[test]
    fn test_builder_sets_flags() {
        let def = FieldDef::string("Caste")
            .required()
            .depends_on("hasCaste", json!(true))
            .with_default(json!("General"));

        assert!(def.required);
        assert_eq!(def.depends_on.as_ref().unwrap().field, "hasCaste");
        assert_eq!(def.default, Some(json!("General")));
    }

    #[test]
    fn test_schema_rejects_dangling_dependency() {
        let result = Schema::from_fields([(
            "caste",
            FieldDef::string("Caste").depends_on("missing", json!(true)),
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn test_nested_object_schema() {
        let schema = Schema::from_fields([("address", FieldDef::object("Address", address_schema()))]).unwrap();
        match &schema.get("address").unwrap().kind {
            FieldKind::Object(rules) => {
                assert_eq!(rules.properties.as_ref().unwrap().len(), 2);
            }
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_display_order() {
        let mut first = FieldDef::string("First");
        first.ui.display_order = Some(1);
        let mut second = FieldDef::string("Second");
        second.ui.display_order = Some(2);

        let schema = Schema::from_fields([
            ("b_second", second),
            ("a_unordered", FieldDef::string("Unordered")),
            ("c_first", first),
        ])
        .unwrap();

        assert_eq!(schema.display_order(), vec!["c_first", "b_second", "a_unordered"]);
    }

    #[test]
    fn test_merge_replaces_by_name() {
        let schema = address_schema();
        let patch: SchemaPatch = serde_json::from_value(json!({
            "zip": { "type": "string", "label": "Postal code", "pattern": "^[0-9]{6}$" },
            "country": { "type": "string", "label": "Country" }
        }))
        .unwrap();

        let merged = schema.merge(patch).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("zip").unwrap().label, "Postal code");
        assert!(merged.get("city").unwrap().required);
    }

    #[test]
    fn test_apply_defaults_keeps_existing_values() {
        let schema = Schema::from_fields([
            ("status", FieldDef::string("Status").with_default(json!("draft"))),
            ("tier", FieldDef::string("Tier").with_default(json!("basic"))),
        ])
        .unwrap();

        let mut payload = Payload::new();
        payload.insert("tier".into(), json!("gold"));
        schema.apply_defaults(&mut payload);

        assert_eq!(payload["status"], json!("draft"));
        assert_eq!(payload["tier"], json!("gold"));
    }

    #[test]
    fn test_pattern_equality_by_source() {
        assert_eq!(Pattern::new("^a+$").unwrap(), Pattern::new("^a+$").unwrap());
        assert_ne!(Pattern::new("^a+$").unwrap(), Pattern::new("^b+$").unwrap());
    }
}
