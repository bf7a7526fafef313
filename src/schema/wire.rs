//! Wire representation of field definitions and the authoring checks
//!
//! The JSON shape is flat: every constraint for every type is an optional
//! attribute next to `type`. `compile_field` turns that shape into the typed
//! `FieldDef`, rejecting constraints that do not belong to the declared type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::types::{
    ArrayRules, DependsOn, FieldDef, FieldKind, NumberRules, ObjectRules, Pattern, Schema,
    StringRules, UiHints, MAX_SCHEMA_DEPTH,
};

/// Partial or complete schema in wire form, keyed by field name
pub type SchemaPatch = BTreeMap<String, FieldDefWire>;

/// Field definition exactly as it appears on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldDefWire {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<DependsOn>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, FieldDefWire>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldDefWire>>,
}

impl FieldDefWire {
    fn string_constraints(&self) -> [(&'static str, bool); 4] {
        [
            ("minLength", self.min_length.is_some()),
            ("maxLength", self.max_length.is_some()),
            ("pattern", self.pattern.is_some()),
            ("enum", self.allowed.is_some()),
        ]
    }

    fn number_constraints(&self) -> [(&'static str, bool); 3] {
        [
            ("min", self.min.is_some()),
            ("max", self.max.is_some()),
            ("step", self.step.is_some()),
        ]
    }

    fn array_constraints(&self) -> [(&'static str, bool); 4] {
        [
            ("minItems", self.min_items.is_some()),
            ("maxItems", self.max_items.is_some()),
            ("uniqueItems", self.unique_items.is_some()),
            ("items", self.items.is_some()),
        ]
    }

    fn object_constraints(&self) -> [(&'static str, bool); 1] {
        [("properties", self.properties.is_some())]
    }
}

/// Rejects the first present constraint from the given groups
fn forbid(path: &str, field_type: &str, groups: &[&[(&'static str, bool)]]) -> SchemaResult<()> {
    for group in groups {
        if let Some((name, _)) = group.iter().find(|(_, present)| *present) {
            return Err(SchemaError::constraint_mismatch(path, name, field_type));
        }
    }
    Ok(())
}

fn check_bounds<T: PartialOrd + std::fmt::Display>(
    path: &str,
    lower_name: &str,
    lower: Option<T>,
    upper_name: &str,
    upper: Option<T>,
) -> SchemaResult<()> {
    if let (Some(lo), Some(hi)) = (lower, upper) {
        if lo > hi {
            return Err(SchemaError::invalid_constraint(
                path,
                format!("{} ({}) exceeds {} ({})", lower_name, lo, upper_name, hi),
            ));
        }
    }
    Ok(())
}

fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

/// Compile one wire definition into a typed field definition
pub(crate) fn compile_field(wire: FieldDefWire, path: &str, depth: usize) -> SchemaResult<FieldDef> {
    if depth > MAX_SCHEMA_DEPTH {
        return Err(SchemaError::depth_exceeded(path, MAX_SCHEMA_DEPTH));
    }

    let field_type = wire
        .field_type
        .clone()
        .ok_or_else(|| SchemaError::missing_type(path))?;

    let label = match wire.label.as_deref().map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => return Err(SchemaError::missing_label(path)),
    };

    let kind = match field_type.as_str() {
        "string" => {
            forbid(
                path,
                "string",
                &[
                    &wire.number_constraints(),
                    &wire.array_constraints(),
                    &wire.object_constraints(),
                ],
            )?;
            check_bounds(path, "minLength", wire.min_length, "maxLength", wire.max_length)?;
            let pattern = match wire.pattern.as_deref() {
                Some(source) => Some(
                    Pattern::new(source).map_err(|e| SchemaError::invalid_pattern(path, e))?,
                ),
                None => None,
            };
            FieldKind::String(StringRules {
                min_length: wire.min_length,
                max_length: wire.max_length,
                pattern,
                allowed: wire.allowed.clone(),
            })
        }
        "number" => {
            forbid(
                path,
                "number",
                &[
                    &wire.string_constraints(),
                    &wire.array_constraints(),
                    &wire.object_constraints(),
                ],
            )?;
            if let Some(step) = wire.step {
                if !(step.is_finite() && step > 0.0) {
                    return Err(SchemaError::invalid_constraint(path, "step must be a positive number"));
                }
            }
            check_bounds(path, "min", wire.min, "max", wire.max)?;
            FieldKind::Number(NumberRules {
                min: wire.min,
                max: wire.max,
                step: wire.step,
            })
        }
        "date" | "boolean" => {
            forbid(
                path,
                &field_type,
                &[
                    &wire.string_constraints(),
                    &wire.number_constraints(),
                    &wire.array_constraints(),
                    &wire.object_constraints(),
                ],
            )?;
            if field_type == "date" {
                FieldKind::Date
            } else {
                FieldKind::Boolean
            }
        }
        "object" => {
            forbid(
                path,
                "object",
                &[
                    &wire.string_constraints(),
                    &wire.number_constraints(),
                    &wire.array_constraints(),
                ],
            )?;
            let properties = match wire.properties.clone() {
                Some(props) => Some(compile_schema(props, path, depth + 1)?),
                None => None,
            };
            FieldKind::Object(ObjectRules { properties })
        }
        "array" => {
            forbid(
                path,
                "array",
                &[
                    &wire.string_constraints(),
                    &wire.number_constraints(),
                    &wire.object_constraints(),
                ],
            )?;
            check_bounds(path, "minItems", wire.min_items, "maxItems", wire.max_items)?;
            let items = match wire.items.clone() {
                Some(items) => Some(Box::new(compile_field(
                    *items,
                    &format!("{}[]", path),
                    depth + 1,
                )?)),
                None => None,
            };
            FieldKind::Array(ArrayRules {
                min_items: wire.min_items,
                max_items: wire.max_items,
                unique_items: wire.unique_items,
                items,
            })
        }
        other => return Err(SchemaError::unknown_type(path, other)),
    };

    Ok(FieldDef {
        label,
        required: wire.required.unwrap_or(false),
        kind,
        depends_on: wire.depends_on,
        default: wire.default,
        ui: UiHints {
            description: wire.description,
            placeholder: wire.placeholder,
            help_text: wire.help_text,
            display_order: wire.display_order,
            hidden: wire.hidden,
        },
    })
}

/// Compile a wire schema scope; dependencies must resolve to siblings
pub(crate) fn compile_schema(wire: SchemaPatch, prefix: &str, depth: usize) -> SchemaResult<Schema> {
    let mut fields = BTreeMap::new();
    for (name, def) in wire {
        let path = make_path(prefix, &name);
        let compiled = compile_field(def, &path, depth)?;
        fields.insert(name, compiled);
    }

    for (name, def) in &fields {
        check_dependency(def, name, &fields, &make_path(prefix, name))?;
    }

    Ok(Schema::from_checked(fields))
}

/// Array item definitions resolve their gate in the array's own scope
fn check_dependency(
    def: &FieldDef,
    owner: &str,
    siblings: &BTreeMap<String, FieldDef>,
    path: &str,
) -> SchemaResult<()> {
    if let Some(dep) = &def.depends_on {
        if dep.field == owner {
            return Err(SchemaError::self_dependency(path));
        }
        if !siblings.contains_key(&dep.field) {
            return Err(SchemaError::invalid_dependency(path, &dep.field));
        }
    }
    if let FieldKind::Array(ArrayRules { items: Some(items), .. }) = &def.kind {
        check_dependency(items, owner, siblings, &format!("{}[]", path))?;
    }
    Ok(())
}

impl From<FieldDef> for FieldDefWire {
    fn from(def: FieldDef) -> Self {
        let mut wire = FieldDefWire {
            field_type: Some(def.type_name().to_string()),
            label: Some(def.label),
            description: def.ui.description,
            required: Some(def.required),
            display_order: def.ui.display_order,
            placeholder: def.ui.placeholder,
            help_text: def.ui.help_text,
            hidden: def.ui.hidden,
            default: def.default,
            depends_on: def.depends_on,
            ..FieldDefWire::default()
        };

        match def.kind {
            FieldKind::String(rules) => {
                wire.min_length = rules.min_length;
                wire.max_length = rules.max_length;
                wire.pattern = rules.pattern.map(|p| p.as_str().to_string());
                wire.allowed = rules.allowed;
            }
            FieldKind::Number(rules) => {
                wire.min = rules.min;
                wire.max = rules.max;
                wire.step = rules.step;
            }
            FieldKind::Date | FieldKind::Boolean => {}
            FieldKind::Object(rules) => {
                wire.properties = rules.properties.map(SchemaPatch::from);
            }
            FieldKind::Array(rules) => {
                wire.min_items = rules.min_items;
                wire.max_items = rules.max_items;
                wire.unique_items = rules.unique_items;
                wire.items = rules.items.map(|items| Box::new(FieldDefWire::from(*items)));
            }
        }

        wire
    }
}

impl From<Schema> for SchemaPatch {
    fn from(schema: Schema) -> Self {
        schema
            .iter()
            .map(|(name, def)| (name.clone(), FieldDefWire::from(def.clone())))
            .collect()
    }
}
