//! Schema registry: declarative field contracts derived from the typed flow
//! records, plus validation of JSON values against them.

use super::schema_utils;
use crate::error::{CivisError, ValidationError};
use schemars::{JsonSchema, schema_for};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Enum(Vec<String>),
    /// Item type plus the constraints every item must meet.
    Array(Box<FieldType>, Constraints),
    Object(Vec<FieldSpec>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub description: String,
    pub required: bool,
    pub constraints: Constraints,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaSpec {
    pub name: String,
    pub version: u32,
    pub fields: Vec<FieldSpec>,
}

impl SchemaSpec {
    /// Builds the spec for `T` from its `schemars` schema.
    pub fn derive<T: JsonSchema>(name: &str, version: u32) -> Result<Self, CivisError> {
        let cleaned = schema_utils::clean_schema(schema_for!(T))?;
        let fields = parse_object_fields(&cleaned, name)?;
        Ok(Self { name: name.to_string(), version, fields })
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Gemini-compatible schema for `responseSchema` and tool `parameters`.
    /// Only keys the API accepts are emitted.
    pub fn to_api_schema(&self) -> Value {
        object_api_schema(&self.fields)
    }

    /// Plain-text field listing appended to prompts for schema-guided generation.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        describe_fields(&self.fields, 0, &mut out);
        out
    }
}

fn parse_object_fields(node: &Value, context: &str) -> Result<Vec<FieldSpec>, CivisError> {
    let props = node
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| CivisError::Config(format!("schema '{context}' has no properties")))?;
    let required: Vec<&str> = node
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    props
        .iter()
        .map(|(name, prop)| {
            Ok(FieldSpec {
                name: name.clone(),
                field_type: parse_type(prop, name)?,
                description: prop.get("description").and_then(Value::as_str).unwrap_or_default().to_string(),
                required: required.contains(&name.as_str()),
                constraints: parse_constraints(prop),
            })
        })
        .collect()
}

fn parse_type(node: &Value, context: &str) -> Result<FieldType, CivisError> {
    if let Some(values) = node.get("enum").and_then(Value::as_array) {
        return Ok(FieldType::Enum(values.iter().filter_map(Value::as_str).map(String::from).collect()));
    }
    match node.get("type").and_then(Value::as_str) {
        Some("string") => Ok(FieldType::String),
        Some("integer") => Ok(FieldType::Integer),
        Some("number") => Ok(FieldType::Number),
        Some("boolean") => Ok(FieldType::Boolean),
        Some("array") => {
            let items = node
                .get("items")
                .ok_or_else(|| CivisError::Config(format!("array '{context}' has no items schema")))?;
            Ok(FieldType::Array(Box::new(parse_type(items, context)?), parse_constraints(items)))
        }
        Some("object") => Ok(FieldType::Object(parse_object_fields(node, context)?)),
        other => Err(CivisError::Config(format!("unsupported schema type {other:?} for '{context}'"))),
    }
}

fn parse_constraints(node: &Value) -> Constraints {
    let usize_of = |key: &str| node.get(key).and_then(Value::as_f64).map(|n| n as usize);
    Constraints {
        min_length: usize_of("minLength"),
        max_length: usize_of("maxLength"),
        minimum: node.get("minimum").and_then(Value::as_f64),
        maximum: node.get("maximum").and_then(Value::as_f64),
        min_items: usize_of("minItems"),
        max_items: usize_of("maxItems"),
    }
}

fn object_api_schema(fields: &[FieldSpec]) -> Value {
    let mut props = Map::new();
    for f in fields {
        let mut node = type_api_schema(&f.field_type);
        if let Value::Object(map) = &mut node {
            if !f.description.is_empty() {
                map.insert("description".into(), json!(f.description));
            }
            insert_constraints(map, &f.constraints);
        }
        props.insert(f.name.clone(), node);
    }
    let required: Vec<&str> = fields.iter().filter(|f| f.required).map(|f| f.name.as_str()).collect();
    let ordering: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    json!({
        "type": "object",
        "properties": props,
        "required": required,
        "propertyOrdering": ordering,
    })
}

/// Gemini accepts numeric bounds and item counts; string lengths are
/// enforced locally only.
fn insert_constraints(map: &mut Map<String, Value>, c: &Constraints) {
    if let Some(n) = c.minimum {
        map.insert("minimum".into(), json!(n));
    }
    if let Some(n) = c.maximum {
        map.insert("maximum".into(), json!(n));
    }
    if let Some(n) = c.min_items {
        map.insert("minItems".into(), json!(n));
    }
    if let Some(n) = c.max_items {
        map.insert("maxItems".into(), json!(n));
    }
}

fn type_api_schema(t: &FieldType) -> Value {
    match t {
        FieldType::String => json!({ "type": "string" }),
        FieldType::Integer => json!({ "type": "integer" }),
        FieldType::Number => json!({ "type": "number" }),
        FieldType::Boolean => json!({ "type": "boolean" }),
        FieldType::Enum(values) => json!({ "type": "string", "enum": values }),
        FieldType::Array(items, item_constraints) => {
            let mut item = type_api_schema(items);
            if let Value::Object(map) = &mut item {
                insert_constraints(map, item_constraints);
            }
            json!({ "type": "array", "items": item })
        }
        FieldType::Object(fields) => object_api_schema(fields),
    }
}

fn describe_fields(fields: &[FieldSpec], depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for f in fields {
        out.push_str(&format!("{indent}- {} ({}): {}\n", f.name, type_label(&f.field_type), f.description));
        let nested = match &f.field_type {
            FieldType::Object(inner) => Some(inner),
            FieldType::Array(items, _) => match items.as_ref() {
                FieldType::Object(inner) => Some(inner),
                _ => None,
            },
            _ => None,
        };
        if let Some(inner) = nested {
            describe_fields(inner, depth + 1, out);
        }
    }
}

fn type_label(t: &FieldType) -> String {
    match t {
        FieldType::String => "string".into(),
        FieldType::Integer => "integer".into(),
        FieldType::Number => "number".into(),
        FieldType::Boolean => "boolean".into(),
        FieldType::Enum(values) => format!("one of {}", values.join(" | ")),
        FieldType::Array(items, _) => format!("array of {}", type_label(items)),
        FieldType::Object(_) => "object".into(),
    }
}

/// Checks `value` against `schema`, reporting the first violation found.
pub fn validate(value: &Value, schema: &SchemaSpec) -> Result<(), ValidationError> {
    validate_object(value, &schema.fields, "")
}

fn validate_object(value: &Value, fields: &[FieldSpec], path: &str) -> Result<(), ValidationError> {
    let obj = value.as_object().ok_or_else(|| {
        let field = if path.is_empty() { "$" } else { path };
        ValidationError::new(field, "type object", summarize_value(value))
    })?;

    for f in fields {
        let field_path = join_path(path, &f.name);
        match obj.get(&f.name) {
            None | Some(Value::Null) if f.required => {
                return Err(ValidationError::new(field_path, "required", "missing"));
            }
            None | Some(Value::Null) => {}
            Some(v) => validate_field(v, &f.field_type, &f.constraints, &field_path)?,
        }
    }
    Ok(())
}

fn validate_field(value: &Value, t: &FieldType, c: &Constraints, path: &str) -> Result<(), ValidationError> {
    let mismatch = |expected: &str| ValidationError::new(path, format!("type {expected}"), summarize_value(value));

    match t {
        FieldType::String => {
            let s = value.as_str().ok_or_else(|| mismatch("string"))?;
            let len = s.trim().chars().count();
            if let Some(min) = c.min_length {
                if len < min {
                    return Err(ValidationError::new(path, format!("minLength {min}"), format!("length {len}")));
                }
            }
            if let Some(max) = c.max_length {
                if len > max {
                    return Err(ValidationError::new(path, format!("maxLength {max}"), format!("length {len}")));
                }
            }
        }
        FieldType::Integer | FieldType::Number => {
            let n = value.as_f64().ok_or_else(|| mismatch("number"))?;
            if matches!(t, FieldType::Integer) && n.fract() != 0.0 {
                return Err(mismatch("integer"));
            }
            if let Some(min) = c.minimum {
                if n < min {
                    return Err(ValidationError::new(path, format!("minimum {min}"), n.to_string()));
                }
            }
            if let Some(max) = c.maximum {
                if n > max {
                    return Err(ValidationError::new(path, format!("maximum {max}"), n.to_string()));
                }
            }
        }
        FieldType::Boolean => {
            value.as_bool().ok_or_else(|| mismatch("boolean"))?;
        }
        FieldType::Enum(allowed) => {
            let s = value.as_str().ok_or_else(|| mismatch("string"))?;
            if !allowed.iter().any(|a| a == s) {
                return Err(ValidationError::new(path, format!("one of [{}]", allowed.join(", ")), s));
            }
        }
        FieldType::Array(items, item_constraints) => {
            let arr = value.as_array().ok_or_else(|| mismatch("array"))?;
            if let Some(min) = c.min_items {
                if arr.len() < min {
                    return Err(ValidationError::new(path, format!("minItems {min}"), format!("{} items", arr.len())));
                }
            }
            if let Some(max) = c.max_items {
                if arr.len() > max {
                    return Err(ValidationError::new(path, format!("maxItems {max}"), format!("{} items", arr.len())));
                }
            }
            for (i, item) in arr.iter().enumerate() {
                let item_path = format!("{path}[{i}]");
                validate_field(item, items, item_constraints, &item_path)?;
            }
        }
        FieldType::Object(fields) => validate_object(value, fields, path)?,
    }
    Ok(())
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() { name.to_string() } else { format!("{parent}.{name}") }
}

fn summarize_value(value: &Value) -> String {
    let s = value.to_string();
    if s.chars().count() > 80 {
        format!("{}...", s.chars().take(80).collect::<String>())
    } else {
        s
    }
}
