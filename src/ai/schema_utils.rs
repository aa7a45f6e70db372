use super::schema::{FieldSpec, FieldType, SchemaSpec};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Inlines `$ref`s and strips metadata from a `schemars` root schema so the
/// result is a single self-contained tree.
pub fn clean_schema<T: Serialize>(root: T) -> serde_json::Result<Value> {
    let mut root_val = serde_json::to_value(root)?;

    let definitions = root_val
        .get("definitions")
        .cloned()
        .or_else(|| root_val.get("$defs").cloned())
        .unwrap_or(json!({}))
        .as_object()
        .cloned()
        .unwrap_or_default();

    process_schema_node(&mut root_val, &definitions);

    if let Value::Object(ref mut map) = root_val {
        map.remove("$schema");
        map.remove("title");
        map.remove("definitions");
        map.remove("$defs");
        map.remove("$id");
    }

    Ok(root_val)
}

fn process_schema_node(node: &mut Value, definitions: &Map<String, Value>) {
    // schemars wraps a described `$ref` as `{ description, allOf: [{ $ref }] }`.
    // Fold a single-element allOf into its parent before resolving.
    if let Value::Object(map) = node {
        let single = match map.get("allOf") {
            Some(Value::Array(arr)) if arr.len() == 1 => Some(arr[0].clone()),
            _ => None,
        };
        if let Some(Value::Object(inner)) = single {
            map.remove("allOf");
            for (k, v) in inner {
                map.entry(k).or_insert(v);
            }
        }
    }

    let mut resolve_attempts = 0;
    loop {
        let ref_target = if let Value::Object(map) = node {
            map.get("$ref").and_then(|v| v.as_str()).map(|s| s.to_string())
        } else {
            None
        };

        let Some(def_name_full) = ref_target else { break };
        resolve_attempts += 1;
        if resolve_attempts > 10 {
            break;
        }

        let def_name = def_name_full.split('/').next_back().unwrap_or_default();
        match (definitions.get(def_name), &mut *node) {
            (Some(Value::Object(def)), Value::Object(map)) => {
                map.remove("$ref");
                // Keys on the referencing node (e.g. its description) win.
                for (k, v) in def {
                    map.entry(k.clone()).or_insert_with(|| v.clone());
                }
            }
            _ => {
                *node = json!({ "type": "object", "description": "Unresolvable reference" });
                break;
            }
        }
    }

    if let Value::Object(map) = node {
        for key in ["$ref", "additionalProperties", "$schema", "$id", "title", "default", "examples", "format"] {
            map.remove(key);
        }

        if let Some(Value::Object(props)) = map.get_mut("properties") {
            for val in props.values_mut() {
                process_schema_node(val, definitions);
            }
        }

        if let Some(val) = map.get_mut("items") {
            process_schema_node(val, definitions);
        }
    }
}

/// Best-effort structural repair of model output before validation.
///
/// Only lossless rewrites are applied: integral floats become integers,
/// numeric strings become numbers, JSON-encoded strings are decoded where an
/// array or object is expected, and enum values are matched
/// case-insensitively. Out-of-range values are left as they are.
pub fn coerce(value: Value, schema: &SchemaSpec) -> Value {
    coerce_object(value, &schema.fields)
}

fn coerce_object(value: Value, fields: &[FieldSpec]) -> Value {
    let value = decode_embedded_json(value);
    match value {
        Value::Object(mut map) => {
            for f in fields {
                if let Some(v) = map.remove(&f.name) {
                    map.insert(f.name.clone(), coerce_field(v, &f.field_type));
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

fn coerce_field(value: Value, t: &FieldType) -> Value {
    let repaired = match (t, &value) {
        (FieldType::Integer, Value::Number(n)) if n.as_i64().is_none() && n.as_u64().is_none() => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
            .map(|f| json!(f as i64)),
        (FieldType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(|i| json!(i)),
        (FieldType::Number, Value::String(s)) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| json!(f)),
        (FieldType::Enum(allowed), Value::String(s)) => allowed
            .iter()
            .find(|a| a.eq_ignore_ascii_case(s.trim()))
            .map(|a| Value::String(a.clone())),
        _ => None,
    };
    if let Some(v) = repaired {
        return v;
    }

    match t {
        FieldType::Array(items, _) => match decode_embedded_json(value) {
            Value::Array(arr) => Value::Array(arr.into_iter().map(|v| coerce_field(v, items)).collect()),
            other => other,
        },
        FieldType::Object(fields) => coerce_object(value, fields),
        _ => value,
    }
}

/// Models sometimes return a nested structure as a JSON string; decode it
/// when it parses as an array or object.
fn decode_embedded_json(value: Value) -> Value {
    if let Value::String(ref s) = value {
        let trimmed = strip_code_fence(s);
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            if let Ok(parsed @ (Value::Array(_) | Value::Object(_))) = serde_json::from_str::<Value>(trimmed) {
                return parsed;
            }
        }
    }
    value
}

/// Strips a surrounding markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let start = trimmed.find("```json").map(|i| i + 7).or_else(|| trimmed.starts_with("```").then_some(3));
    match start {
        Some(start) => {
            let rest = &trimmed[start..];
            let end = rest.rfind("```").unwrap_or(rest.len());
            rest[..end].trim()
        }
        None => trimmed,
    }
}
