use regex::Regex;
use serde_json::Value as JsonValue;

use crate::types::{FieldSpec, FieldType, InputSchema};
use crate::validate::validator::Validator;

const ROOT: &str = "input_data";

pub(crate) fn validate_input(v: &mut Validator, schema: &InputSchema, input: &JsonValue) {
    let obj = match input {
        JsonValue::Object(map) => map,
        JsonValue::Null if schema.fields.iter().all(|f| !f.required) => return,
        _ => {
            v.push(ROOT, "must be an object");
            return;
        }
    };

    for field in &schema.fields {
        let path = format!("{ROOT}.{}", field.name);
        match obj.get(&field.name) {
            None | Some(JsonValue::Null) => {
                if field.required {
                    v.push(path, "is required");
                }
            }
            Some(value) => validate_field(v, &path, field, value),
        }
    }

    if !schema.allow_unknown {
        for key in obj.keys() {
            if !schema.fields.iter().any(|f| &f.name == key) {
                v.push(format!("{ROOT}.{key}"), "unknown field");
            }
        }
    }
}

fn validate_field(v: &mut Validator, path: &str, field: &FieldSpec, value: &JsonValue) {
    if !field.field_type.matches(value) {
        v.push(
            path,
            format!("must be of type {}", field.field_type.as_str()),
        );
        return;
    }

    let len = match value {
        JsonValue::String(s) => Some(s.chars().count()),
        JsonValue::Array(items) => Some(items.len()),
        _ => None,
    };
    if let Some(len) = len {
        if let Some(min) = field.min_length {
            if len < min {
                v.push(path, format!("must have length >= {min}"));
            }
        }
        if let Some(max) = field.max_length {
            if len > max {
                v.push(path, format!("must have length <= {max}"));
            }
        }
    }

    if let (Some(pattern), JsonValue::String(s)) = (&field.pattern, value) {
        match Regex::new(pattern) {
            Ok(re) => {
                if !re.is_match(s) {
                    v.push(path, format!("must match pattern {pattern}"));
                }
            }
            Err(_) => v.push(path, "workflow declares an invalid pattern"),
        }
    }

    if let Some(allowed) = &field.allowed {
        if !allowed.contains(value) {
            v.push(path, "must be one of the allowed values");
        }
    }

    if field.field_type == FieldType::Number {
        if let Some(n) = value.as_f64() {
            if !n.is_finite() {
                v.push(path, "must be a finite number");
            }
        }
    }
}
