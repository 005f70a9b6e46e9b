use std::collections::HashSet;

use regex::Regex;

use crate::types::{CatalogDocument, FieldType, InputSchema, WorkflowConfig};
use crate::validate::validator::Validator;

pub(crate) fn validate_catalog(v: &mut Validator, doc: &CatalogDocument) {
    let mut ids = HashSet::<&str>::new();
    for (idx, wf) in doc.workflows.iter().enumerate() {
        let path = format!("workflows[{idx}]");
        if !ids.insert(wf.id.as_str()) {
            v.push(format!("{path}.id"), "must be unique within the catalog");
        }
        validate_workflow(v, wf, &path);
    }
}

fn validate_workflow(v: &mut Validator, wf: &WorkflowConfig, path: &str) {
    v.validate_id(&format!("{path}.id"), &wf.id);

    if wf.client_id.trim().is_empty() {
        v.push(format!("{path}.client_id"), "must not be empty");
    }
    if wf.timeout_seconds <= 0 {
        v.push(format!("{path}.timeout_seconds"), "must be greater than 0");
    }
    if wf.max_retries < 0 {
        v.push(format!("{path}.retry_count"), "must be >= 0");
    }
    if let Some(endpoint) = &wf.endpoint {
        match url::Url::parse(endpoint) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            Ok(_) => v.push(format!("{path}.endpoint"), "must be an http(s) URL"),
            Err(e) => v.push(format!("{path}.endpoint"), format!("invalid URL: {e}")),
        }
    }

    validate_schema(v, &wf.input_schema, &format!("{path}.input_schema"));
}

fn validate_schema(v: &mut Validator, schema: &InputSchema, path: &str) {
    let mut names = HashSet::<&str>::new();
    for (idx, field) in schema.fields.iter().enumerate() {
        let fpath = format!("{path}.fields[{idx}]");
        if field.name.is_empty() {
            v.push(format!("{fpath}.name"), "must not be empty");
        } else if !names.insert(field.name.as_str()) {
            v.push(format!("{fpath}.name"), "must be unique within the schema");
        }

        if let Some(pattern) = &field.pattern {
            if field.field_type != FieldType::String {
                v.push(format!("{fpath}.pattern"), "only applies to string fields");
            }
            if let Err(e) = Regex::new(pattern) {
                v.push(format!("{fpath}.pattern"), format!("invalid regex: {e}"));
            }
        }

        if field.min_length.is_some() || field.max_length.is_some() {
            if !matches!(field.field_type, FieldType::String | FieldType::Array) {
                v.push(
                    fpath.clone(),
                    "min_length/max_length only apply to string or array fields",
                );
            }
            if let (Some(min), Some(max)) = (field.min_length, field.max_length) {
                if min > max {
                    v.push(format!("{fpath}.min_length"), "must be <= max_length");
                }
            }
        }

        if let Some(allowed) = &field.allowed {
            if allowed.is_empty() {
                v.push(format!("{fpath}.enum"), "must have at least one entry");
            }
            for (i, value) in allowed.iter().enumerate() {
                if !field.field_type.matches(value) {
                    v.push(
                        format!("{fpath}.enum[{i}]"),
                        format!("must be of type {}", field.field_type.as_str()),
                    );
                }
            }
        }
    }
}
