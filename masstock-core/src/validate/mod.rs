mod rules;
mod validator;

use serde_json::Value as JsonValue;

use crate::error::ValidationError;
use crate::types::{CatalogDocument, InputSchema, WorkflowConfig};
use validator::Validator;

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for CatalogDocument {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_catalog(self)
    }
}

pub fn validate_catalog(doc: &CatalogDocument) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    rules::catalog::validate_catalog(&mut v, doc);
    v.finish()
}

/// Check `input_data` against the workflow's declared input schema.
pub fn validate_input(schema: &InputSchema, input: &JsonValue) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    rules::input::validate_input(&mut v, schema, input);
    v.finish()
}

pub fn validate_workflow_input(
    workflow: &WorkflowConfig,
    input: &JsonValue,
) -> Result<(), ValidationError> {
    validate_input(&workflow.input_schema, input)
}
