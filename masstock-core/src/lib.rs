#![forbid(unsafe_code)]

pub mod error;
pub mod parser;
pub mod state;
pub mod types;
pub mod validate;
pub mod wire;

pub use crate::error::{
    CatalogError, ParseError, TransitionError, UnknownStatus, ValidationError, Violation,
};
pub use crate::parser::{load_catalog_str, parse_catalog_str, DocumentFormat, ParsedCatalog};
pub use crate::state::{can_transition, Transition};
pub use crate::types::{
    CatalogDocument, ExecutionFailure, ExecutionRecord, ExecutionStatus, NewExecution,
    WorkflowConfig, WorkflowStatus,
};
pub use crate::validate::{validate_catalog, validate_input, validate_workflow_input, Validate};
