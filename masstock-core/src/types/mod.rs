mod execution;
mod workflow;

pub use execution::{
    duration_between, ExecutionFailure, ExecutionRecord, ExecutionStatus, NewExecution,
};
pub use workflow::{
    CatalogDocument, FieldSpec, FieldType, InputSchema, WorkflowConfig, WorkflowStatus,
    DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECONDS,
};
