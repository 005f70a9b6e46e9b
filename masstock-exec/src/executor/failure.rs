use masstock_core::ExecutionFailure;

use crate::generator::GenerationError;
use crate::retry::RetryReason;

/// Failure recorded when an attempt ends the execution. `message` is shown
/// to the end user; `detail` carries the error chain for operators.
pub fn failure_for(error: &GenerationError, reason: RetryReason, retry_count: i32) -> ExecutionFailure {
    let message = match error {
        GenerationError::Timeout(_) => "Execution timed out",
        GenerationError::Transient { .. } => "Generation service unavailable, please try again later",
        GenerationError::Permanent { .. } => "Generation failed",
    };
    let detail = match reason {
        RetryReason::AttemptsExhausted => {
            format!("{error} (retries exhausted after {retry_count})")
        }
        _ => error.to_string(),
    };
    ExecutionFailure::new(message, Some(detail))
}

pub fn workflow_missing(workflow_id: &str) -> ExecutionFailure {
    ExecutionFailure::new(
        "Workflow is no longer available",
        Some(format!("workflow {workflow_id} not found in catalog at processing time")),
    )
}
