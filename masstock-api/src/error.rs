use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use masstock_core::wire::ErrorBody;
use masstock_core::Violation;
use masstock_exec::DispatchError;

/// Error returned by handlers. Rendered as `{error, code, violations?}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut violations: Vec<Violation> = Vec::new();
        let (status, code, message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::Dispatch(err) => match err {
                DispatchError::Validation(v) => {
                    violations = v.violations;
                    (
                        StatusCode::BAD_REQUEST,
                        "VALIDATION_ERROR",
                        "Input data failed validation".to_string(),
                    )
                }
                DispatchError::WorkflowNotAvailable {
                    workflow_id,
                    status,
                } => (
                    StatusCode::CONFLICT,
                    "WORKFLOW_NOT_AVAILABLE",
                    format!("Workflow {workflow_id} is {status} and cannot be executed"),
                ),
                DispatchError::WorkflowNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Workflow {id} not found"),
                ),
                DispatchError::ExecutionNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("Execution {id} not found"),
                ),
                DispatchError::Conflict {
                    execution_id,
                    status,
                } => (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Execution {execution_id} is already {status}"),
                ),
                other @ (DispatchError::Store(_) | DispatchError::Queue(_)) => {
                    tracing::error!(error = %other, "request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },
        };

        let body = ErrorBody {
            error: message,
            code: code.to_string(),
            violations,
        };
        (status, Json(body)).into_response()
    }
}
