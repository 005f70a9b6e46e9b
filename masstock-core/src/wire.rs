//! JSON bodies exchanged between the REST API and its clients.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Violation;
use crate::types::{ExecutionRecord, ExecutionStatus, DEFAULT_TIMEOUT_SECONDS};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub input_data: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExecuteResponse {
    pub execution_id: Uuid,
    pub status: ExecutionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExecutionErrorView {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExecutionView {
    pub execution_id: Uuid,
    pub workflow_id: String,
    pub status: ExecutionStatus,
    pub retry_count: i32,
    /// Per-attempt timeout fixed at creation; bounds how long a poller waits.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_data: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ExecutionErrorView>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl ExecutionView {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

fn default_timeout_seconds() -> i32 {
    DEFAULT_TIMEOUT_SECONDS
}

impl From<&ExecutionRecord> for ExecutionView {
    fn from(r: &ExecutionRecord) -> Self {
        let status = r.reported_status();
        Self {
            execution_id: r.id,
            workflow_id: r.workflow_id.clone(),
            status,
            retry_count: r.retry_count,
            timeout_seconds: r.timeout_seconds,
            output_data: match status {
                ExecutionStatus::Completed => r.output_data.clone(),
                _ => None,
            },
            error: match status {
                ExecutionStatus::Failed => r.failure().map(|f| ExecutionErrorView {
                    message: f.message,
                    detail: f.detail,
                }),
                _ => None,
            },
            created_at: r.created_at,
            started_at: r.started_at,
            completed_at: r.completed_at,
            duration_seconds: r.duration_seconds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExecutionList {
    pub executions: Vec<ExecutionView>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
}
