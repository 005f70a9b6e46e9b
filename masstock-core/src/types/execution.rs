use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::UnknownStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Pending => "pending",
            ExecutionStatus::Processing => "processing",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExecutionStatus::Pending),
            "processing" => Ok(ExecutionStatus::Processing),
            "completed" => Ok(ExecutionStatus::Completed),
            "failed" => Ok(ExecutionStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Error information written into a record when it reaches `failed`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExecutionFailure {
    /// Shown to the end user.
    pub message: String,
    /// Operator-facing detail (error chain, `cancelled`, `worker_lost`, ...).
    pub detail: Option<String>,
}

impl ExecutionFailure {
    pub const CANCELLED: &'static str = "cancelled";
    pub const WORKER_LOST: &'static str = "worker_lost";
    pub const ENQUEUE_FAILED: &'static str = "enqueue_failed";

    pub fn new(message: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            message: message.into(),
            detail,
        }
    }

    pub fn cancelled() -> Self {
        Self::new("Execution cancelled", Some(Self::CANCELLED.to_string()))
    }

    pub fn worker_lost() -> Self {
        Self::new(
            "Execution timed out",
            Some(Self::WORKER_LOST.to_string()),
        )
    }

    pub fn enqueue_failed(reason: &str) -> Self {
        Self::new(
            "Execution could not be queued",
            Some(format!("{}: {reason}", Self::ENQUEUE_FAILED)),
        )
    }
}

#[derive(Debug, Clone)]
pub struct NewExecution {
    pub workflow_id: String,
    pub client_id: String,
    pub input_data: JsonValue,
    pub max_retries: i32,
    pub timeout_seconds: i32,
    pub idempotency_key: Option<String>,
}

/// One workflow run. Created `pending` by the dispatcher; mutated only by
/// workers (and user cancellation) through compare-and-set transitions.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub workflow_id: String,
    pub client_id: String,
    pub status: ExecutionStatus,
    pub input_data: JsonValue,
    pub output_data: Option<JsonValue>,
    pub error_message: Option<String>,
    pub error_detail: Option<String>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub timeout_seconds: i32,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
}

impl ExecutionRecord {
    /// Status as exposed to pollers. A `pending` record that already used a
    /// retry is still in flight, so it reports `processing`.
    pub fn reported_status(&self) -> ExecutionStatus {
        if self.status == ExecutionStatus::Pending && self.retry_count > 0 {
            ExecutionStatus::Processing
        } else {
            self.status
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn failure(&self) -> Option<ExecutionFailure> {
        self.error_message
            .as_ref()
            .map(|m| ExecutionFailure::new(m.clone(), self.error_detail.clone()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == ExecutionStatus::Failed
            && self.error_detail.as_deref() == Some(ExecutionFailure::CANCELLED)
    }
}

/// Seconds between the first start (or creation, if never started) and
/// the terminal transition.
pub fn duration_between(
    started_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
) -> f64 {
    let from = started_at.unwrap_or(created_at);
    let millis = (completed_at - from).num_milliseconds().max(0);
    millis as f64 / 1000.0
}
