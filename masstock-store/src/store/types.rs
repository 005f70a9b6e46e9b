use chrono::{DateTime, Utc};
use masstock_core::{ExecutionRecord, ExecutionStatus};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Result of inserting an execution. `Existing` is returned when the
/// idempotency key was already used by the same client and workflow.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(ExecutionRecord),
    Existing(ExecutionRecord),
}

impl CreateOutcome {
    pub fn record(&self) -> &ExecutionRecord {
        match self {
            CreateOutcome::Created(r) | CreateOutcome::Existing(r) => r,
        }
    }

    pub fn into_record(self) -> ExecutionRecord {
        match self {
            CreateOutcome::Created(r) | CreateOutcome::Existing(r) => r,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

/// Listing filter. `status` matches the reported status, so `processing`
/// also selects pending records that are waiting on a retry.
#[derive(Debug, Clone)]
pub struct ExecutionFilter {
    pub client_id: String,
    pub workflow_id: Option<String>,
    pub status: Option<ExecutionStatus>,
    /// 1-based.
    pub page: u32,
    pub limit: u32,
}

impl ExecutionFilter {
    pub fn for_client(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            workflow_id: None,
            status: None,
            page: 1,
            limit: 20,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }

    pub fn matches(&self, r: &ExecutionRecord) -> bool {
        r.client_id == self.client_id
            && self
                .workflow_id
                .as_deref()
                .map_or(true, |w| r.workflow_id == w)
            && self.status.map_or(true, |s| r.reported_status() == s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionPage {
    /// Newest first.
    pub executions: Vec<ExecutionRecord>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimOutcome {
    /// Returned to `pending` with `retry_count` incremented.
    Requeued,
    /// Retries exhausted; moved to `failed` as `worker_lost`.
    Failed,
}

#[derive(Debug, Clone)]
pub struct Reclaimed {
    pub record: ExecutionRecord,
    pub outcome: ReclaimOutcome,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub execution_id: Uuid,
    pub event_type: String,
    pub payload: JsonValue,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, sqlx::FromRow)]
pub struct ExecutionEvent {
    pub id: i64,
    pub execution_id: Uuid,
    pub ts: DateTime<Utc>,
    pub event_type: String,
    pub payload: JsonValue,
}
