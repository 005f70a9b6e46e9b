use async_trait::async_trait;
use chrono::{DateTime, Utc};
use masstock_core::{ExecutionFailure, ExecutionRecord, NewExecution, UnknownStatus};
use serde_json::Value as JsonValue;
use std::time::Duration;
use uuid::Uuid;

use crate::store::types::*;

/// Durable home of execution records. Every mutation is a compare-and-set
/// on `status`: it returns `Ok(None)` when the record is not in a state the
/// transition applies to, and callers treat that as a no-op.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Insert a new `pending` record with `retry_count = 0`.
    async fn create_execution(&self, new: NewExecution) -> Result<CreateOutcome, StoreError>;

    async fn get_execution(&self, id: Uuid) -> Result<Option<ExecutionRecord>, StoreError>;

    async fn list_executions(&self, filter: ExecutionFilter) -> Result<ExecutionPage, StoreError>;

    /// `pending -> processing`, only if `retry_count == attempt`.
    async fn claim_execution(
        &self,
        id: Uuid,
        attempt: i32,
    ) -> Result<Option<ExecutionRecord>, StoreError>;

    /// `processing -> completed`.
    async fn complete_execution(
        &self,
        id: Uuid,
        output: JsonValue,
    ) -> Result<Option<ExecutionRecord>, StoreError>;

    /// `processing -> failed`.
    async fn fail_execution(
        &self,
        id: Uuid,
        failure: ExecutionFailure,
    ) -> Result<Option<ExecutionRecord>, StoreError>;

    /// `processing -> pending` with `retry_count + 1`, only if the record is
    /// still at `expected_retry_count` and below its `max_retries`.
    async fn schedule_retry(
        &self,
        id: Uuid,
        expected_retry_count: i32,
    ) -> Result<Option<ExecutionRecord>, StoreError>;

    /// `pending | processing -> failed`. Used for user cancellation and for
    /// records whose job could not be queued.
    async fn abort_execution(
        &self,
        id: Uuid,
        failure: ExecutionFailure,
    ) -> Result<Option<ExecutionRecord>, StoreError>;

    /// Reclaim `processing` records with `claimed_at + timeout_seconds +
    /// grace <= now`.
    async fn reclaim_stale(
        &self,
        now: DateTime<Utc>,
        grace: Duration,
        limit: i64,
    ) -> Result<Vec<Reclaimed>, StoreError>;

    async fn append_event(&self, event: NewEvent) -> Result<(), StoreError>;

    async fn get_events_after(
        &self,
        execution_id: Uuid,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<ExecutionEvent>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("corrupt execution row: {0}")]
    Corrupt(String),
    #[error("store error: {0}")]
    Other(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Other(e.to_string())
    }
}

impl From<UnknownStatus> for StoreError {
    fn from(e: UnknownStatus) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}
