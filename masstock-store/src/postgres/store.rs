use std::time::Duration;

use chrono::{DateTime, Utc};
use masstock_core::{ExecutionFailure, ExecutionRecord, NewExecution};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{
    CreateOutcome, ExecutionEvent, ExecutionFilter, ExecutionPage, ExecutionStore, JobMessage,
    JobQueue, NewEvent, QueueError, ReceivedJob, Reclaimed, StoreError,
};

use super::events;
use super::executions;
use super::jobs;

/// Postgres-backed execution store. The same pool also backs the job queue
/// (`execution_jobs`), so one value serves both seams.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl ExecutionStore for PostgresStore {
    async fn create_execution(&self, new: NewExecution) -> Result<CreateOutcome, StoreError> {
        executions::create_execution(&self.pool, new).await
    }

    async fn get_execution(&self, id: Uuid) -> Result<Option<ExecutionRecord>, StoreError> {
        executions::get_execution(&self.pool, id).await
    }

    async fn list_executions(&self, filter: ExecutionFilter) -> Result<ExecutionPage, StoreError> {
        executions::list_executions(&self.pool, filter).await
    }

    async fn claim_execution(&self, id: Uuid, attempt: i32) -> Result<Option<ExecutionRecord>, StoreError> {
        executions::claim_execution(&self.pool, id, attempt).await
    }

    async fn complete_execution(&self, id: Uuid, output: JsonValue) -> Result<Option<ExecutionRecord>, StoreError> {
        executions::complete_execution(&self.pool, id, output).await
    }

    async fn fail_execution(&self, id: Uuid, failure: ExecutionFailure) -> Result<Option<ExecutionRecord>, StoreError> {
        executions::fail_execution(&self.pool, id, failure).await
    }

    async fn schedule_retry(&self, id: Uuid, expected_retry_count: i32) -> Result<Option<ExecutionRecord>, StoreError> {
        executions::schedule_retry(&self.pool, id, expected_retry_count).await
    }

    async fn abort_execution(&self, id: Uuid, failure: ExecutionFailure) -> Result<Option<ExecutionRecord>, StoreError> {
        executions::abort_execution(&self.pool, id, failure).await
    }

    async fn reclaim_stale(&self, now: DateTime<Utc>, grace: Duration, limit: i64) -> Result<Vec<Reclaimed>, StoreError> {
        executions::reclaim_stale(&self.pool, now, grace, limit).await
    }

    async fn append_event(&self, event: NewEvent) -> Result<(), StoreError> {
        events::append_event(&self.pool, event).await
    }

    async fn get_events_after(&self, execution_id: Uuid, after_id: i64, limit: i64) -> Result<Vec<ExecutionEvent>, StoreError> {
        events::get_events_after(&self.pool, execution_id, after_id, limit).await
    }
}

#[async_trait::async_trait]
impl JobQueue for PostgresStore {
    async fn publish(&self, job: JobMessage, delay: Duration) -> Result<(), QueueError> {
        jobs::publish(&self.pool, job, delay).await
    }

    async fn receive(&self, lease: Duration) -> Result<Option<ReceivedJob>, QueueError> {
        jobs::receive(&self.pool, lease).await
    }

    async fn ack(&self, receipt: i64) -> Result<(), QueueError> {
        jobs::ack(&self.pool, receipt).await
    }
}
