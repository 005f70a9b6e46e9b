use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use masstock_core::types::duration_between;
use masstock_core::{ExecutionFailure, ExecutionRecord, ExecutionStatus, NewExecution, Transition};
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::store::{
    CreateOutcome, ExecutionEvent, ExecutionFilter, ExecutionPage, ExecutionStore, NewEvent,
    ReclaimOutcome, Reclaimed, StoreError,
};

#[derive(Default)]
struct Inner {
    executions: HashMap<Uuid, ExecutionRecord>,
    /// Insertion order, oldest first.
    order: Vec<Uuid>,
    events: Vec<ExecutionEvent>,
}

/// Execution store held in memory. Every transition runs under one lock,
/// which gives the same compare-and-set guarantees as the Postgres store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `transition` to the record if it is in a source state and
    /// `guard` holds; `apply` fills in the transition's fields.
    async fn transition(
        &self,
        id: Uuid,
        transition: Transition,
        guard: impl FnOnce(&ExecutionRecord) -> bool + Send,
        apply: impl FnOnce(&mut ExecutionRecord, DateTime<Utc>) + Send,
    ) -> Result<Option<ExecutionRecord>, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(record) = inner.executions.get_mut(&id) else {
            return Ok(None);
        };
        if !transition.applies_to(record.status) || !guard(record) {
            return Ok(None);
        }
        let now = Utc::now();
        record.status = transition.target();
        record.updated_at = now;
        apply(record, now);
        Ok(Some(record.clone()))
    }
}

fn finish(record: &mut ExecutionRecord, now: DateTime<Utc>) {
    record.completed_at = Some(now);
    record.duration_seconds = Some(duration_between(record.started_at, record.created_at, now));
}

fn set_failure(record: &mut ExecutionRecord, failure: ExecutionFailure, now: DateTime<Utc>) {
    record.error_message = Some(failure.message);
    record.error_detail = failure.detail;
    finish(record, now);
}

#[async_trait]
impl ExecutionStore for MemoryStore {
    async fn create_execution(&self, new: NewExecution) -> Result<CreateOutcome, StoreError> {
        let mut inner = self.inner.lock().await;

        if let Some(key) = new.idempotency_key.as_deref() {
            let existing = inner.executions.values().find(|r| {
                r.client_id == new.client_id
                    && r.workflow_id == new.workflow_id
                    && r.idempotency_key.as_deref() == Some(key)
            });
            if let Some(r) = existing {
                return Ok(CreateOutcome::Existing(r.clone()));
            }
        }

        let now = Utc::now();
        let record = ExecutionRecord {
            id: Uuid::new_v4(),
            workflow_id: new.workflow_id,
            client_id: new.client_id,
            status: ExecutionStatus::Pending,
            input_data: new.input_data,
            output_data: None,
            error_message: None,
            error_detail: None,
            retry_count: 0,
            max_retries: new.max_retries,
            timeout_seconds: new.timeout_seconds,
            idempotency_key: new.idempotency_key,
            created_at: now,
            updated_at: now,
            claimed_at: None,
            started_at: None,
            completed_at: None,
            duration_seconds: None,
        };
        inner.order.push(record.id);
        inner.executions.insert(record.id, record.clone());
        Ok(CreateOutcome::Created(record))
    }

    async fn get_execution(&self, id: Uuid) -> Result<Option<ExecutionRecord>, StoreError> {
        Ok(self.inner.lock().await.executions.get(&id).cloned())
    }

    async fn list_executions(&self, filter: ExecutionFilter) -> Result<ExecutionPage, StoreError> {
        let inner = self.inner.lock().await;
        let matching: Vec<&ExecutionRecord> = inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.executions.get(id))
            .filter(|r| filter.matches(r))
            .collect();
        let total = matching.len() as u64;
        let executions = matching
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect();
        Ok(ExecutionPage { executions, total })
    }

    async fn claim_execution(&self, id: Uuid, attempt: i32) -> Result<Option<ExecutionRecord>, StoreError> {
        self.transition(
            id,
            Transition::Claim,
            |r| r.retry_count == attempt,
            |r, now| {
                r.claimed_at = Some(now);
                r.started_at.get_or_insert(now);
            },
        )
        .await
    }

    async fn complete_execution(&self, id: Uuid, output: JsonValue) -> Result<Option<ExecutionRecord>, StoreError> {
        self.transition(
            id,
            Transition::Complete,
            |_| true,
            |r, now| {
                r.output_data = Some(output);
                finish(r, now);
            },
        )
        .await
    }

    async fn fail_execution(&self, id: Uuid, failure: ExecutionFailure) -> Result<Option<ExecutionRecord>, StoreError> {
        self.transition(id, Transition::Fail, |_| true, |r, now| set_failure(r, failure, now))
            .await
    }

    async fn schedule_retry(&self, id: Uuid, expected_retry_count: i32) -> Result<Option<ExecutionRecord>, StoreError> {
        self.transition(
            id,
            Transition::Retry,
            |r| r.retry_count == expected_retry_count && r.retry_count < r.max_retries,
            |r, _| {
                r.retry_count += 1;
                r.claimed_at = None;
            },
        )
        .await
    }

    async fn abort_execution(&self, id: Uuid, failure: ExecutionFailure) -> Result<Option<ExecutionRecord>, StoreError> {
        self.transition(id, Transition::Cancel, |_| true, |r, now| set_failure(r, failure, now))
            .await
    }

    async fn reclaim_stale(
        &self,
        now: DateTime<Utc>,
        grace: Duration,
        limit: i64,
    ) -> Result<Vec<Reclaimed>, StoreError> {
        let grace = chrono::Duration::from_std(grace)
            .map_err(|e| StoreError::Other(format!("invalid grace period: {e}")))?;
        let mut inner = self.inner.lock().await;

        let mut stale: Vec<&mut ExecutionRecord> = inner
            .executions
            .values_mut()
            .filter(|r| {
                r.status == ExecutionStatus::Processing
                    && r.claimed_at.is_some_and(|claimed| {
                        claimed + chrono::Duration::seconds(i64::from(r.timeout_seconds)) + grace
                            <= now
                    })
            })
            .collect();
        stale.sort_by_key(|r| r.claimed_at);
        stale.truncate(limit.max(0) as usize);

        let stamp = Utc::now();
        let mut out = Vec::with_capacity(stale.len());
        for record in stale {
            record.updated_at = stamp;
            let outcome = if record.retry_count < record.max_retries {
                record.status = ExecutionStatus::Pending;
                record.retry_count += 1;
                record.claimed_at = None;
                ReclaimOutcome::Requeued
            } else {
                record.status = ExecutionStatus::Failed;
                set_failure(record, ExecutionFailure::worker_lost(), stamp);
                ReclaimOutcome::Failed
            };
            out.push(Reclaimed {
                record: record.clone(),
                outcome,
            });
        }
        Ok(out)
    }

    async fn append_event(&self, event: NewEvent) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let id = inner.events.len() as i64 + 1;
        inner.events.push(ExecutionEvent {
            id,
            execution_id: event.execution_id,
            ts: Utc::now(),
            event_type: event.event_type,
            payload: event.payload,
        });
        Ok(())
    }

    async fn get_events_after(
        &self,
        execution_id: Uuid,
        after_id: i64,
        limit: i64,
    ) -> Result<Vec<ExecutionEvent>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .events
            .iter()
            .filter(|e| e.execution_id == execution_id && e.id > after_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}
