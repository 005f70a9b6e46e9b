use std::sync::Arc;
use std::time::Duration;

use masstock_core::{ExecutionFailure, ExecutionRecord};
use masstock_store::{ExecutionStore, JobMessage, JobQueue, QueueError, StoreError};
use serde_json::Value as JsonValue;
use tracing::Instrument;
use uuid::Uuid;

use crate::catalog::WorkflowCatalog;
use crate::executor::events::{Event, EventSink};
use crate::executor::failure::{failure_for, workflow_missing};
use crate::generator::{GenerationError, GenerationRequest, Generator};
use crate::retry::{decide_retry, RetryConfig, RetryDecision};

/// What handling one job message did to its execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    Completed {
        output: JsonValue,
    },
    RetryScheduled {
        next_attempt: i32,
        delay: Duration,
    },
    Failed {
        failure: ExecutionFailure,
    },
    /// The claim did not apply: the execution is terminal, already being
    /// processed, or the message belongs to an older attempt.
    Discarded,
    /// The attempt ran but its final transition no longer applied (the
    /// execution was cancelled or reclaimed meanwhile).
    Superseded,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}

/// Turns one queue message into at most one effective state transition.
pub struct Worker {
    store: Arc<dyn ExecutionStore>,
    queue: Arc<dyn JobQueue>,
    catalog: Arc<dyn WorkflowCatalog>,
    generator: Arc<dyn Generator>,
    event_sink: Arc<dyn EventSink>,
    retry: RetryConfig,
}

impl Worker {
    pub fn new(
        store: Arc<dyn ExecutionStore>,
        queue: Arc<dyn JobQueue>,
        catalog: Arc<dyn WorkflowCatalog>,
        generator: Arc<dyn Generator>,
        event_sink: Arc<dyn EventSink>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            store,
            queue,
            catalog,
            generator,
            event_sink,
            retry,
        }
    }

    pub async fn process(&self, job: JobMessage) -> Result<ProcessOutcome, ProcessError> {
        let span = tracing::info_span!(
            "process",
            execution_id = %job.execution_id,
            attempt = job.attempt
        );
        self.process_inner(job).instrument(span).await
    }

    async fn process_inner(&self, job: JobMessage) -> Result<ProcessOutcome, ProcessError> {
        let Some(record) = self
            .store
            .claim_execution(job.execution_id, job.attempt)
            .await?
        else {
            tracing::info!("claim did not apply, discarding message");
            self.event_sink
                .emit(Event::DuplicateDiscarded {
                    execution_id: job.execution_id,
                    attempt: job.attempt,
                })
                .await;
            return Ok(ProcessOutcome::Discarded);
        };

        self.event_sink
            .emit(Event::Started {
                execution_id: record.id,
                attempt: record.retry_count,
            })
            .await;

        let Some(workflow) = self.catalog.get(&record.workflow_id) else {
            let failure = workflow_missing(&record.workflow_id);
            return self.finish_failed(&record, failure).await;
        };

        let request = GenerationRequest {
            execution_id: record.id,
            attempt: record.retry_count,
            workflow,
            input_data: record.input_data.clone(),
        };
        let timeout = Duration::from_secs(record.timeout_seconds.max(1) as u64);
        let result = match tokio::time::timeout(timeout, self.generator.generate(&request)).await {
            Ok(r) => r,
            Err(_) => Err(GenerationError::Timeout(timeout)),
        };

        match result {
            // A completed execution always carries output.
            Ok(JsonValue::Null) => {
                let error = GenerationError::permanent("generator returned no output");
                self.handle_error(&record, error).await
            }
            Ok(output) => self.finish_completed(&record, output).await,
            Err(error) => self.handle_error(&record, error).await,
        }
    }

    async fn finish_completed(
        &self,
        record: &ExecutionRecord,
        output: JsonValue,
    ) -> Result<ProcessOutcome, ProcessError> {
        let Some(done) = self
            .store
            .complete_execution(record.id, output.clone())
            .await?
        else {
            tracing::info!("execution changed while generating, dropping result");
            return Ok(ProcessOutcome::Superseded);
        };
        self.event_sink
            .emit(Event::Completed {
                execution_id: done.id,
                duration_seconds: done.duration_seconds,
            })
            .await;
        Ok(ProcessOutcome::Completed { output })
    }

    async fn handle_error(
        &self,
        record: &ExecutionRecord,
        error: GenerationError,
    ) -> Result<ProcessOutcome, ProcessError> {
        let decision = decide_retry(
            &self.retry,
            record.retry_count,
            record.max_retries,
            &error,
            || fastrand::u64(..),
        );

        match decision {
            RetryDecision::RetryAfter { delay, reason } => {
                let Some(pending) = self.store.schedule_retry(record.id, record.retry_count).await?
                else {
                    tracing::info!("execution changed while generating, not retrying");
                    return Ok(ProcessOutcome::Superseded);
                };
                let next = JobMessage {
                    execution_id: pending.id,
                    attempt: pending.retry_count,
                };
                if let Err(e) = self.queue.publish(next, delay).await {
                    tracing::error!(error = %e, "failed to republish retry");
                    let failure = ExecutionFailure::enqueue_failed(&e.to_string());
                    if let Some(failed) = self.store.abort_execution(pending.id, failure).await? {
                        self.emit_failed(&failed).await;
                    }
                    return Err(e.into());
                }
                tracing::info!(
                    error = %error,
                    next_attempt = pending.retry_count,
                    delay_ms = delay.as_millis() as u64,
                    reason = reason.as_str(),
                    "attempt failed, retry scheduled"
                );
                self.event_sink
                    .emit(Event::RetryScheduled {
                        execution_id: pending.id,
                        next_attempt: pending.retry_count,
                        delay_ms: delay.as_millis() as u64,
                        reason: reason.as_str().to_string(),
                        error: error.to_string(),
                    })
                    .await;
                Ok(ProcessOutcome::RetryScheduled {
                    next_attempt: pending.retry_count,
                    delay,
                })
            }
            RetryDecision::Stop { reason } => {
                tracing::warn!(error = %error, reason = reason.as_str(), "attempt failed, giving up");
                let failure = failure_for(&error, reason, record.retry_count);
                self.finish_failed(record, failure).await
            }
        }
    }

    async fn finish_failed(
        &self,
        record: &ExecutionRecord,
        failure: ExecutionFailure,
    ) -> Result<ProcessOutcome, ProcessError> {
        let Some(failed) = self.store.fail_execution(record.id, failure.clone()).await? else {
            tracing::info!("execution changed while generating, not marking failed");
            return Ok(ProcessOutcome::Superseded);
        };
        self.emit_failed(&failed).await;
        Ok(ProcessOutcome::Failed { failure })
    }

    async fn emit_failed(&self, record: &ExecutionRecord) {
        emit_failed(self.event_sink.as_ref(), record).await;
    }
}

pub(crate) async fn emit_failed(sink: &dyn EventSink, record: &ExecutionRecord) {
    let execution_id: Uuid = record.id;
    let event = if record.is_cancelled() {
        Event::Cancelled { execution_id }
    } else {
        Event::Failed {
            execution_id,
            message: record.error_message.clone().unwrap_or_default(),
            detail: record.error_detail.clone(),
        }
    };
    sink.emit(event).await;
}
