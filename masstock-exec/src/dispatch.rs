use std::sync::Arc;
use std::time::Duration;

use masstock_core::{
    validate_workflow_input, ExecutionFailure, ExecutionRecord, ExecutionStatus, NewExecution,
    ValidationError, WorkflowStatus,
};
use masstock_store::{
    ExecutionFilter, ExecutionPage, ExecutionStore, JobMessage, JobQueue, QueueError, StoreError,
};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::catalog::WorkflowCatalog;
use crate::executor::events::{Event, EventSink};
use crate::executor::worker::emit_failed;

#[derive(Debug, Clone)]
pub struct EnqueueRequest {
    pub workflow_id: String,
    pub client_id: String,
    pub input_data: JsonValue,
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enqueued {
    pub execution_id: Uuid,
    pub status: ExecutionStatus,
    /// False when an idempotency key matched an earlier execution.
    pub created: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("workflow {0} not found")]
    WorkflowNotFound(String),
    #[error("workflow {workflow_id} is {status}, not deployed")]
    WorkflowNotAvailable {
        workflow_id: String,
        status: WorkflowStatus,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("execution {0} not found")]
    ExecutionNotFound(Uuid),
    #[error("execution {execution_id} is already {status}")]
    Conflict {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}

/// Accepts execute requests: validates them, persists a `pending` record
/// and publishes its first job message. Never waits for the work itself.
pub struct Dispatcher {
    store: Arc<dyn ExecutionStore>,
    queue: Arc<dyn JobQueue>,
    catalog: Arc<dyn WorkflowCatalog>,
    event_sink: Arc<dyn EventSink>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn ExecutionStore>,
        queue: Arc<dyn JobQueue>,
        catalog: Arc<dyn WorkflowCatalog>,
        event_sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            queue,
            catalog,
            event_sink,
        }
    }

    pub async fn enqueue(&self, req: EnqueueRequest) -> Result<Enqueued, DispatchError> {
        let workflow = self
            .catalog
            .get(&req.workflow_id)
            .filter(|wf| wf.client_id == req.client_id)
            .ok_or_else(|| DispatchError::WorkflowNotFound(req.workflow_id.clone()))?;

        if !workflow.is_deployed() {
            return Err(DispatchError::WorkflowNotAvailable {
                workflow_id: workflow.id.clone(),
                status: workflow.status,
            });
        }

        validate_workflow_input(&workflow, &req.input_data)?;

        let outcome = self
            .store
            .create_execution(NewExecution {
                workflow_id: workflow.id.clone(),
                client_id: req.client_id,
                input_data: req.input_data,
                max_retries: workflow.max_retries,
                timeout_seconds: workflow.timeout_seconds,
                idempotency_key: req.idempotency_key,
            })
            .await?;

        if !outcome.is_created() {
            let existing = outcome.record();
            tracing::info!(
                execution_id = %existing.id,
                workflow_id = %existing.workflow_id,
                "idempotency key matched existing execution"
            );
            // Same acknowledgement as the original call; current state is read via `get`.
            return Ok(Enqueued {
                execution_id: existing.id,
                status: ExecutionStatus::Pending,
                created: false,
            });
        }

        let record = outcome.into_record();
        if let Err(e) = self
            .queue
            .publish(JobMessage::first(record.id), Duration::ZERO)
            .await
        {
            tracing::error!(execution_id = %record.id, error = %e, "failed to publish job");
            let failure = ExecutionFailure::enqueue_failed(&e.to_string());
            if let Some(failed) = self.store.abort_execution(record.id, failure).await? {
                emit_failed(self.event_sink.as_ref(), &failed).await;
            }
            return Err(e.into());
        }

        tracing::info!(
            execution_id = %record.id,
            workflow_id = %record.workflow_id,
            client_id = %record.client_id,
            "execution queued"
        );
        self.event_sink
            .emit(Event::Queued {
                execution_id: record.id,
                workflow_id: record.workflow_id.clone(),
            })
            .await;

        Ok(Enqueued {
            execution_id: record.id,
            status: ExecutionStatus::Pending,
            created: true,
        })
    }

    /// Execution as seen by `client_id`. Records of other clients are
    /// reported as not found.
    pub async fn get(
        &self,
        client_id: &str,
        execution_id: Uuid,
    ) -> Result<ExecutionRecord, DispatchError> {
        self.store
            .get_execution(execution_id)
            .await?
            .filter(|r| r.client_id == client_id)
            .ok_or(DispatchError::ExecutionNotFound(execution_id))
    }

    /// Executions of one workflow owned by `filter.client_id`, newest first.
    /// The workflow must exist in the catalog and belong to that client.
    pub async fn list(
        &self,
        workflow_id: &str,
        mut filter: ExecutionFilter,
    ) -> Result<ExecutionPage, DispatchError> {
        self.catalog
            .get(workflow_id)
            .filter(|wf| wf.client_id == filter.client_id)
            .ok_or_else(|| DispatchError::WorkflowNotFound(workflow_id.to_string()))?;
        filter.workflow_id = Some(workflow_id.to_string());
        Ok(self.store.list_executions(filter).await?)
    }

    /// User cancellation: `pending | processing -> failed`. A worker still
    /// running the attempt finds its final transition rejected.
    pub async fn cancel(
        &self,
        client_id: &str,
        execution_id: Uuid,
    ) -> Result<ExecutionRecord, DispatchError> {
        let current = self.get(client_id, execution_id).await?;
        if current.is_terminal() {
            return Err(DispatchError::Conflict {
                execution_id,
                status: current.status,
            });
        }

        match self
            .store
            .abort_execution(execution_id, ExecutionFailure::cancelled())
            .await?
        {
            Some(cancelled) => {
                tracing::info!(%execution_id, "execution cancelled");
                self.event_sink.emit(Event::Cancelled { execution_id }).await;
                Ok(cancelled)
            }
            None => {
                // Reached a terminal state between the read and the write.
                let latest = self.get(client_id, execution_id).await?;
                Err(DispatchError::Conflict {
                    execution_id,
                    status: latest.status,
                })
            }
        }
    }
}
