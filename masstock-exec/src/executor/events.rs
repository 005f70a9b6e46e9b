use std::sync::Arc;

use async_trait::async_trait;
use masstock_store::{ExecutionStore, NewEvent, ReclaimOutcome};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

/// Lifecycle events of one execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Queued {
        execution_id: Uuid,
        workflow_id: String,
    },
    Started {
        execution_id: Uuid,
        attempt: i32,
    },
    RetryScheduled {
        execution_id: Uuid,
        next_attempt: i32,
        delay_ms: u64,
        reason: String,
        error: String,
    },
    Completed {
        execution_id: Uuid,
        duration_seconds: Option<f64>,
    },
    Failed {
        execution_id: Uuid,
        message: String,
        detail: Option<String>,
    },
    Cancelled {
        execution_id: Uuid,
    },
    DuplicateDiscarded {
        execution_id: Uuid,
        attempt: i32,
    },
    Reclaimed {
        execution_id: Uuid,
        outcome: ReclaimOutcome,
    },
}

impl Event {
    pub fn execution_id(&self) -> Uuid {
        match self {
            Event::Queued { execution_id, .. }
            | Event::Started { execution_id, .. }
            | Event::RetryScheduled { execution_id, .. }
            | Event::Completed { execution_id, .. }
            | Event::Failed { execution_id, .. }
            | Event::Cancelled { execution_id }
            | Event::DuplicateDiscarded { execution_id, .. }
            | Event::Reclaimed { execution_id, .. } => *execution_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Queued { .. } => "execution.queued",
            Event::Started { .. } => "execution.started",
            Event::RetryScheduled { .. } => "execution.retry_scheduled",
            Event::Completed { .. } => "execution.completed",
            Event::Failed { .. } => "execution.failed",
            Event::Cancelled { .. } => "execution.cancelled",
            Event::DuplicateDiscarded { .. } => "execution.duplicate_discarded",
            Event::Reclaimed { .. } => "execution.reclaimed",
        }
    }

    pub fn payload(&self) -> JsonValue {
        match self {
            Event::Queued { workflow_id, .. } => json!({ "workflow_id": workflow_id }),
            Event::Started { attempt, .. } => json!({ "attempt": attempt }),
            Event::RetryScheduled {
                next_attempt,
                delay_ms,
                reason,
                error,
                ..
            } => json!({
                "next_attempt": next_attempt,
                "delay_ms": delay_ms,
                "reason": reason,
                "error": error,
            }),
            Event::Completed {
                duration_seconds, ..
            } => json!({ "duration_seconds": duration_seconds }),
            Event::Failed {
                message, detail, ..
            } => json!({ "message": message, "detail": detail }),
            Event::Cancelled { .. } => json!({}),
            Event::DuplicateDiscarded { attempt, .. } => json!({ "attempt": attempt }),
            Event::Reclaimed { outcome, .. } => json!({
                "outcome": match outcome {
                    ReclaimOutcome::Requeued => "requeued",
                    ReclaimOutcome::Failed => "failed",
                }
            }),
        }
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

#[derive(Default)]
pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.add(sink);
        self
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

/// Appends every event to the store's `execution_events` trail.
pub struct StoreEventSink {
    store: Arc<dyn ExecutionStore>,
}

impl StoreEventSink {
    pub fn new(store: Arc<dyn ExecutionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventSink for StoreEventSink {
    async fn emit(&self, event: Event) {
        let execution_id = event.execution_id();
        let event_type = event.event_type();
        let result = self
            .store
            .append_event(NewEvent {
                execution_id,
                event_type: event_type.to_string(),
                payload: event.payload(),
            })
            .await;
        if let Err(e) = result {
            tracing::warn!(%execution_id, event_type, error = %e, "failed to record execution event");
        }
    }
}

/// Logs events as structured `tracing` records.
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: Event) {
        let execution_id = event.execution_id();
        let event_type = event.event_type();
        let payload = event.payload();
        match &event {
            Event::Failed { .. } => {
                tracing::warn!(%execution_id, event_type, %payload, "execution event")
            }
            Event::DuplicateDiscarded { .. } | Event::Reclaimed { .. } => {
                tracing::debug!(%execution_id, event_type, %payload, "execution event")
            }
            _ => tracing::info!(%execution_id, event_type, %payload, "execution event"),
        }
    }
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: Event) {}
}
