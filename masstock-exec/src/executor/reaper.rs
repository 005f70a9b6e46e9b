use std::sync::Arc;

use chrono::Utc;
use masstock_core::ExecutionFailure;
use masstock_store::{ExecutionStore, JobMessage, JobQueue, ReclaimOutcome, Reclaimed};
use tokio_util::sync::CancellationToken;

use crate::executor::events::{Event, EventSink};
use crate::executor::types::ReaperConfig;
use crate::executor::worker::{emit_failed, ProcessError};

/// Reclaims executions left in `processing` by a worker that died.
pub struct Reaper {
    store: Arc<dyn ExecutionStore>,
    queue: Arc<dyn JobQueue>,
    event_sink: Arc<dyn EventSink>,
    config: ReaperConfig,
}

impl Reaper {
    pub fn new(
        store: Arc<dyn ExecutionStore>,
        queue: Arc<dyn JobQueue>,
        event_sink: Arc<dyn EventSink>,
        config: ReaperConfig,
    ) -> Self {
        Self {
            store,
            queue,
            event_sink,
            config,
        }
    }

    /// One sweep at the current time.
    pub async fn reap_once(&self) -> Result<Vec<Reclaimed>, ProcessError> {
        self.reap_at(Utc::now()).await
    }

    /// Reclaims a batch, then republishes every requeued record. A failed
    /// publish aborts that record as `enqueue_failed` and the sweep moves on.
    pub async fn reap_at(
        &self,
        now: chrono::DateTime<Utc>,
    ) -> Result<Vec<Reclaimed>, ProcessError> {
        let reclaimed = self
            .store
            .reclaim_stale(now, self.config.grace, self.config.batch_size)
            .await?;

        for r in &reclaimed {
            let execution_id = r.record.id;
            tracing::warn!(
                %execution_id,
                retry_count = r.record.retry_count,
                outcome = ?r.outcome,
                "reclaimed stale execution"
            );
            self.event_sink
                .emit(Event::Reclaimed {
                    execution_id,
                    outcome: r.outcome,
                })
                .await;
            match r.outcome {
                ReclaimOutcome::Requeued => {
                    let job = JobMessage {
                        execution_id,
                        attempt: r.record.retry_count,
                    };
                    if let Err(e) = self.queue.publish(job, std::time::Duration::ZERO).await {
                        // Already committed as pending; without a message it must not stay there.
                        tracing::error!(%execution_id, error = %e, "republish after reclaim failed");
                        self.abort_unpublished(execution_id, &e.to_string()).await;
                    }
                }
                ReclaimOutcome::Failed => emit_failed(self.event_sink.as_ref(), &r.record).await,
            }
        }
        Ok(reclaimed)
    }

    async fn abort_unpublished(&self, execution_id: uuid::Uuid, reason: &str) {
        let failure = ExecutionFailure::enqueue_failed(reason);
        match self.store.abort_execution(execution_id, failure).await {
            Ok(Some(failed)) => emit_failed(self.event_sink.as_ref(), &failed).await,
            Ok(None) => {}
            Err(e) => tracing::error!(%execution_id, error = %e, "abort after failed republish"),
        }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(interval_ms = self.config.interval.as_millis() as u64, "reaper started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
            if let Err(e) = self.reap_once().await {
                tracing::warn!(error = %e, "reaper sweep failed");
            }
        }
        tracing::info!("reaper stopped");
    }
}
