use std::sync::Arc;

use masstock_store::JobQueue;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::executor::types::WorkerConfig;
use crate::executor::worker::{ProcessError, ProcessOutcome, Worker};

/// Competing consumers over one queue. Each consumer receives a message
/// under a lease, runs it through the [`Worker`] and acks it once handled.
/// A message whose handling hit a store/queue error is left unacked and
/// comes back when its lease expires.
pub struct WorkerPool {
    worker: Arc<Worker>,
    queue: Arc<dyn JobQueue>,
    config: WorkerConfig,
}

impl WorkerPool {
    pub fn new(worker: Arc<Worker>, queue: Arc<dyn JobQueue>, config: WorkerConfig) -> Self {
        Self {
            worker,
            queue,
            config,
        }
    }

    /// Receive and handle at most one message. `Ok(None)` when nothing was
    /// visible.
    pub async fn poll_once(&self) -> Result<Option<ProcessOutcome>, ProcessError> {
        poll_once(&self.worker, self.queue.as_ref(), &self.config).await
    }

    /// Run `concurrency` consumers until `shutdown` fires. In-flight
    /// messages are finished before returning.
    pub async fn run(self, shutdown: CancellationToken) {
        let consumers = self.config.concurrency.max(1);
        tracing::info!(consumers, "worker pool started");

        let mut set = JoinSet::new();
        for consumer in 0..consumers {
            let worker = self.worker.clone();
            let queue = self.queue.clone();
            let config = self.config.clone();
            let shutdown = shutdown.clone();
            set.spawn(async move {
                consume(consumer, worker, queue, config, shutdown).await;
            });
        }

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "consumer task ended abnormally");
            }
        }
        tracing::info!("worker pool stopped");
    }
}

async fn consume(
    consumer: usize,
    worker: Arc<Worker>,
    queue: Arc<dyn JobQueue>,
    config: WorkerConfig,
    shutdown: CancellationToken,
) {
    while !shutdown.is_cancelled() {
        match poll_once(&worker, queue.as_ref(), &config).await {
            Ok(Some(_)) => continue,
            Ok(None) => {}
            Err(e) => tracing::warn!(consumer, error = %e, "failed to handle job"),
        }
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(config.poll_interval) => {}
        }
    }
}

async fn poll_once(
    worker: &Worker,
    queue: &dyn JobQueue,
    config: &WorkerConfig,
) -> Result<Option<ProcessOutcome>, ProcessError> {
    let Some(received) = queue.receive(config.lease).await? else {
        return Ok(None);
    };
    if received.deliveries > 1 {
        tracing::debug!(
            execution_id = %received.message.execution_id,
            deliveries = received.deliveries,
            "message redelivered"
        );
    }
    let outcome = worker.process(received.message).await?;
    queue.ack(received.receipt).await?;
    Ok(Some(outcome))
}
