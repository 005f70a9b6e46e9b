//! Follows one execution until it reaches a terminal state, the caller
//! cancels, or the polling deadline passes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use masstock_core::wire::ExecutionView;
use masstock_core::ExecutionStatus;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::error::ClientError;

/// Where the poller reads status from.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self, execution_id: Uuid) -> Result<ExecutionView, ClientError>;
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn fetch(&self, execution_id: Uuid) -> Result<ExecutionView, ClientError> {
        self.get_execution(execution_id).await
    }
}

#[async_trait]
impl<T: StatusSource + ?Sized> StatusSource for Arc<T> {
    async fn fetch(&self, execution_id: Uuid) -> Result<ExecutionView, ClientError> {
        (**self).fetch(execution_id).await
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Wait before the second request.
    pub interval: Duration,
    /// Growth of the wait per request; 1.0 polls at a flat `interval`.
    pub factor: f64,
    pub max_interval: Duration,
    /// Maximum time `poll` may take, measured from its first request.
    pub deadline: Duration,
}

impl PollerConfig {
    /// Margin added on top of an execution timeout to get a deadline.
    pub const DEADLINE_MARGIN: Duration = Duration::from_secs(10);

    /// Deadline covering one execution of `timeout_seconds` plus margin.
    pub fn for_execution_timeout(timeout_seconds: u64) -> Self {
        Self {
            deadline: Duration::from_secs(timeout_seconds) + Self::DEADLINE_MARGIN,
            ..Self::default()
        }
    }

    fn next_interval(&self, current: Duration) -> Duration {
        let factor = if self.factor.is_finite() && self.factor >= 1.0 {
            self.factor
        } else {
            1.0
        };
        current.mul_f64(factor).min(self.max_interval.max(self.interval))
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            factor: 1.0,
            max_interval: Duration::from_secs(30),
            deadline: Duration::from_secs(300) + Self::DEADLINE_MARGIN,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(ExecutionView),
    /// The execution itself failed (including server-side cancellation).
    Failed(ExecutionView),
    /// The caller cancelled polling. The execution is untouched.
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("gave up polling after {elapsed:?} (last status: {})", last_status.map(|s| s.as_str()).unwrap_or("unknown"))]
    Timeout {
        elapsed: Duration,
        last_status: Option<ExecutionStatus>,
    },
    #[error("execution {0} not found")]
    NotFound(Uuid),
    #[error("status request rejected: {0}")]
    Rejected(ClientError),
}

pub struct StatusPoller<S> {
    source: S,
    config: PollerConfig,
}

impl<S: StatusSource> StatusPoller<S> {
    pub fn new(source: S, config: PollerConfig) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub async fn poll(
        &self,
        execution_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, PollError> {
        self.poll_with(execution_id, cancel, |_| {}).await
    }

    /// Like [`poll`](Self::poll), calling `on_status` with every status
    /// received.
    pub async fn poll_with(
        &self,
        execution_id: Uuid,
        cancel: &CancellationToken,
        mut on_status: impl FnMut(&ExecutionView) + Send,
    ) -> Result<PollOutcome, PollError> {
        let started = Instant::now();
        let deadline = started + self.config.deadline;
        let mut interval = self.config.interval;
        let mut last_status = None;

        let timed_out = |last_status| PollError::Timeout {
            elapsed: started.elapsed(),
            last_status,
        };

        loop {
            if cancel.is_cancelled() {
                return Ok(PollOutcome::Cancelled);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timed_out(last_status));
            }

            // Each request is bounded by what is left of the deadline.
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
                r = tokio::time::timeout(remaining, self.source.fetch(execution_id)) => r,
            };

            let mut hint = None;
            match fetched {
                Err(_) => return Err(timed_out(last_status)),
                Ok(Ok(view)) => {
                    last_status = Some(view.status);
                    on_status(&view);
                    match view.status {
                        ExecutionStatus::Completed => return Ok(PollOutcome::Completed(view)),
                        ExecutionStatus::Failed => return Ok(PollOutcome::Failed(view)),
                        ExecutionStatus::Pending | ExecutionStatus::Processing => {}
                    }
                }
                Ok(Err(e)) if e.is_not_found() => return Err(PollError::NotFound(execution_id)),
                Ok(Err(e)) if e.is_transient() => {
                    tracing::warn!(%execution_id, error = %e, "status request failed, retrying");
                    hint = e.retry_after();
                }
                Ok(Err(e)) => return Err(PollError::Rejected(e)),
            }

            let wait = hint.map_or(interval, |h| h.max(interval));
            interval = self.config.next_interval(interval);

            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
                _ = tokio::time::sleep(wait.min(remaining)) => {}
            }
        }
    }
}
