use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

/// A queue message. Carries the execution id and the attempt it was
/// published for, never the input payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JobMessage {
    pub execution_id: Uuid,
    pub attempt: i32,
}

impl JobMessage {
    pub fn first(execution_id: Uuid) -> Self {
        Self {
            execution_id,
            attempt: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedJob {
    /// Receipt handle for [`JobQueue::ack`].
    pub receipt: i64,
    pub message: JobMessage,
    /// Times this message has been handed out, including this one.
    pub deliveries: i32,
}

/// At-least-once job queue with visibility leases. A received message that
/// is not acked before its lease runs out becomes visible again.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Make `job` visible after `delay`.
    async fn publish(&self, job: JobMessage, delay: Duration) -> Result<(), QueueError>;

    async fn receive(&self, lease: Duration) -> Result<Option<ReceivedJob>, QueueError>;

    async fn ack(&self, receipt: i64) -> Result<(), QueueError>;
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue unavailable: {0}")]
    Unavailable(String),
    #[error("queue error: {0}")]
    Other(String),
}

impl From<sqlx::Error> for QueueError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                QueueError::Unavailable(e.to_string())
            }
            other => QueueError::Other(other.to_string()),
        }
    }
}
