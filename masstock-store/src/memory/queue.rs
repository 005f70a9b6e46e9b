use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::store::{JobMessage, JobQueue, QueueError, ReceivedJob};

struct Entry {
    id: i64,
    message: JobMessage,
    visible_at: Instant,
    deliveries: i32,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    entries: Vec<Entry>,
}

/// Job queue held in memory. Visibility uses `tokio::time`, so tests with
/// paused time control delays and lease expiry.
#[derive(Default)]
pub struct MemoryQueue {
    inner: Mutex<Inner>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages not yet acked, visible or not.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of unacked messages in publish order.
    pub async fn messages(&self) -> Vec<JobMessage> {
        let inner = self.inner.lock().await;
        inner.entries.iter().map(|e| e.message).collect()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn publish(&self, job: JobMessage, delay: Duration) -> Result<(), QueueError> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = inner.next_id;
        inner.entries.push(Entry {
            id,
            message: job,
            visible_at: Instant::now() + delay,
            deliveries: 0,
        });
        Ok(())
    }

    async fn receive(&self, lease: Duration) -> Result<Option<ReceivedJob>, QueueError> {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;
        let next = inner
            .entries
            .iter_mut()
            .filter(|e| e.visible_at <= now)
            .min_by_key(|e| (e.visible_at, e.id));
        Ok(next.map(|e| {
            e.visible_at = now + lease;
            e.deliveries += 1;
            ReceivedJob {
                receipt: e.id,
                message: e.message,
                deliveries: e.deliveries,
            }
        }))
    }

    async fn ack(&self, receipt: i64) -> Result<(), QueueError> {
        self.inner.lock().await.entries.retain(|e| e.id != receipt);
        Ok(())
    }
}
