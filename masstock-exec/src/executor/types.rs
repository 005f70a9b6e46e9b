use std::time::Duration;

use crate::retry::RetryConfig;

/// Settings for a worker process: its consumers and the stale-execution
/// reaper that runs beside them.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Competing consumers in this process.
    pub concurrency: usize,
    /// Sleep between receives when the queue is empty.
    pub poll_interval: Duration,
    /// Visibility lease for a received message. Must exceed the longest
    /// workflow timeout or long jobs get redelivered (and then discarded).
    pub lease: Duration,
    pub retry: RetryConfig,
    pub reaper: ReaperConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            poll_interval: Duration::from_millis(500),
            lease: Duration::from_secs(15 * 60),
            retry: RetryConfig::default(),
            reaper: ReaperConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReaperConfig {
    pub interval: Duration,
    /// Extra time past `timeout_seconds` before a processing record counts
    /// as abandoned.
    pub grace: Duration,
    pub batch_size: i64,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            grace: Duration::from_secs(60),
            batch_size: 100,
        }
    }
}
