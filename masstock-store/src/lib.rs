#![forbid(unsafe_code)]

pub mod memory;
pub mod postgres;
pub mod store;

pub use crate::memory::{MemoryQueue, MemoryStore};
pub use crate::postgres::{run_migrations, PostgresStore};
pub use crate::store::{
    CreateOutcome, ExecutionEvent, ExecutionFilter, ExecutionPage, ExecutionStore, JobMessage,
    JobQueue, NewEvent, QueueError, ReceivedJob, Reclaimed, ReclaimOutcome, StoreError,
};
