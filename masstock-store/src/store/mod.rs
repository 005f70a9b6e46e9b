mod queue;
mod trait_store;
mod types;

pub use queue::{JobMessage, JobQueue, QueueError, ReceivedJob};
pub use trait_store::{ExecutionStore, StoreError};
pub use types::{
    CreateOutcome, ExecutionEvent, ExecutionFilter, ExecutionPage, NewEvent, Reclaimed,
    ReclaimOutcome,
};
