pub mod events;
pub mod failure;
mod pool;
mod reaper;
mod types;
pub mod worker;

pub use events::{
    CompositeEventSink, Event, EventSink, NoOpEventSink, StoreEventSink, TracingEventSink,
};
pub use pool::WorkerPool;
pub use reaper::Reaper;
pub use types::{ReaperConfig, WorkerConfig};
pub use worker::{ProcessError, ProcessOutcome, Worker};
