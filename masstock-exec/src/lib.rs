#![forbid(unsafe_code)]

//! Execution lifecycle engine: the dispatcher that accepts work, the
//! worker that processes it with retries, and the background tasks that
//! keep the queue and the store consistent.

pub mod catalog;
pub mod dispatch;
pub mod executor;
pub mod generator;
pub mod retry;

pub use crate::catalog::{CatalogLoadError, StaticCatalog, WorkflowCatalog};
pub use crate::dispatch::{DispatchError, Dispatcher, EnqueueRequest, Enqueued};
pub use crate::executor::{
    Event, EventSink, ProcessError, ProcessOutcome, Reaper, ReaperConfig, Worker, WorkerConfig,
    WorkerPool,
};
pub use crate::generator::{
    GenerationError, GenerationRequest, Generator, HttpGenerator, HttpGeneratorConfig,
};
