//! In-process store and queue. Used by tests and by `masstock serve
//! --in-memory` for local runs; state is lost on exit.

mod queue;
mod store;

pub use queue::MemoryQueue;
pub use store::MemoryStore;
