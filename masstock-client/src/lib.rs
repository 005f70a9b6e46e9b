#![forbid(unsafe_code)]

//! Client side of the execution lifecycle: a typed HTTP client for the
//! MasStock API and a status poller that follows one execution until it
//! reaches a terminal state.

pub mod client;
pub mod error;
pub mod poller;

pub use crate::client::{ApiClient, ApiClientConfig, ListQuery};
pub use crate::error::ClientError;
pub use crate::poller::{PollError, PollOutcome, PollerConfig, StatusPoller, StatusSource};
