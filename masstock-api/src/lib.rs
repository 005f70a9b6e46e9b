#![forbid(unsafe_code)]

//! HTTP surface of the execution lifecycle: trigger a workflow, read an
//! execution, list a workflow's executions and cancel one.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;

pub use crate::config::{ConfigError, ServerConfig};
pub use crate::error::{AppError, AppResult};
pub use crate::extract::ClientScope;
pub use crate::router::{api_routes, build_router, serve};
pub use crate::state::AppState;
