//! The opaque generation work an execution performs.

mod http;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use masstock_core::WorkflowConfig;
use serde_json::Value as JsonValue;
use uuid::Uuid;

pub use http::{HttpGenerator, HttpGeneratorConfig};

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub execution_id: Uuid,
    /// `retry_count` at claim time.
    pub attempt: i32,
    pub workflow: Arc<WorkflowConfig>,
    pub input_data: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("transient generation failure: {message}")]
    Transient {
        message: String,
        retry_after: Option<Duration>,
    },
    #[error("generation failed: {message}")]
    Permanent { message: String },
}

impl GenerationError {
    pub fn transient(message: impl Into<String>) -> Self {
        GenerationError::Transient {
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        GenerationError::Permanent {
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, GenerationError::Permanent { .. })
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GenerationError::Transient { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<JsonValue, GenerationError>;
}
