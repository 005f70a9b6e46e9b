use std::sync::Arc;

use masstock_exec::Dispatcher;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}
