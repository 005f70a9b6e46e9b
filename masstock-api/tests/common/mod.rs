#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use masstock_api::{build_router, AppState, ServerConfig};
use masstock_core::load_catalog_str;
use masstock_exec::executor::NoOpEventSink;
use masstock_exec::{Dispatcher, StaticCatalog};
use masstock_store::{MemoryQueue, MemoryStore};
use serde_json::Value as JsonValue;

pub const CATALOG: &str = r#"
workflows:
  - id: product-shots
    client_id: client_a
    status: deployed
    timeout_seconds: 30
    retry_count: 2
    input_schema:
      fields:
        - name: prompt
          type: string
          required: true
          max_length: 200
  - id: paused-shots
    client_id: client_a
    status: paused
  - id: foreign
    client_id: client_b
    status: deployed
"#;

pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub queue: Arc<MemoryQueue>,
    pub catalog: Arc<StaticCatalog>,
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::default()
    }
}

pub fn build_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let queue = Arc::new(MemoryQueue::new());
    let catalog = Arc::new(StaticCatalog::new(load_catalog_str(CATALOG).unwrap()));
    let dispatcher = Dispatcher::new(
        store.clone(),
        queue.clone(),
        catalog.clone(),
        Arc::new(NoOpEventSink),
    );
    let app = build_router(AppState::new(Arc::new(dispatcher)), &test_config());
    TestApp {
        app,
        store,
        queue,
        catalog,
    }
}

pub fn request(method: Method, uri: &str, client_id: Option<&str>, body: Option<JsonValue>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(client_id) = client_id {
        builder = builder.header("x-client-id", client_id);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response<Body>) -> JsonValue {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
