use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use masstock_core::{WorkflowConfig, WorkflowStatus};
use masstock_exec::generator::HttpGeneratorConfig;
use masstock_exec::{GenerationError, GenerationRequest, Generator, HttpGenerator};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

async fn serve() -> String {
    let app = Router::new()
        .route(
            "/ok",
            post(|Json(body): Json<JsonValue>| async move {
                Json(json!({ "echo": body["input_data"], "model": body["model"] }))
            }),
        )
        .route(
            "/busy",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, [("retry-after", "3")], "overloaded") }),
        )
        .route(
            "/limited",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        )
        .route("/empty", post(|| async { StatusCode::OK }))
        .route(
            "/bad",
            post(|| async { (StatusCode::BAD_REQUEST, "unsupported style") }),
        )
        .route(
            "/auth",
            post(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({ "auth": auth }))
            }),
        )
        .route(
            "/workflows/{id}/generate",
            post(|axum::extract::Path(id): axum::extract::Path<String>| async move {
                Json(json!({ "routed": id }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn workflow(endpoint: Option<String>) -> Arc<WorkflowConfig> {
    Arc::new(WorkflowConfig {
        id: "product-shots".into(),
        client_id: "client_a".into(),
        name: None,
        status: WorkflowStatus::Deployed,
        timeout_seconds: 30,
        max_retries: 2,
        model: Some("flux-pro".into()),
        style: None,
        parameters: JsonValue::Null,
        endpoint,
        input_schema: Default::default(),
    })
}

fn request(endpoint: Option<String>) -> GenerationRequest {
    GenerationRequest {
        execution_id: Uuid::new_v4(),
        attempt: 0,
        workflow: workflow(endpoint),
        input_data: json!({"prompt": "red sneakers"}),
    }
}

fn generator() -> HttpGenerator {
    HttpGenerator::new(HttpGeneratorConfig::default()).unwrap()
}

#[tokio::test]
async fn success_returns_json_output() {
    let base = serve().await;
    let out = generator()
        .generate(&request(Some(format!("{base}/ok"))))
        .await
        .unwrap();
    assert_eq!(out["echo"]["prompt"], "red sneakers");
    assert_eq!(out["model"], "flux-pro");
}

#[tokio::test]
async fn server_errors_are_transient_with_hint() {
    let base = serve().await;
    let err = generator()
        .generate(&request(Some(format!("{base}/busy"))))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn rate_limit_is_transient() {
    let base = serve().await;
    let err = generator()
        .generate(&request(Some(format!("{base}/limited"))))
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Transient { .. }));
}

#[tokio::test]
async fn client_errors_are_permanent() {
    let base = serve().await;
    let err = generator()
        .generate(&request(Some(format!("{base}/bad"))))
        .await
        .unwrap_err();
    let GenerationError::Permanent { message } = err else {
        panic!("expected permanent error, got {err:?}");
    };
    assert!(message.contains("unsupported style"));
}

#[tokio::test]
async fn empty_success_body_is_permanent() {
    let base = serve().await;
    let err = generator()
        .generate(&request(Some(format!("{base}/empty"))))
        .await
        .unwrap_err();
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("empty body"));
}

#[tokio::test]
async fn falls_back_to_base_url_and_sends_token() {
    let base = serve().await;
    let gen = HttpGenerator::new(HttpGeneratorConfig {
        base_url: Some(url::Url::parse(&format!("{base}/")).unwrap()),
        api_token: Some("s3cret".to_string().into()),
        ..HttpGeneratorConfig::default()
    })
    .unwrap();
    let out = gen.generate(&request(None)).await.unwrap();
    assert_eq!(out, json!({"routed": "product-shots"}));

    let out = gen.generate(&request(Some(format!("{base}/auth")))).await.unwrap();
    assert_eq!(out["auth"], "Bearer s3cret");
}

#[tokio::test]
async fn missing_endpoint_is_permanent() {
    let err = generator().generate(&request(None)).await.unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn connection_refused_is_transient() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = generator()
        .generate(&request(Some(format!("http://{addr}/ok"))))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}
