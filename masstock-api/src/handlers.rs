use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use masstock_core::wire::{
    ExecuteRequest, ExecuteResponse, ExecutionList, ExecutionView, Pagination,
};
use masstock_core::ExecutionStatus;
use masstock_exec::EnqueueRequest;
use masstock_store::ExecutionFilter;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::extract::ClientScope;
use crate::state::AppState;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;
const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// GET /health
pub async fn health() -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /api/workflows/{workflow_id}/execute
///
/// Responds `202` as soon as the execution is recorded and queued. A
/// repeated idempotency key answers `200` with the original execution.
pub async fn execute(
    State(state): State<AppState>,
    ClientScope(client_id): ClientScope,
    Path(workflow_id): Path<String>,
    body: Result<Json<ExecuteRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ExecuteResponse>)> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if let Some(key) = &body.idempotency_key {
        if key.trim().is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
            return Err(AppError::BadRequest(format!(
                "idempotency_key must be 1 to {MAX_IDEMPOTENCY_KEY_LEN} characters"
            )));
        }
    }

    let enqueued = state
        .dispatcher
        .enqueue(EnqueueRequest {
            workflow_id,
            client_id,
            input_data: body.input_data,
            idempotency_key: body.idempotency_key,
        })
        .await?;

    let status = if enqueued.created {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(ExecuteResponse {
            execution_id: enqueued.execution_id,
            status: enqueued.status,
        }),
    ))
}

/// GET /api/executions/{execution_id}
pub async fn get_execution(
    State(state): State<AppState>,
    ClientScope(client_id): ClientScope,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ExecutionView>> {
    let Path(execution_id) = id.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let record = state.dispatcher.get(&client_id, execution_id).await?;
    Ok(Json(ExecutionView::from(&record)))
}

/// POST /api/executions/{execution_id}/cancel
pub async fn cancel_execution(
    State(state): State<AppState>,
    ClientScope(client_id): ClientScope,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ExecutionView>> {
    let Path(execution_id) = id.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let record = state.dispatcher.cancel(&client_id, execution_id).await?;
    Ok(Json(ExecutionView::from(&record)))
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// GET /api/workflows/{workflow_id}/executions
pub async fn list_executions(
    State(state): State<AppState>,
    ClientScope(client_id): ClientScope,
    Path(workflow_id): Path<String>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<Json<ExecutionList>> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<ExecutionStatus>)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let page = params.page.unwrap_or(1).max(1);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);

    let filter = ExecutionFilter {
        status,
        page,
        limit,
        ..ExecutionFilter::for_client(client_id)
    };
    let result = state.dispatcher.list(&workflow_id, filter).await?;

    Ok(Json(ExecutionList {
        executions: result.executions.iter().map(ExecutionView::from).collect(),
        pagination: Pagination {
            page,
            limit,
            total: result.total,
        },
    }))
}
