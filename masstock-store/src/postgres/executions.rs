use std::time::Duration;

use chrono::{DateTime, Utc};
use masstock_core::{ExecutionFailure, ExecutionRecord, NewExecution};
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::store::{
    CreateOutcome, ExecutionFilter, ExecutionPage, ReclaimOutcome, Reclaimed, StoreError,
};

const COLUMNS: &str = "id, workflow_id, client_id, status, input_data, output_data, \
    error_message, error_detail, retry_count, max_retries, timeout_seconds, idempotency_key, \
    created_at, updated_at, claimed_at, started_at, completed_at, duration_seconds";

/// Seconds since first start, computed in the database at the terminal write.
const DURATION_SQL: &str =
    "EXTRACT(EPOCH FROM (now() - COALESCE(started_at, created_at)))::double precision";

/// Reported-status expression used by listing filters.
const REPORTED_STATUS_SQL: &str =
    "CASE WHEN status = 'pending' AND retry_count > 0 THEN 'processing' ELSE status END";

#[derive(Debug, sqlx::FromRow)]
struct ExecutionRow {
    id: Uuid,
    workflow_id: String,
    client_id: String,
    status: String,
    input_data: JsonValue,
    output_data: Option<JsonValue>,
    error_message: Option<String>,
    error_detail: Option<String>,
    retry_count: i32,
    max_retries: i32,
    timeout_seconds: i32,
    idempotency_key: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    claimed_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    duration_seconds: Option<f64>,
}

impl TryFrom<ExecutionRow> for ExecutionRecord {
    type Error = StoreError;

    fn try_from(r: ExecutionRow) -> Result<Self, Self::Error> {
        Ok(ExecutionRecord {
            id: r.id,
            workflow_id: r.workflow_id,
            client_id: r.client_id,
            status: r.status.parse()?,
            input_data: r.input_data,
            output_data: r.output_data,
            error_message: r.error_message,
            error_detail: r.error_detail,
            retry_count: r.retry_count,
            max_retries: r.max_retries,
            timeout_seconds: r.timeout_seconds,
            idempotency_key: r.idempotency_key,
            created_at: r.created_at,
            updated_at: r.updated_at,
            claimed_at: r.claimed_at,
            started_at: r.started_at,
            completed_at: r.completed_at,
            duration_seconds: r.duration_seconds,
        })
    }
}

fn to_record(row: Option<ExecutionRow>) -> Result<Option<ExecutionRecord>, StoreError> {
    row.map(ExecutionRecord::try_from).transpose()
}

fn to_records(rows: Vec<ExecutionRow>) -> Result<Vec<ExecutionRecord>, StoreError> {
    rows.into_iter().map(ExecutionRecord::try_from).collect()
}

pub async fn create_execution(
    pool: &PgPool,
    new: NewExecution,
) -> Result<CreateOutcome, StoreError> {
    let sql = format!(
        r#"
INSERT INTO executions
  (id, workflow_id, client_id, status, input_data, retry_count, max_retries,
   timeout_seconds, idempotency_key)
VALUES ($1, $2, $3, 'pending', $4, 0, $5, $6, $7)
ON CONFLICT (client_id, workflow_id, idempotency_key) DO NOTHING
RETURNING {COLUMNS}
        "#
    );
    let inserted = sqlx::query_as::<_, ExecutionRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(&new.workflow_id)
        .bind(&new.client_id)
        .bind(&new.input_data)
        .bind(new.max_retries)
        .bind(new.timeout_seconds)
        .bind(&new.idempotency_key)
        .fetch_optional(pool)
        .await?;

    if let Some(row) = inserted {
        return Ok(CreateOutcome::Created(row.try_into()?));
    }

    // Only a repeated idempotency key can conflict.
    let sql = format!(
        r#"
SELECT {COLUMNS} FROM executions
WHERE client_id = $1 AND workflow_id = $2 AND idempotency_key = $3
        "#
    );
    let existing = sqlx::query_as::<_, ExecutionRow>(&sql)
        .bind(&new.client_id)
        .bind(&new.workflow_id)
        .bind(&new.idempotency_key)
        .fetch_optional(pool)
        .await?;
    match existing {
        Some(row) => Ok(CreateOutcome::Existing(row.try_into()?)),
        None => Err(StoreError::Other(
            "insert conflicted but no execution holds the idempotency key".to_string(),
        )),
    }
}

pub async fn get_execution(pool: &PgPool, id: Uuid) -> Result<Option<ExecutionRecord>, StoreError> {
    let sql = format!("SELECT {COLUMNS} FROM executions WHERE id = $1");
    let row = sqlx::query_as::<_, ExecutionRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    to_record(row)
}

pub async fn list_executions(
    pool: &PgPool,
    filter: ExecutionFilter,
) -> Result<ExecutionPage, StoreError> {
    let status = filter.status.map(|s| s.as_str());
    let predicate = format!(
        r#"
WHERE client_id = $1
  AND ($2::text IS NULL OR workflow_id = $2)
  AND ($3::text IS NULL OR {REPORTED_STATUS_SQL} = $3)
        "#
    );

    let count_sql = format!("SELECT COUNT(*) FROM executions {predicate}");
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(&filter.client_id)
        .bind(&filter.workflow_id)
        .bind(status)
        .fetch_one(pool)
        .await?;

    let page_sql = format!(
        "SELECT {COLUMNS} FROM executions {predicate} \
         ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
    );
    let rows = sqlx::query_as::<_, ExecutionRow>(&page_sql)
        .bind(&filter.client_id)
        .bind(&filter.workflow_id)
        .bind(status)
        .bind(i64::from(filter.limit))
        .bind(filter.offset() as i64)
        .fetch_all(pool)
        .await?;

    Ok(ExecutionPage {
        executions: to_records(rows)?,
        total: total.max(0) as u64,
    })
}

pub async fn claim_execution(
    pool: &PgPool,
    id: Uuid,
    attempt: i32,
) -> Result<Option<ExecutionRecord>, StoreError> {
    let sql = format!(
        r#"
UPDATE executions
SET status = 'processing',
    claimed_at = now(),
    started_at = COALESCE(started_at, now()),
    updated_at = now()
WHERE id = $1 AND status = 'pending' AND retry_count = $2
RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, ExecutionRow>(&sql)
        .bind(id)
        .bind(attempt)
        .fetch_optional(pool)
        .await?;
    to_record(row)
}

pub async fn complete_execution(
    pool: &PgPool,
    id: Uuid,
    output: JsonValue,
) -> Result<Option<ExecutionRecord>, StoreError> {
    let sql = format!(
        r#"
UPDATE executions
SET status = 'completed',
    output_data = $2,
    completed_at = now(),
    duration_seconds = {DURATION_SQL},
    updated_at = now()
WHERE id = $1 AND status = 'processing'
RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, ExecutionRow>(&sql)
        .bind(id)
        .bind(output)
        .fetch_optional(pool)
        .await?;
    to_record(row)
}

pub async fn fail_execution(
    pool: &PgPool,
    id: Uuid,
    failure: ExecutionFailure,
) -> Result<Option<ExecutionRecord>, StoreError> {
    finish_failed(pool, id, failure, "status = 'processing'").await
}

pub async fn abort_execution(
    pool: &PgPool,
    id: Uuid,
    failure: ExecutionFailure,
) -> Result<Option<ExecutionRecord>, StoreError> {
    finish_failed(pool, id, failure, "status IN ('pending', 'processing')").await
}

async fn finish_failed(
    pool: &PgPool,
    id: Uuid,
    failure: ExecutionFailure,
    status_guard: &str,
) -> Result<Option<ExecutionRecord>, StoreError> {
    let sql = format!(
        r#"
UPDATE executions
SET status = 'failed',
    error_message = $2,
    error_detail = $3,
    completed_at = now(),
    duration_seconds = {DURATION_SQL},
    updated_at = now()
WHERE id = $1 AND {status_guard}
RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, ExecutionRow>(&sql)
        .bind(id)
        .bind(failure.message)
        .bind(failure.detail)
        .fetch_optional(pool)
        .await?;
    to_record(row)
}

pub async fn schedule_retry(
    pool: &PgPool,
    id: Uuid,
    expected_retry_count: i32,
) -> Result<Option<ExecutionRecord>, StoreError> {
    let sql = format!(
        r#"
UPDATE executions
SET status = 'pending',
    retry_count = retry_count + 1,
    claimed_at = NULL,
    updated_at = now()
WHERE id = $1
  AND status = 'processing'
  AND retry_count = $2
  AND retry_count < max_retries
RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, ExecutionRow>(&sql)
        .bind(id)
        .bind(expected_retry_count)
        .fetch_optional(pool)
        .await?;
    to_record(row)
}

pub async fn reclaim_stale(
    pool: &PgPool,
    now: DateTime<Utc>,
    grace: Duration,
    limit: i64,
) -> Result<Vec<Reclaimed>, StoreError> {
    let mut tx = pool.begin().await?;

    let requeued = reclaim_batch(
        &mut tx,
        now,
        grace,
        limit,
        "retry_count < max_retries",
        "status = 'pending', retry_count = retry_count + 1, claimed_at = NULL".to_string(),
        None,
    )
    .await?;

    let remaining = (limit - requeued.len() as i64).max(0);
    let failed = if remaining > 0 {
        reclaim_batch(
            &mut tx,
            now,
            grace,
            remaining,
            "retry_count >= max_retries",
            format!(
                "status = 'failed', error_message = $4, error_detail = $5, \
                 completed_at = now(), duration_seconds = {DURATION_SQL}"
            ),
            Some(ExecutionFailure::worker_lost()),
        )
        .await?
    } else {
        Vec::new()
    };

    tx.commit().await?;

    let mut out = Vec::with_capacity(requeued.len() + failed.len());
    out.extend(requeued.into_iter().map(|record| Reclaimed {
        record,
        outcome: ReclaimOutcome::Requeued,
    }));
    out.extend(failed.into_iter().map(|record| Reclaimed {
        record,
        outcome: ReclaimOutcome::Failed,
    }));
    Ok(out)
}

async fn reclaim_batch(
    tx: &mut Transaction<'_, Postgres>,
    now: DateTime<Utc>,
    grace: Duration,
    limit: i64,
    retry_guard: &str,
    set_clause: String,
    failure: Option<ExecutionFailure>,
) -> Result<Vec<ExecutionRecord>, StoreError> {
    let sql = format!(
        r#"
UPDATE executions
SET {set_clause}, updated_at = now()
WHERE id IN (
  SELECT id FROM executions
  WHERE status = 'processing'
    AND {retry_guard}
    AND claimed_at + make_interval(secs => timeout_seconds + $2) <= $1
  ORDER BY claimed_at
  LIMIT $3
  FOR UPDATE SKIP LOCKED
)
RETURNING {COLUMNS}
        "#
    );
    let mut query = sqlx::query_as::<_, ExecutionRow>(&sql)
        .bind(now)
        .bind(grace.as_secs_f64())
        .bind(limit);
    if let Some(f) = failure {
        query = query.bind(f.message).bind(f.detail);
    }
    let rows = query.fetch_all(&mut **tx).await?;
    to_records(rows)
}
