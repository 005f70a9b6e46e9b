use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{JobMessage, QueueError, ReceivedJob};

#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    execution_id: Uuid,
    attempt: i32,
    deliveries: i32,
}

pub async fn publish(pool: &PgPool, job: JobMessage, delay: Duration) -> Result<(), QueueError> {
    sqlx::query(
        r#"
INSERT INTO execution_jobs (execution_id, attempt, available_at)
VALUES ($1, $2, now() + make_interval(secs => $3))
        "#,
    )
    .bind(job.execution_id)
    .bind(job.attempt)
    .bind(delay.as_secs_f64())
    .execute(pool)
    .await?;
    Ok(())
}

/// Lease the oldest visible job. Concurrent receivers skip rows another
/// transaction holds, so each job goes to one receiver per lease.
pub async fn receive(pool: &PgPool, lease: Duration) -> Result<Option<ReceivedJob>, QueueError> {
    let row = sqlx::query_as::<_, JobRow>(
        r#"
WITH next AS (
  SELECT id FROM execution_jobs
  WHERE available_at <= now()
  ORDER BY available_at, id
  LIMIT 1
  FOR UPDATE SKIP LOCKED
)
UPDATE execution_jobs j
SET available_at = now() + make_interval(secs => $1),
    deliveries = j.deliveries + 1
FROM next
WHERE j.id = next.id
RETURNING j.id, j.execution_id, j.attempt, j.deliveries
        "#,
    )
    .bind(lease.as_secs_f64())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| ReceivedJob {
        receipt: r.id,
        message: JobMessage {
            execution_id: r.execution_id,
            attempt: r.attempt,
        },
        deliveries: r.deliveries,
    }))
}

pub async fn ack(pool: &PgPool, receipt: i64) -> Result<(), QueueError> {
    sqlx::query(r#"DELETE FROM execution_jobs WHERE id = $1"#)
        .bind(receipt)
        .execute(pool)
        .await?;
    Ok(())
}
