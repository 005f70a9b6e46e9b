use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{ExecutionEvent, NewEvent, StoreError};

pub async fn append_event(pool: &PgPool, event: NewEvent) -> Result<(), StoreError> {
    sqlx::query(
        r#"INSERT INTO execution_events (execution_id, type, payload) VALUES ($1, $2, $3)"#,
    )
    .bind(event.execution_id)
    .bind(event.event_type)
    .bind(event.payload)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_events_after(
    pool: &PgPool,
    execution_id: Uuid,
    after_id: i64,
    limit: i64,
) -> Result<Vec<ExecutionEvent>, StoreError> {
    let rows = sqlx::query_as::<_, ExecutionEvent>(
        r#"
SELECT id, execution_id, ts, type AS event_type, payload
FROM execution_events WHERE execution_id = $1 AND id > $2 ORDER BY id LIMIT $3
        "#,
    )
    .bind(execution_id)
    .bind(after_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
