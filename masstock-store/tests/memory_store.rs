use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use masstock_core::{ExecutionFailure, ExecutionStatus, NewExecution};
use masstock_store::{
    ExecutionFilter, ExecutionStore, MemoryStore, NewEvent, ReclaimOutcome,
};
use serde_json::json;

fn new_execution(workflow_id: &str, max_retries: i32) -> NewExecution {
    NewExecution {
        workflow_id: workflow_id.to_string(),
        client_id: "client_a".to_string(),
        input_data: json!({"prompt": "hello"}),
        max_retries,
        timeout_seconds: 30,
        idempotency_key: None,
    }
}

#[tokio::test]
async fn created_record_is_pending() {
    let store = MemoryStore::new();
    let created = store.create_execution(new_execution("wf", 3)).await.unwrap();
    assert!(created.is_created());
    let r = created.record();
    assert_eq!(r.status, ExecutionStatus::Pending);
    assert_eq!(r.retry_count, 0);
    assert!(r.started_at.is_none());
    assert!(r.output_data.is_none() && r.error_message.is_none());
}

#[tokio::test]
async fn idempotency_key_returns_existing_record() {
    let store = MemoryStore::new();
    let mut new = new_execution("wf", 3);
    new.idempotency_key = Some("order-42".into());

    let first = store.create_execution(new.clone()).await.unwrap();
    let second = store.create_execution(new.clone()).await.unwrap();
    assert!(!second.is_created());
    assert_eq!(first.record().id, second.record().id);

    new.workflow_id = "other".into();
    let third = store.create_execution(new).await.unwrap();
    assert!(third.is_created());
}

#[tokio::test]
async fn claim_requires_matching_attempt() {
    let store = MemoryStore::new();
    let id = store
        .create_execution(new_execution("wf", 3))
        .await
        .unwrap()
        .record()
        .id;

    assert!(store.claim_execution(id, 1).await.unwrap().is_none());
    let claimed = store.claim_execution(id, 0).await.unwrap().unwrap();
    assert_eq!(claimed.status, ExecutionStatus::Processing);
    assert!(claimed.started_at.is_some());
    assert!(claimed.claimed_at.is_some());

    // Already processing.
    assert!(store.claim_execution(id, 0).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_claims_apply_once() {
    let store = Arc::new(MemoryStore::new());
    let id = store
        .create_execution(new_execution("wf", 3))
        .await
        .unwrap()
        .record()
        .id;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.claim_execution(id, 0).await.unwrap().is_some()
        }));
    }
    let mut wins = 0;
    for h in handles {
        if h.await.unwrap() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);
}

#[tokio::test]
async fn complete_sets_output_and_duration() {
    let store = MemoryStore::new();
    let id = store
        .create_execution(new_execution("wf", 3))
        .await
        .unwrap()
        .record()
        .id;

    // Not claimed yet.
    assert!(store
        .complete_execution(id, json!({"ok": true}))
        .await
        .unwrap()
        .is_none());

    store.claim_execution(id, 0).await.unwrap().unwrap();
    let done = store
        .complete_execution(id, json!({"images": ["a.png"]}))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.status, ExecutionStatus::Completed);
    assert_eq!(done.output_data, Some(json!({"images": ["a.png"]})));
    assert!(done.error_message.is_none());
    assert!(done.completed_at.is_some());
    assert!(done.duration_seconds.unwrap() >= 0.0);

    // Terminal records accept nothing.
    assert!(store
        .fail_execution(id, ExecutionFailure::new("late", None))
        .await
        .unwrap()
        .is_none());
    assert!(store
        .abort_execution(id, ExecutionFailure::cancelled())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn retry_is_capped_by_max_retries() {
    let store = MemoryStore::new();
    let id = store
        .create_execution(new_execution("wf", 1))
        .await
        .unwrap()
        .record()
        .id;

    store.claim_execution(id, 0).await.unwrap().unwrap();
    let retried = store.schedule_retry(id, 0).await.unwrap().unwrap();
    assert_eq!(retried.status, ExecutionStatus::Pending);
    assert_eq!(retried.retry_count, 1);
    assert_eq!(retried.reported_status(), ExecutionStatus::Processing);

    store.claim_execution(id, 1).await.unwrap().unwrap();
    assert!(store.schedule_retry(id, 1).await.unwrap().is_none());

    let failed = store
        .fail_execution(id, ExecutionFailure::new("gave up", Some("boom".into())))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.retry_count, 1);
    assert_eq!(failed.error_message.as_deref(), Some("gave up"));
    assert!(failed.output_data.is_none());
}

#[tokio::test]
async fn cancel_pending_execution() {
    let store = MemoryStore::new();
    let id = store
        .create_execution(new_execution("wf", 3))
        .await
        .unwrap()
        .record()
        .id;

    let cancelled = store
        .abort_execution(id, ExecutionFailure::cancelled())
        .await
        .unwrap()
        .unwrap();
    assert!(cancelled.is_cancelled());
    assert!(cancelled.started_at.is_none());
    assert!(cancelled.duration_seconds.is_some());

    // A late job message cannot resurrect it.
    assert!(store.claim_execution(id, 0).await.unwrap().is_none());
}

#[tokio::test]
async fn list_filters_by_reported_status_and_pages_newest_first() {
    let store = MemoryStore::new();
    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(
            store
                .create_execution(new_execution("wf", 3))
                .await
                .unwrap()
                .record()
                .id,
        );
    }
    store.create_execution(new_execution("other", 3)).await.unwrap();

    // ids[0] waits on a retry, ids[1] is running.
    store.claim_execution(ids[0], 0).await.unwrap();
    store.schedule_retry(ids[0], 0).await.unwrap();
    store.claim_execution(ids[1], 0).await.unwrap();

    let mut filter = ExecutionFilter::for_client("client_a");
    filter.workflow_id = Some("wf".into());
    filter.limit = 2;
    let page = store.list_executions(filter.clone()).await.unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.executions[0].id, ids[4]);
    assert_eq!(page.executions[1].id, ids[3]);

    filter.page = 3;
    let page = store.list_executions(filter.clone()).await.unwrap();
    assert_eq!(page.executions.len(), 1);
    assert_eq!(page.executions[0].id, ids[0]);

    filter.page = 1;
    filter.limit = 10;
    filter.status = Some(ExecutionStatus::Processing);
    let page = store.list_executions(filter.clone()).await.unwrap();
    assert_eq!(page.total, 2);

    filter.status = Some(ExecutionStatus::Pending);
    assert_eq!(store.list_executions(filter).await.unwrap().total, 3);

    let other_client = ExecutionFilter::for_client("client_b");
    assert_eq!(store.list_executions(other_client).await.unwrap().total, 0);
}

#[tokio::test]
async fn reclaim_stale_requeues_then_fails() {
    let store = MemoryStore::new();
    let retryable = store
        .create_execution(new_execution("wf", 2))
        .await
        .unwrap()
        .record()
        .id;
    let exhausted = store
        .create_execution(new_execution("wf", 0))
        .await
        .unwrap()
        .record()
        .id;
    store.claim_execution(retryable, 0).await.unwrap();
    store.claim_execution(exhausted, 0).await.unwrap();

    let grace = Duration::from_secs(5);
    let not_yet = store.reclaim_stale(Utc::now(), grace, 10).await.unwrap();
    assert!(not_yet.is_empty());

    let later = Utc::now() + chrono::Duration::seconds(60);
    let reclaimed = store.reclaim_stale(later, grace, 10).await.unwrap();
    assert_eq!(reclaimed.len(), 2);

    let requeued = reclaimed.iter().find(|r| r.record.id == retryable).unwrap();
    assert_eq!(requeued.outcome, ReclaimOutcome::Requeued);
    assert_eq!(requeued.record.retry_count, 1);
    assert_eq!(requeued.record.status, ExecutionStatus::Pending);

    let lost = reclaimed.iter().find(|r| r.record.id == exhausted).unwrap();
    assert_eq!(lost.outcome, ReclaimOutcome::Failed);
    assert_eq!(lost.record.status, ExecutionStatus::Failed);
    assert_eq!(
        lost.record.error_detail.as_deref(),
        Some(ExecutionFailure::WORKER_LOST)
    );
}

#[tokio::test]
async fn events_are_read_in_order_after_cursor() {
    let store = MemoryStore::new();
    let id = store
        .create_execution(new_execution("wf", 3))
        .await
        .unwrap()
        .record()
        .id;
    for t in ["execution.queued", "execution.started", "execution.completed"] {
        store
            .append_event(NewEvent {
                execution_id: id,
                event_type: t.to_string(),
                payload: json!({}),
            })
            .await
            .unwrap();
    }

    let all = store.get_events_after(id, 0, 100).await.unwrap();
    assert_eq!(all.len(), 3);
    let rest = store.get_events_after(id, all[0].id, 100).await.unwrap();
    assert_eq!(rest[0].event_type, "execution.started");
    assert_eq!(rest.len(), 2);
}
