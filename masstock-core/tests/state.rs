use chrono::{Duration, Utc};
use masstock_core::types::duration_between;
use masstock_core::wire::ExecutionView;
use masstock_core::{
    can_transition, ExecutionFailure, ExecutionRecord, ExecutionStatus, Transition,
};
use serde_json::json;
use uuid::Uuid;

use ExecutionStatus::*;

#[test]
fn terminal_states_have_no_exits() {
    for from in [Completed, Failed] {
        for to in [Pending, Processing, Completed, Failed] {
            assert!(!can_transition(from, to), "{from} -> {to} must be illegal");
        }
    }
}

#[test]
fn allowed_transitions() {
    assert!(can_transition(Pending, Processing));
    assert!(can_transition(Processing, Completed));
    assert!(can_transition(Processing, Failed));
    assert!(can_transition(Processing, Pending));
    assert!(can_transition(Pending, Failed));
    assert!(!can_transition(Pending, Completed));
}

#[test]
fn transition_check_reports_source_and_target() {
    let err = Transition::Complete.check(Pending).unwrap_err();
    assert_eq!(err.from, Pending);
    assert_eq!(err.to, Completed);
    assert_eq!(Transition::Cancel.check(Processing).unwrap(), Failed);
}

#[test]
fn status_round_trips_through_str() {
    for s in [Pending, Processing, Completed, Failed] {
        assert_eq!(s.as_str().parse::<ExecutionStatus>().unwrap(), s);
    }
    assert!("queued".parse::<ExecutionStatus>().is_err());
}

fn record(status: ExecutionStatus, retry_count: i32) -> ExecutionRecord {
    let now = Utc::now();
    ExecutionRecord {
        id: Uuid::new_v4(),
        workflow_id: "wf".into(),
        client_id: "c".into(),
        status,
        input_data: json!({}),
        output_data: None,
        error_message: None,
        error_detail: None,
        retry_count,
        max_retries: 3,
        timeout_seconds: 60,
        idempotency_key: None,
        created_at: now,
        updated_at: now,
        claimed_at: None,
        started_at: None,
        completed_at: None,
        duration_seconds: None,
    }
}

#[test]
fn pending_retry_reports_processing() {
    assert_eq!(record(Pending, 0).reported_status(), Pending);
    assert_eq!(record(Pending, 1).reported_status(), Processing);
    assert_eq!(record(Failed, 1).reported_status(), Failed);
}

#[test]
fn view_exposes_error_only_when_failed() {
    let mut r = record(Failed, 0);
    let f = ExecutionFailure::cancelled();
    r.error_message = Some(f.message.clone());
    r.error_detail = f.detail.clone();
    assert!(r.is_cancelled());

    let view = ExecutionView::from(&r);
    assert!(view.output_data.is_none());
    assert_eq!(view.error.unwrap().detail.as_deref(), Some("cancelled"));

    let json = serde_json::to_value(ExecutionView::from(&record(Pending, 0))).unwrap();
    assert_eq!(json["status"], "pending");
    assert!(json.get("error").is_none());
    assert!(json.get("output_data").is_none());
}

#[test]
fn duration_prefers_started_at() {
    let created = Utc::now();
    let started = created + Duration::seconds(2);
    let done = created + Duration::milliseconds(4500);
    assert_eq!(duration_between(Some(started), created, done), 2.5);
    assert_eq!(duration_between(None, created, done), 4.5);
}
