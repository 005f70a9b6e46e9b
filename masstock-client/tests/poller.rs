use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use masstock_client::{ClientError, PollError, PollOutcome, PollerConfig, StatusPoller, StatusSource};
use masstock_core::wire::{ExecutionErrorView, ExecutionView};
use masstock_core::ExecutionStatus;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Clone)]
enum Step {
    Status(ExecutionStatus),
    Fail(ClientError),
    Hang,
}

/// Replays a script of responses; the last step repeats forever.
#[derive(Clone)]
struct ScriptedSource {
    steps: Arc<Mutex<VecDeque<Step>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().unwrap()
        }
    }
}

#[async_trait]
impl StatusSource for ScriptedSource {
    async fn fetch(&self, execution_id: Uuid) -> Result<ExecutionView, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Status(status) => Ok(view(execution_id, status)),
            Step::Fail(e) => Err(e),
            Step::Hang => std::future::pending().await,
        }
    }
}

fn view(execution_id: Uuid, status: ExecutionStatus) -> ExecutionView {
    ExecutionView {
        execution_id,
        workflow_id: "wf-1".to_string(),
        status,
        retry_count: 0,
        timeout_seconds: 300,
        output_data: (status == ExecutionStatus::Completed)
            .then(|| serde_json::json!({ "images": ["a.png"] })),
        error: (status == ExecutionStatus::Failed).then(|| ExecutionErrorView {
            message: "Generation failed".to_string(),
            detail: None,
        }),
        created_at: Utc::now(),
        started_at: None,
        completed_at: None,
        duration_seconds: None,
    }
}

fn api_error(status: u16, retry_after: Option<Duration>) -> ClientError {
    ClientError::Api {
        status,
        code: "TEST".to_string(),
        message: "scripted".to_string(),
        violations: Vec::new(),
        retry_after,
    }
}

fn config(deadline_secs: u64) -> PollerConfig {
    PollerConfig {
        interval: Duration::from_secs(2),
        factor: 1.0,
        max_interval: Duration::from_secs(30),
        deadline: Duration::from_secs(deadline_secs),
    }
}

#[tokio::test(start_paused = true)]
async fn stops_at_completed() {
    let source = ScriptedSource::new(vec![
        Step::Status(ExecutionStatus::Pending),
        Step::Status(ExecutionStatus::Processing),
        Step::Status(ExecutionStatus::Completed),
    ]);
    let poller = StatusPoller::new(source.clone(), config(60));

    let start = Instant::now();
    let outcome = poller
        .poll(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap();

    match outcome {
        PollOutcome::Completed(v) => assert!(v.output_data.is_some()),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(source.calls(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn failed_execution_is_an_outcome_not_an_error() {
    let source = ScriptedSource::new(vec![
        Step::Status(ExecutionStatus::Processing),
        Step::Status(ExecutionStatus::Failed),
    ]);
    let poller = StatusPoller::new(source, config(60));

    let outcome = poller
        .poll(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap();

    match outcome {
        PollOutcome::Failed(v) => {
            assert_eq!(v.error.unwrap().message, "Generation failed");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn gives_up_at_deadline_with_last_status() {
    let source = ScriptedSource::new(vec![Step::Status(ExecutionStatus::Processing)]);
    let poller = StatusPoller::new(source.clone(), config(20));

    let start = Instant::now();
    let err = poller
        .poll(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        PollError::Timeout {
            elapsed,
            last_status,
        } => {
            assert_eq!(last_status, Some(ExecutionStatus::Processing));
            assert_eq!(elapsed, Duration::from_secs(20));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(start.elapsed(), Duration::from_secs(20));
    assert_eq!(source.calls(), 10);
}

#[tokio::test(start_paused = true)]
async fn hung_request_is_cut_off_by_deadline() {
    let source = ScriptedSource::new(vec![Step::Status(ExecutionStatus::Pending), Step::Hang]);
    let poller = StatusPoller::new(source, config(15));

    let start = Instant::now();
    let err = poller
        .poll(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PollError::Timeout {
            last_status: Some(ExecutionStatus::Pending),
            ..
        }
    ));
    assert_eq!(start.elapsed(), Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_further_requests() {
    let source = ScriptedSource::new(vec![Step::Status(ExecutionStatus::Processing)]);
    let poller = StatusPoller::new(source.clone(), config(60));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let outcome = poller.poll(Uuid::new_v4(), &cancel).await.unwrap();

    assert_eq!(outcome, PollOutcome::Cancelled);
    assert_eq!(start.elapsed(), Duration::from_secs(5));
    assert_eq!(source.calls(), 3);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(source.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn already_cancelled_token_makes_no_request() {
    let source = ScriptedSource::new(vec![Step::Status(ExecutionStatus::Processing)]);
    let poller = StatusPoller::new(source.clone(), config(60));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = poller.poll(Uuid::new_v4(), &cancel).await.unwrap();

    assert_eq!(outcome, PollOutcome::Cancelled);
    assert_eq!(source.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn transient_errors_are_retried() {
    let source = ScriptedSource::new(vec![
        Step::Fail(api_error(503, None)),
        Step::Fail(ClientError::Network("connection reset".to_string())),
        Step::Status(ExecutionStatus::Completed),
    ]);
    let poller = StatusPoller::new(source.clone(), config(60));

    let outcome = poller
        .poll(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(outcome, PollOutcome::Completed(_)));
    assert_eq!(source.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn retry_after_hint_lengthens_the_wait() {
    let source = ScriptedSource::new(vec![
        Step::Fail(api_error(429, Some(Duration::from_secs(7)))),
        Step::Status(ExecutionStatus::Completed),
    ]);
    let poller = StatusPoller::new(source, config(60));

    let start = Instant::now();
    poller
        .poll(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(start.elapsed(), Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn not_found_stops_immediately() {
    let source = ScriptedSource::new(vec![Step::Fail(api_error(404, None))]);
    let poller = StatusPoller::new(source.clone(), config(60));
    let id = Uuid::new_v4();

    let err = poller.poll(id, &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, PollError::NotFound(got) if got == id));
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn client_errors_are_not_retried() {
    let source = ScriptedSource::new(vec![Step::Fail(api_error(401, None))]);
    let poller = StatusPoller::new(source.clone(), config(60));

    let err = poller
        .poll(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PollError::Rejected(ref e) if e.status() == Some(401)));
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn reports_every_status_seen() {
    let source = ScriptedSource::new(vec![
        Step::Status(ExecutionStatus::Pending),
        Step::Status(ExecutionStatus::Processing),
        Step::Status(ExecutionStatus::Completed),
    ]);
    let poller = StatusPoller::new(source, config(60));

    let mut seen = Vec::new();
    poller
        .poll_with(Uuid::new_v4(), &CancellationToken::new(), |v| seen.push(v.status))
        .await
        .unwrap();

    assert_eq!(
        seen,
        vec![
            ExecutionStatus::Pending,
            ExecutionStatus::Processing,
            ExecutionStatus::Completed
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn backoff_grows_up_to_max_interval() {
    let source = ScriptedSource::new(vec![
        Step::Status(ExecutionStatus::Processing),
        Step::Status(ExecutionStatus::Processing),
        Step::Status(ExecutionStatus::Processing),
        Step::Status(ExecutionStatus::Completed),
    ]);
    let poller = StatusPoller::new(
        source,
        PollerConfig {
            interval: Duration::from_secs(1),
            factor: 2.0,
            max_interval: Duration::from_secs(3),
            deadline: Duration::from_secs(60),
        },
    );

    let start = Instant::now();
    poller
        .poll(Uuid::new_v4(), &CancellationToken::new())
        .await
        .unwrap();

    // 1 + 2 + 3
    assert_eq!(start.elapsed(), Duration::from_secs(6));
}

#[test]
fn deadline_covers_execution_timeout_plus_margin() {
    assert_eq!(
        PollerConfig::for_execution_timeout(300).deadline,
        Duration::from_secs(310)
    );
    assert_eq!(PollerConfig::default().deadline, Duration::from_secs(310));
}
