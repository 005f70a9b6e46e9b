use std::time::Duration;

use masstock_client::{ApiClient, PollError, PollOutcome, PollerConfig, StatusPoller};
use uuid::Uuid;

use crate::exit_codes;
use crate::output::{print_error, print_view, report_client_error};
use crate::utils::{api_client, parse_execution_id, shutdown_token};
use crate::{ApiArgs, OutputArgs, PollArgs};

pub async fn wait_cmd(execution_id: &str, poll: PollArgs, api: ApiArgs, output: OutputArgs) -> i32 {
    let execution_id = match parse_execution_id(execution_id) {
        Ok(id) => id,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };
    let client = match api_client(&api) {
        Ok(c) => c,
        Err(e) => {
            print_error(output.format, output.quiet, &e);
            return exit_codes::RUNTIME_ERROR;
        }
    };
    wait_for(client, execution_id, &poll, &output).await
}

/// `--timeout-secs` wins; otherwise the deadline covers the execution's own
/// timeout plus margin, or the default when it is unknown.
fn poller_config(poll: &PollArgs, execution_timeout: Option<i32>) -> PollerConfig {
    let mut config = match execution_timeout {
        Some(secs) if secs > 0 => PollerConfig::for_execution_timeout(secs as u64),
        _ => PollerConfig::default(),
    };
    config.interval = Duration::from_millis(poll.poll_interval_ms.max(1));
    if let Some(secs) = poll.timeout_secs {
        config.deadline = Duration::from_secs(secs);
    }
    config
}

/// Polls until a terminal state and maps the outcome to an exit code.
/// Ctrl-C stops polling only; the execution keeps running.
pub async fn wait_for(
    client: ApiClient,
    execution_id: Uuid,
    poll: &PollArgs,
    output: &OutputArgs,
) -> i32 {
    let execution_timeout = match poll.timeout_secs {
        Some(_) => None,
        // A failed lookup is retried or reported by the poller itself.
        None => client
            .get_execution(execution_id)
            .await
            .ok()
            .map(|view| view.timeout_seconds),
    };
    let poller = StatusPoller::new(client, poller_config(poll, execution_timeout));
    let cancel = shutdown_token();
    let verbose = output.format.is_text() && !output.quiet;

    let mut last = None;
    let result = poller
        .poll_with(execution_id, &cancel, |view| {
            if verbose && last != Some(view.status) {
                eprintln!("{execution_id}: {}", view.status);
            }
            last = Some(view.status);
        })
        .await;

    match result {
        Ok(PollOutcome::Completed(view)) => {
            print_view(output.format, output.quiet, &view);
            exit_codes::SUCCESS
        }
        Ok(PollOutcome::Failed(view)) => {
            print_view(output.format, output.quiet, &view);
            exit_codes::EXECUTION_FAILED
        }
        Ok(PollOutcome::Cancelled) => {
            print_error(
                output.format,
                output.quiet,
                &format!("stopped waiting; execution {execution_id} continues on the server"),
            );
            exit_codes::INTERRUPTED
        }
        Err(e @ PollError::Timeout { .. }) => {
            print_error(output.format, output.quiet, &e.to_string());
            exit_codes::POLL_TIMEOUT
        }
        Err(e @ PollError::NotFound(_)) => {
            print_error(output.format, output.quiet, &e.to_string());
            exit_codes::RUNTIME_ERROR
        }
        Err(PollError::Rejected(e)) => report_client_error(output.format, output.quiet, &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll_args(timeout_secs: Option<u64>) -> PollArgs {
        PollArgs {
            poll_interval_ms: 500,
            timeout_secs,
        }
    }

    #[test]
    fn deadline_follows_execution_timeout() {
        let config = poller_config(&poll_args(None), Some(60));
        assert_eq!(config.deadline, Duration::from_secs(70));
        assert_eq!(config.interval, Duration::from_millis(500));
    }

    #[test]
    fn explicit_timeout_overrides_execution_timeout() {
        let config = poller_config(&poll_args(Some(5)), Some(60));
        assert_eq!(config.deadline, Duration::from_secs(5));
    }

    #[test]
    fn unknown_execution_timeout_uses_default_deadline() {
        let config = poller_config(&poll_args(None), None);
        assert_eq!(config.deadline, PollerConfig::default().deadline);
    }
}
