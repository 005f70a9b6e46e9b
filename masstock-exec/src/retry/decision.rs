use std::time::Duration;

use crate::generator::GenerationError;
use crate::retry::config::RetryConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter { delay: Duration, reason: RetryReason },
    Stop { reason: RetryReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    NotRetryable,
    AttemptsExhausted,
    Timeout,
    TransientFailure,
    RetryAfterHint,
}

impl RetryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryReason::NotRetryable => "not_retryable",
            RetryReason::AttemptsExhausted => "attempts_exhausted",
            RetryReason::Timeout => "timeout",
            RetryReason::TransientFailure => "transient_failure",
            RetryReason::RetryAfterHint => "retry_after",
        }
    }
}

/// Decide whether a failed attempt gets another try and how long to wait.
///
/// - `retry_count`: retries already used by the execution (0 on the first attempt).
/// - `max_retries`: retry budget snapshotted on the record.
/// - `rand_u64`: RNG for full jitter.
pub fn decide_retry(
    cfg: &RetryConfig,
    retry_count: i32,
    max_retries: i32,
    error: &GenerationError,
    rand_u64: impl Fn() -> u64,
) -> RetryDecision {
    if !error.is_retryable() {
        return RetryDecision::Stop {
            reason: RetryReason::NotRetryable,
        };
    }

    if retry_count >= max_retries {
        return RetryDecision::Stop {
            reason: RetryReason::AttemptsExhausted,
        };
    }

    // A hint from the generation service wins over our own backoff.
    if let Some(delay) = error.retry_after() {
        return RetryDecision::RetryAfter {
            delay: clamp(delay, cfg.max_delay),
            reason: RetryReason::RetryAfterHint,
        };
    }

    // Exponential backoff: base * factor^retry_count, with full jitter.
    let exp = retry_count.max(0);
    let raw = (cfg.base_delay.as_millis() as f64) * cfg.factor.powi(exp);
    let raw_ms = raw.min(cfg.max_delay.as_millis() as f64).max(0.0) as u64;

    let jitter_ms = if raw_ms == 0 { 0 } else { rand_u64() % (raw_ms + 1) };
    let reason = match error {
        GenerationError::Timeout(_) => RetryReason::Timeout,
        _ => RetryReason::TransientFailure,
    };
    RetryDecision::RetryAfter {
        delay: Duration::from_millis(jitter_ms),
        reason,
    }
}

fn clamp(delay: Duration, max: Duration) -> Duration {
    if delay > max { max } else { delay }
}
