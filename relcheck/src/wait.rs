//! Polling until an external condition holds

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::errors::VerifyError;

/// Outcome of one evaluation of a poll predicate.
///
/// `value` and `error` are only looked at once `done` is set.
#[derive(Debug)]
pub struct PollResult<T> {
    pub done: bool,
    pub value: Option<T>,
    pub error: Option<VerifyError>,
}

impl<T> PollResult<T> {
    /// Not there yet, poll again
    pub fn pending() -> Self {
        Self {
            done: false,
            value: None,
            error: None,
        }
    }

    pub fn ready(value: T) -> Self {
        Self {
            done: true,
            value: Some(value),
            error: None,
        }
    }

    /// Stop polling and report `error`
    pub fn failed(error: VerifyError) -> Self {
        Self {
            done: true,
            value: None,
            error: Some(error),
        }
    }
}

/// How often and for how long to poll.
///
/// Both bounds are optional; with neither set the wait never gives up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitPolicy {
    pub interval: Duration,
    pub timeout: Option<Duration>,
    pub max_attempts: Option<u32>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: None,
            max_attempts: None,
        }
    }
}

impl WaitPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Evaluate `predicate` until it reports done, sleeping `policy.interval`
/// between evaluations with `sleep_fn`.
pub async fn wait_until<T, P, PF, S, SF>(
    mut predicate: P,
    policy: &WaitPolicy,
    sleep_fn: S,
) -> Result<T, VerifyError>
where
    P: FnMut() -> PF,
    PF: Future<Output = PollResult<T>>,
    S: Fn(Duration) -> SF,
    SF: Future<Output = ()>,
{
    let started = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let result = predicate().await;

        if result.done {
            debug!("Condition reached after {} attempts", attempts);
            return match (result.value, result.error) {
                (_, Some(error)) => Err(error),
                (Some(value), None) => Ok(value),
                (None, None) => Err(VerifyError::PollError(
                    "predicate finished without a value".to_string(),
                )),
            };
        }

        let elapsed = started.elapsed();
        let out_of_attempts = policy.max_attempts.is_some_and(|max| attempts >= max);
        let out_of_time = policy.timeout.is_some_and(|timeout| elapsed >= timeout);
        if out_of_attempts || out_of_time {
            info!("Giving up after {} attempts ({:?})", attempts, elapsed);
            return Err(VerifyError::Timeout { attempts, elapsed });
        }

        sleep_fn(policy.interval).await;
    }
}
