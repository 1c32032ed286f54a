use std::{
    collections::HashSet,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use dorisload_client::ClientError;
use dorisload_runtime::DEFAULT_RETRY_STATUS_CODES;

use crate::backoff::{Backoff, ExponentialBackoff};

/// Passed to the notification hook after every failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryNotice {
    /// Number of the attempt that just failed, starting at 1.
    pub attempt: u32,
    /// Delay before the next attempt; `None` when this failure is final.
    pub next_delay: Option<Duration>,
}

impl RetryNotice {
    pub fn is_final(&self) -> bool {
        self.next_delay.is_none()
    }
}

/// Run `operation` until it succeeds, fails with an error rejected by
/// `is_retryable`, or `backoff` gives up.
///
/// `notify` sees every failed attempt, the final one included, before the
/// backoff sleep. The last error is returned.
pub fn retry_notify<T, E, F, P, N>(
    backoff: &dyn Backoff,
    mut operation: F,
    is_retryable: P,
    mut notify: N,
) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    P: Fn(&E) -> bool,
    N: FnMut(&E, RetryNotice),
{
    let start = Instant::now();
    let mut attempt = 0u32;

    loop {
        attempt = attempt.saturating_add(1);

        let err = match operation() {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let next_delay = if is_retryable(&err) {
            backoff.next_backoff(attempt, start.elapsed())
        } else {
            None
        };

        notify(
            &err,
            RetryNotice {
                attempt,
                next_delay,
            },
        );

        match next_delay {
            Some(delay) if !delay.is_zero() => thread::sleep(delay),
            Some(_) => {}
            None => return Err(err),
        }
    }
}

/// Backoff schedule plus the rules deciding which commit errors are
/// worth another attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    backoff: Arc<dyn Backoff>,
    retry_status_codes: HashSet<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Arc::new(ExponentialBackoff::default()))
    }
}

impl RetryPolicy {
    pub fn new(backoff: Arc<dyn Backoff>) -> Self {
        Self {
            backoff,
            retry_status_codes: DEFAULT_RETRY_STATUS_CODES.iter().copied().collect(),
        }
    }

    /// Replace the set of HTTP status codes that are retried. An empty set
    /// means no status error is retried.
    pub fn with_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retry_status_codes = codes.into_iter().collect();
        self
    }

    /// Errors carrying an HTTP status are retried when the code is listed;
    /// everything else when the client considers it transient.
    pub fn is_retryable(&self, err: &ClientError) -> bool {
        match err.status_code() {
            Some(code) => self.retry_status_codes.contains(&code),
            None => err.is_transient(),
        }
    }

    pub fn run<T, F, N>(&self, operation: F, notify: N) -> Result<T, ClientError>
    where
        F: FnMut() -> Result<T, ClientError>,
        N: FnMut(&ClientError, RetryNotice),
    {
        retry_notify(
            self.backoff.as_ref(),
            operation,
            |err| self.is_retryable(err),
            notify,
        )
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
