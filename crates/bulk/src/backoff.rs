use std::{fmt::Debug, time::Duration};

/// Backoff schedule between attempts of a failing commit.
///
/// A schedule is stateless: the delay is a function of the number of
/// failed attempts so far and the time spent since the first attempt, so
/// one schedule can be shared by every worker.
pub trait Backoff: Send + Sync + Debug {
    /// Delay to wait after `failures` failed attempts, or `None` to stop
    /// retrying. `failures` starts at 1.
    fn next_backoff(&self, failures: u32, elapsed: Duration) -> Option<Duration>;
}

/// Never retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopBackoff;

impl Backoff for StopBackoff {
    fn next_backoff(&self, _failures: u32, _elapsed: Duration) -> Option<Duration> {
        None
    }
}

/// Fixed delay between attempts.
#[derive(Debug, Clone, Copy)]
pub struct ConstantBackoff {
    pub interval: Duration,
    /// Total attempts, the first one included. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl ConstantBackoff {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }
}

impl Backoff for ConstantBackoff {
    fn next_backoff(&self, failures: u32, _elapsed: Duration) -> Option<Duration> {
        if exhausted(self.max_attempts, failures) {
            return None;
        }
        Some(self.interval)
    }
}

/// Exponentially growing delay with optional jitter.
///
/// The n-th delay is `initial_interval * multiplier^(n-1)`, capped at
/// `max_interval`, then spread by `randomization_factor` in both
/// directions. Retrying stops once `max_attempts` attempts were made or
/// `max_elapsed_time` has passed, whichever comes first.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
    /// Fraction in `0.0..=1.0`; `0.0` disables jitter.
    pub randomization_factor: f64,
    pub max_attempts: Option<u32>,
    pub max_elapsed_time: Option<Duration>,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(100),
            multiplier: 2.0,
            max_interval: Duration::from_secs(30),
            randomization_factor: 0.1,
            max_attempts: Some(5),
            max_elapsed_time: Some(Duration::from_secs(5 * 60)),
        }
    }
}

impl ExponentialBackoff {
    /// Delay before jitter is applied.
    fn base_delay(&self, failures: u32) -> f64 {
        let exponent = failures.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay = self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent);
        delay.min(self.max_interval.as_secs_f64())
    }
}

impl Backoff for ExponentialBackoff {
    fn next_backoff(&self, failures: u32, elapsed: Duration) -> Option<Duration> {
        if exhausted(self.max_attempts, failures) {
            return None;
        }
        if self.max_elapsed_time.is_some_and(|max| elapsed >= max) {
            return None;
        }

        let mut delay = self.base_delay(failures);

        let factor = self.randomization_factor.clamp(0.0, 1.0);
        if factor > 0.0 {
            let delta = factor * delay;
            delay = delay - delta + rand::random::<f64>() * 2.0 * delta;
        }

        if !delay.is_finite() || delay <= 0.0 {
            return Some(Duration::ZERO);
        }
        Some(Duration::from_secs_f64(delay))
    }
}

fn exhausted(max_attempts: Option<u32>, failures: u32) -> bool {
    max_attempts.is_some_and(|max| failures >= max)
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
