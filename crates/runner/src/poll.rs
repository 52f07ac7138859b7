use core::{future::Future, time::Duration};
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, instrument};

/// Errors returned by [`poll_until`].
#[derive(Debug, thiserror::Error)]
pub enum PollError<E> {
    /// The condition was not met within the attempt or time budget.
    #[error("condition not met after {attempts} attempts over {elapsed:?}")]
    Timeout {
        /// Number of checks performed.
        attempts: u32,
        /// Time spent polling.
        elapsed: Duration,
    },
    /// A check failed. Checks are not retried.
    #[error("check failed: {0}")]
    Check(#[source] E),
}

/// Backoff and budget for waiting on an external state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay after the first unsuccessful check.
    pub initial_interval: Duration,
    /// Factor applied to the delay after each unsuccessful check.
    pub multiplier: u32,
    /// Upper bound on the delay between checks.
    pub max_interval: Duration,
    /// Maximum number of checks.
    pub max_attempts: u32,
    /// Upper bound on the total time spent polling.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PollConfig {
    /// Poll every 3 seconds, doubling up to 30 seconds, for at most 40
    /// checks or 10 minutes.
    pub const fn new() -> Self {
        Self {
            initial_interval: Duration::from_secs(3),
            multiplier: 2,
            max_interval: Duration::from_secs(30),
            max_attempts: 40,
            timeout: Duration::from_secs(600),
        }
    }

    /// Set the initial interval.
    pub const fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Set the backoff multiplier.
    pub const fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the maximum interval.
    pub const fn with_max_interval(mut self, interval: Duration) -> Self {
        self.max_interval = interval;
        self
    }

    /// Set the maximum number of checks.
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the overall timeout.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The delay before check number `attempt + 1`, where `attempt` starts at
    /// 1.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1).saturating_pow(attempt.saturating_sub(1));
        self.initial_interval.saturating_mul(factor).min(self.max_interval)
    }
}

/// Run `check` until it yields a value, backing off exponentially between
/// checks.
///
/// Fails with [`PollError::Timeout`] once the attempt cap is reached, the
/// next delay would cross the timeout, or a check is still running when the
/// timeout expires. Errors from `check` are returned immediately.
#[instrument(skip_all, fields(max_attempts = config.max_attempts))]
pub async fn poll_until<T, E, F, Fut>(config: &PollConfig, mut check: F) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let start = Instant::now();
    let deadline = start + config.timeout;
    let mut attempts = 0;

    loop {
        attempts += 1;
        let Ok(outcome) = timeout_at(deadline, check()).await else {
            debug!(attempts, "check still running at the deadline");
            return Err(PollError::Timeout { attempts, elapsed: start.elapsed() });
        };
        if let Some(value) = outcome.map_err(PollError::Check)? {
            debug!(attempts, "condition met");
            return Ok(value);
        }

        let elapsed = start.elapsed();
        let delay = config.delay_after(attempts);
        if attempts >= config.max_attempts || elapsed + delay > config.timeout {
            return Err(PollError::Timeout { attempts, elapsed });
        }

        debug!(attempts, ?delay, "condition not met, waiting");
        sleep(delay).await;
    }
}
