// Wait - chained polling against a timeout budget
//
// Expresses "retry a predicate until satisfied or the budget runs out".
// One monotonic clock is started at construction and shared by every chained
// wait_for call, so the timeout bounds the whole chain, not each link.
//
// Predicates are async and fallible: a predicate returning Err aborts the
// wait and propagates, while a predicate that simply never turns true leaves
// the helper unsatisfied. Timeouts only become hard errors when a caller
// promotes them via ensure_satisfied.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant};

use crate::error::{Error, Result};

/// Default polling interval between predicate checks (1 second)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Polling helper with a fixed timeout budget and check interval.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use webquery::Wait;
///
/// let submitted = Wait::with_timeout(Duration::from_secs(10))
///     .wait_for(|| banner.exists())
///     .await?
///     .wait_for(|| spinner_gone())
///     .await?;
/// submitted.ensure_satisfied_with("form was never submitted")?;
/// ```
#[derive(Debug)]
pub struct Wait {
    timeout: Duration,
    poll_interval: Duration,
    started: Instant,
    satisfied: bool,
}

impl Wait {
    /// Creates a wait with the given timeout and the default 1 s interval.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_interval(timeout, DEFAULT_POLL_INTERVAL)
    }

    /// Creates a wait with an explicit timeout and polling interval.
    pub fn with_interval(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
            started: Instant::now(),
            satisfied: true,
        }
    }

    /// Polls the condition until it turns true or the budget is exhausted.
    ///
    /// No-op once the helper is unsatisfied, so later links of a chain are
    /// skipped after the first one times out. Between checks the call sleeps
    /// `min(remaining budget, poll interval)`; a condition that is already
    /// true returns without sleeping at all.
    pub async fn wait_for<F, Fut>(mut self, mut condition: F) -> Result<Self>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        if !self.satisfied {
            return Ok(self);
        }

        while !condition().await? {
            match self.timeout.checked_sub(self.started.elapsed()) {
                Some(remaining) if !remaining.is_zero() => {
                    time::sleep(remaining.min(self.poll_interval)).await;
                }
                _ => {
                    tracing::debug!(
                        timeout_ms = self.timeout.as_millis() as u64,
                        "wait budget exhausted before condition turned true"
                    );
                    self.satisfied = false;
                    break;
                }
            }
        }

        Ok(self)
    }

    /// Returns whether every waited-for condition turned true in time.
    pub fn is_satisfied(&self) -> bool {
        self.satisfied
    }

    /// Promotes an unsatisfied wait to a timeout error.
    pub fn ensure_satisfied(&self) -> Result<()> {
        self.ensure_satisfied_with("condition not satisfied within the allotted time")
    }

    /// Promotes an unsatisfied wait to a timeout error carrying `message`.
    pub fn ensure_satisfied_with(&self, message: &str) -> Result<()> {
        if self.satisfied {
            Ok(())
        } else {
            Err(Error::Timeout(message.to_string()))
        }
    }

    /// One-shot wait: polls the condition with the default interval.
    ///
    /// Equivalent to constructing a helper, waiting once, and reading
    /// `is_satisfied`.
    pub async fn spin_wait<F, Fut>(condition: F, timeout: Duration) -> Result<bool>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        Self::spin_wait_with_interval(condition, timeout, DEFAULT_POLL_INTERVAL).await
    }

    /// One-shot wait with an explicit polling interval.
    pub async fn spin_wait_with_interval<F, Fut>(
        condition: F,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<bool>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        Ok(Self::with_interval(timeout, poll_interval)
            .wait_for(condition)
            .await?
            .is_satisfied())
    }

    /// Runs the operation and reports success as a boolean.
    ///
    /// Any failure is suppressed and logged; use [`Wait::capture_failure`]
    /// when the cause matters.
    pub async fn try_run<F, Fut, T>(op: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        Self::capture_failure(op).await.is_none()
    }

    /// Runs the operation and returns the failure, if any.
    pub async fn capture_failure<F, Fut, T>(op: F) -> Option<Error>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match op().await {
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "suppressed failure");
                Some(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_poll_interval() {
        assert_eq!(DEFAULT_POLL_INTERVAL, Duration::from_secs(1));
    }

    #[test]
    fn test_new_wait_is_satisfied() {
        let wait = Wait::with_timeout(Duration::from_secs(1));
        assert!(wait.is_satisfied());
        assert!(wait.ensure_satisfied().is_ok());
    }
}
