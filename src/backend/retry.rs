use std::thread;
use std::time::Duration;

use crate::config::RetrySettings;
use crate::errors::Result;

/// Fixed-delay retry for idempotent reads. Only failures reported as
/// retryable (no response, 5xx, 429) are attempted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(settings.max_retries, settings.delay())
    }

    /// Single attempt, used for writes.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn run<T, F>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let mut attempt = 0;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        request = label,
                        attempt,
                        max_retries = self.max_retries,
                        error = %err,
                        "retrying request"
                    );
                    if !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::OnboardingError;

    #[test]
    fn retries_transient_failures_up_to_the_limit() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let mut calls = 0;
        let result: Result<()> = policy.run("countries", || {
            calls += 1;
            Err(OnboardingError::network(Some(503), "unavailable"))
        });
        assert!(result.is_err());
        assert_eq!(calls, 4);
    }

    #[test]
    fn stops_on_success() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let mut calls = 0;
        let value = policy
            .run("token", || {
                calls += 1;
                if calls < 3 {
                    Err(OnboardingError::network(None, "timeout"))
                } else {
                    Ok(calls)
                }
            })
            .unwrap();
        assert_eq!(value, 3);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let mut calls = 0;
        let _ = policy.run::<(), _>("plans", || {
            calls += 1;
            Err(OnboardingError::network(Some(404), "missing"))
        });
        assert_eq!(calls, 1);
    }
}
