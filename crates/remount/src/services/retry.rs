//! Retry policy for acquiring privileged service handles.

use std::time::Duration;

use remount_common::{RemountError, RemountResult};

/// How long to keep trying to reach a service that is not up yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts.
    pub interval: Duration,
    /// Give up after this many attempts; `None` waits forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    /// Poll every two seconds with no bound. The tool runs interactively
    /// and the service is expected to come up eventually.
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Policy that tries `attempts` times without sleeping.
    #[must_use]
    pub const fn immediate(attempts: u32) -> Self {
        Self {
            interval: Duration::ZERO,
            max_attempts: Some(attempts),
        }
    }

    /// Set the attempt bound.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Call `connect` until it yields a handle or the bound is reached.
    pub fn acquire<T>(
        &self,
        service: &str,
        mut connect: impl FnMut() -> Option<T>,
    ) -> RemountResult<T> {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            if let Some(handle) = connect() {
                return Ok(handle);
            }
            if self.max_attempts.is_some_and(|max| attempt >= max) {
                return Err(RemountError::service(
                    service,
                    format!("not available after {attempt} attempts"),
                ));
            }
            tracing::debug!(service, attempt, "Waiting for service");
            if !self.interval.is_zero() {
                std::thread::sleep(self.interval);
            }
        }
    }
}
