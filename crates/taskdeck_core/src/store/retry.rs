//! Bounded retry decorator for shared task stores.
//!
//! Wraps any [`TaskGateway`] and retries calls that fail with a transient
//! error, sleeping with exponential backoff between attempts. Non-transient
//! failures are returned on the first attempt.

use super::{GatewayResult, TaskGateway};
use crate::model::task::Task;
use log::warn;
use std::time::Duration;

/// Backoff settings: `delay(n) = base_delay * multiplier^n` for retry `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `0` disables retrying.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            multiplier: 2.0,
        }
    }

    /// Policy that never retries.
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `retry` (0-indexed).
    pub fn delay_for(&self, retry: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    /// Three retries starting at one second.
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Gateway decorator that retries transient failures.
pub struct RetryingGateway<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: TaskGateway> RetryingGateway<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    fn run<T>(
        &self,
        op: &'static str,
        mut call: impl FnMut(&G) -> GatewayResult<T>,
    ) -> GatewayResult<T> {
        let mut retry = 0;
        loop {
            match call(&self.inner) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && retry < self.policy.max_retries => {
                    let delay = self.policy.delay_for(retry);
                    warn!(
                        "event=store_retry module=store backend={} op={op} status=retrying attempt={} delay_ms={} error={err}",
                        self.inner.backend_name(),
                        retry + 1,
                        delay.as_millis()
                    );
                    std::thread::sleep(delay);
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl<G: TaskGateway> TaskGateway for RetryingGateway<G> {
    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    fn load_all(&self) -> GatewayResult<Vec<Task>> {
        self.run("load_all", |inner| inner.load_all())
    }

    fn save_all(&self, tasks: &[Task]) -> GatewayResult<()> {
        self.run("save_all", |inner| inner.save_all(tasks))
    }
}

#[cfg(test)]
mod tests {
    use super::RetryPolicy;
    use std::time::Duration;

    #[test]
    fn default_policy_doubles_from_one_second() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn huge_exponents_saturate() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(200), Duration::MAX);
        assert_eq!(policy.delay_for(u32::MAX), Duration::MAX);
        assert_eq!(RetryPolicy::disabled().delay_for(5), Duration::ZERO);
    }

    #[test]
    fn zero_base_delay_never_sleeps() {
        let policy = RetryPolicy::new(2000, Duration::ZERO);
        assert_eq!(policy.delay_for(1100), Duration::ZERO);
        assert_eq!(policy.delay_for(u32::MAX), Duration::ZERO);
    }
}
