//! Retry policy for transient transport errors (spec §4.8: "retried on
//! transient transport errors up to 5 times with exponential backoff
//! (50 ms base, factor 2, jitter ±20%)").

use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: f64,
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(50),
            factor: 2.0,
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Delay before the given zero-indexed retry attempt, with ±`jitter`
    /// randomization applied around the exponential curve.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_secs_f64() * self.factor.powi(attempt as i32);
        let jittered = rand::thread_rng().gen_range((1.0 - self.jitter)..(1.0 + self.jitter));
        Duration::from_secs_f64((base * jittered).max(0.0))
    }
}

/// Run `op` up to `policy.max_attempts` times, sleeping between attempts
/// per `delay_for`, retrying only while `is_transient` returns true for the
/// returned error. The final failure (transient or not) is returned as-is.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, is_transient: impl Fn(&E) -> bool, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt + 1 < policy.max_attempts && is_transient(&err) => {
                tracing::warn!(attempt, "transient graph write error, retrying: {err}");
                tokio::time::sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn delay_grows_exponentially_within_jitter_bounds() {
        let policy = RetryPolicy::default();
        let d0 = policy.delay_for(0).as_secs_f64();
        let d2 = policy.delay_for(2).as_secs_f64();
        assert!(d0 <= 0.05 * 1.2 + f64::EPSILON);
        assert!(d2 >= 0.2 * 0.8 - f64::EPSILON);
    }

    #[tokio::test]
    async fn retries_until_success_within_budget() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            factor: 1.0,
            jitter: 0.0,
        };
        let calls = Cell::new(0);
        let result: Result<i32, &str> = with_retry(&policy, |_| true, || {
            calls.set(calls.get() + 1);
            async move { if calls.get() < 3 { Err("transient") } else { Ok(42) } }
        })
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn non_transient_error_does_not_retry() {
        let policy = RetryPolicy::default();
        let calls = Cell::new(0);
        let result: Result<i32, &str> = with_retry(&policy, |_| false, || {
            calls.set(calls.get() + 1);
            async move { Err("fatal") }
        })
        .await;
        assert_eq!(result, Err("fatal"));
        assert_eq!(calls.get(), 1);
    }
}
