use std::time::Duration;

/// Largest exponent applied to the backoff unit.
const MAX_BACKOFF_EXPONENT: u32 = 10;

/// Node-local retry policy.
///
/// Attempts are 0-indexed. After failed attempt `a` the caller sleeps
/// `delay_for(a)` = `backoff_unit * 2^a` before attempt `a + 1`, so the
/// observed delays are 1, 2, 4 ... units. No jitter is added.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Build a policy from an agent's `retry_count`. Zero still means one attempt.
    pub fn new(retry_count: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: retry_count.max(1),
            backoff_unit,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.pow(attempt.min(MAX_BACKOFF_EXPONENT));
        self.backoff_unit * factor
    }

    /// Whether another attempt follows failed attempt `attempt`.
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff_unit, Duration::from_secs(1));
    }

    #[test]
    fn test_delay_is_exponential() {
        let policy = RetryPolicy::new(4, Duration::from_secs(1));
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
    }

    #[test]
    fn test_delay_strictly_increasing() {
        let policy = RetryPolicy::new(10, Duration::from_millis(5));
        let delays: Vec<Duration> = (0..10).map(|a| policy.delay_for(a)).collect();
        assert!(delays.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_delay_exponent_capped() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        assert_eq!(policy.delay_for(50), Duration::from_millis(1024));
    }

    #[test]
    fn test_zero_retry_count_still_attempts_once() {
        let policy = RetryPolicy::new(0, Duration::from_millis(1));
        assert_eq!(policy.max_attempts, 1);
        assert!(!policy.has_next(0));
    }

    #[test]
    fn test_has_next() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        assert!(policy.has_next(0));
        assert!(policy.has_next(1));
        assert!(!policy.has_next(2));
    }
}
