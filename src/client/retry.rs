use crate::api::ApiError;
use std::time::Duration;
use tokio::time::sleep;

pub struct RetryPolicy {
    max_retries: u8,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u8, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn should_retry(&self, attempt: u8, error: &ApiError) -> bool {
        if attempt >= self.max_retries {
            return false;
        }

        error.is_retryable()
    }

    /// Exponential backoff: base, 2x base, 4x base, ...
    pub fn delay_for(&self, attempt: u8) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt as u32);
        self.base_delay.saturating_mul(multiplier)
    }

    pub async fn wait_before_retry(&self, attempt: u8) {
        let delay = self.delay_for(attempt);

        tracing::info!(
            "Retrying in {}ms (attempt {})",
            delay.as_millis(),
            attempt + 2
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_should_retry_respects_limit_and_kind() {
        let policy = RetryPolicy::new(1, Duration::from_millis(10));
        assert!(policy.should_retry(0, &ApiError::Timeout));
        assert!(!policy.should_retry(1, &ApiError::Timeout), "Limit reached");
        assert!(!policy.should_retry(0, &ApiError::Malformed("x".to_string())));
    }
}
