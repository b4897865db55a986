use std::time::Duration;
use tokio::time::sleep;
use crate::config::ProviderConfig;
use crate::error::{CheckerError, ProviderError};
use crate::logging::{LogContext, ErrorLogger, PerformanceMonitor};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Initial delay between retries in seconds
    pub initial_delay_seconds: u64,
    /// Maximum delay between retries in seconds
    pub max_delay_seconds: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Whether to add jitter to the delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_seconds: 1,
            max_delay_seconds: 10,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Retry settings for collection page requests, taken from the provider section
    pub fn for_pages(provider: &ProviderConfig) -> Self {
        Self {
            max_attempts: provider.max_retries,
            initial_delay_seconds: provider.retry_delay_seconds,
            max_delay_seconds: provider.max_retry_delay_seconds,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }

    /// Floor prices are best effort, so they get at most two attempts
    pub fn for_price_lookup(provider: &ProviderConfig) -> Self {
        Self {
            max_attempts: provider.max_retries.min(2),
            initial_delay_seconds: provider.retry_delay_seconds,
            max_delay_seconds: provider.max_retry_delay_seconds,
            backoff_multiplier: 1.5,
            jitter: false,
        }
    }

    /// A single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_seconds: 0,
            max_delay_seconds: 0,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }
}

/// Retry mechanism with exponential backoff and jitter
pub struct RetryManager {
    config: RetryConfig,
    operation_name: String,
}

impl RetryManager {
    pub fn new(operation_name: &str, config: RetryConfig) -> Self {
        Self {
            config,
            operation_name: operation_name.to_string(),
        }
    }

    /// Execute an operation, retrying recoverable errors
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, CheckerError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CheckerError>>,
    {
        let monitor = PerformanceMonitor::new(&format!("retry_{}", self.operation_name));
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        ErrorLogger::log_recovery_success(
                            &self.operation_name,
                            attempt,
                            monitor.elapsed_ms(),
                        );
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if !error.is_recoverable() {
                        let context = LogContext::new("retry", &self.operation_name)
                            .with_retry_count(attempt)
                            .with_metadata("reason", serde_json::json!("non_recoverable"));
                        context.debug(&format!("Non-recoverable error, not retrying: {}", error));
                        return Err(error);
                    }

                    ErrorLogger::log_recovery_attempt(&error, attempt, max_attempts);

                    if attempt >= max_attempts {
                        let context = LogContext::new("retry", &self.operation_name)
                            .with_metadata("max_attempts", serde_json::json!(max_attempts));
                        context.error(&format!("All {} attempts failed: {}", max_attempts, error));
                        return Err(error);
                    }

                    let delay = self.delay_for(&error, attempt);

                    let context = LogContext::new("retry", &self.operation_name)
                        .with_retry_count(attempt)
                        .with_metadata("delay_ms", serde_json::json!(delay.as_millis() as u64));
                    context.info(&format!("Retrying in {:.1} seconds (attempt {} of {})",
                        delay.as_secs_f64(), attempt, max_attempts));

                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Backoff for this attempt, stretched to the provider's `Retry-After` on a rate limit
    fn delay_for(&self, error: &CheckerError, attempt: u32) -> Duration {
        let backoff = self.calculate_delay(attempt);
        match error {
            CheckerError::Provider(ProviderError::RateLimit { seconds }) => {
                backoff.max(Duration::from_secs(*seconds))
            }
            _ => backoff,
        }
    }

    /// Calculate delay for the given attempt number
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_delay = self.config.initial_delay_seconds as f64;
        let exponential_delay = base_delay * self.config.backoff_multiplier.powi(attempt as i32 - 1);

        let capped_delay = exponential_delay.min(self.config.max_delay_seconds as f64);

        let final_delay = if self.config.jitter {
            let jitter_factor = 0.1; // 10% jitter
            let jitter = capped_delay * jitter_factor * (rand::random::<f64>() - 0.5);
            (capped_delay + jitter).max(0.0)
        } else {
            capped_delay
        };

        Duration::from_secs_f64(final_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, ProviderError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay_seconds: 0,
            max_delay_seconds: 0,
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_retry_config_presets() {
        let provider = ProviderConfig::default();

        let pages = RetryConfig::for_pages(&provider);
        assert_eq!(pages.max_attempts, provider.max_retries);
        assert!(pages.jitter);

        let prices = RetryConfig::for_price_lookup(&provider);
        assert_eq!(prices.max_attempts, 2);
        assert!(!prices.jitter);

        assert_eq!(RetryConfig::no_retry().max_attempts, 1);
    }

    #[tokio::test]
    async fn test_retry_manager_success_on_first_attempt() {
        let retry_manager = RetryManager::new("test_operation", instant_config(3));

        let result = retry_manager.execute(|| async {
            Ok::<i32, CheckerError>(42)
        }).await;

        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_manager_recovers_after_transient_errors() {
        let retry_manager = RetryManager::new("flaky", instant_config(3));
        let calls = AtomicU32::new(0);

        let result = retry_manager.execute(|| {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if call < 3 {
                    Err(CheckerError::Provider(ProviderError::RequestFailed {
                        status: 502,
                        endpoint: "getNFTs".to_string(),
                    }))
                } else {
                    Ok(call)
                }
            }
        }).await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_manager_gives_up_after_max_attempts() {
        let retry_manager = RetryManager::new("always_down", instant_config(2));
        let calls = AtomicU32::new(0);

        let result = retry_manager.execute(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(CheckerError::Provider(ProviderError::Timeout { seconds: 1 })) }
        }).await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_manager_non_recoverable_error() {
        let retry_manager = RetryManager::new("test_operation", instant_config(5));
        let calls = AtomicU32::new(0);

        let result = retry_manager.execute(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<i32, CheckerError>(CheckerError::Config(
                    ConfigError::MissingCredential("ALCHEMY_API_KEY".to_string())
                ))
            }
        }).await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_waits_for_retry_after() {
        let retry_manager = RetryManager::new("rate_limited", instant_config(2));
        let calls = AtomicU32::new(0);
        let started = std::time::Instant::now();

        let result = retry_manager.execute(|| {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 0 {
                    Err(CheckerError::Provider(ProviderError::RateLimit { seconds: 1 }))
                } else {
                    Ok(7)
                }
            }
        }).await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[test]
    fn test_rate_limit_delay_overrides_shorter_backoff() {
        let retry_manager = RetryManager::new("rate_limited", instant_config(3));
        let rate_limited = CheckerError::Provider(ProviderError::RateLimit { seconds: 4 });
        let timeout = CheckerError::Provider(ProviderError::Timeout { seconds: 1 });

        assert_eq!(retry_manager.delay_for(&rate_limited, 1), Duration::from_secs(4));
        assert_eq!(retry_manager.delay_for(&timeout, 1), Duration::ZERO);
    }

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay_seconds: 2,
            max_delay_seconds: 30,
            backoff_multiplier: 2.0,
            jitter: false,
        };

        let retry_manager = RetryManager::new("test", config);

        assert_eq!(retry_manager.calculate_delay(1).as_secs(), 2);
        assert_eq!(retry_manager.calculate_delay(2).as_secs(), 4);
        assert_eq!(retry_manager.calculate_delay(3).as_secs(), 8);
    }

    #[test]
    fn test_delay_calculation_with_max_cap() {
        let config = RetryConfig {
            max_attempts: 10,
            initial_delay_seconds: 5,
            max_delay_seconds: 20,
            backoff_multiplier: 3.0,
            jitter: false,
        };

        let retry_manager = RetryManager::new("test", config);

        // 5 * 3^4 = 405, capped at 20
        assert_eq!(retry_manager.calculate_delay(5).as_secs(), 20);
    }
}
