use log::{info, warn, error, debug, trace};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Structured logging context for the bag checker
pub struct LogContext {
    pub component: String,
    pub operation: String,
    pub metadata: HashMap<String, Value>,
}

impl LogContext {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn with_address(self, address: &str) -> Self {
        self.with_metadata("address", json!(address))
    }

    pub fn with_contract(self, contract_address: &str) -> Self {
        self.with_metadata("contract_address", json!(contract_address))
    }

    pub fn with_query(self, query: &str) -> Self {
        self.with_metadata("query", json!(query))
    }

    pub fn with_page_number(self, page_number: usize) -> Self {
        self.with_metadata("page_number", json!(page_number))
    }

    pub fn with_duration_ms(self, duration_ms: u64) -> Self {
        self.with_metadata("duration_ms", json!(duration_ms))
    }

    pub fn with_retry_count(self, retry_count: u32) -> Self {
        self.with_metadata("retry_count", json!(retry_count))
    }

    pub fn with_error_code(self, error_code: &str) -> Self {
        self.with_metadata("error_code", json!(error_code))
    }

    fn format_message(&self, level: &str, message: &str) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut log_entry = json!({
            "timestamp": timestamp,
            "level": level,
            "component": self.component,
            "operation": self.operation,
            "message": message,
        });

        for (key, value) in &self.metadata {
            log_entry[key] = value.clone();
        }

        log_entry.to_string()
    }

    pub fn info(&self, message: &str) {
        info!("{}", self.format_message("INFO", message));
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", self.format_message("WARN", message));
    }

    pub fn error(&self, message: &str) {
        error!("{}", self.format_message("ERROR", message));
    }

    pub fn debug(&self, message: &str) {
        debug!("{}", self.format_message("DEBUG", message));
    }

    pub fn trace(&self, message: &str) {
        trace!("{}", self.format_message("TRACE", message));
    }
}

/// Performance monitoring utilities
pub struct PerformanceMonitor {
    pub start_time: SystemTime,
    operation: String,
    metadata: HashMap<String, Value>,
}

impl PerformanceMonitor {
    pub fn new(operation: &str) -> Self {
        Self {
            start_time: SystemTime::now(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn elapsed_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or_default()
            .as_millis() as u64
    }

    pub fn finish(self) -> u64 {
        let duration = self.elapsed_ms();

        let mut context = LogContext::new("performance", &self.operation)
            .with_duration_ms(duration);

        for (key, value) in self.metadata {
            context = context.with_metadata(&key, value);
        }

        context.debug(&format!("Operation completed in {}ms", duration));
        duration
    }

    pub fn finish_with_result<T, E>(self, result: &Result<T, E>) -> u64
    where
        E: std::fmt::Display
    {
        let duration = self.elapsed_ms();

        let mut context = LogContext::new("performance", &self.operation)
            .with_duration_ms(duration);

        for (key, value) in self.metadata {
            context = context.with_metadata(&key, value);
        }

        match result {
            Ok(_) => {
                context.debug(&format!("Operation completed successfully in {}ms", duration));
            }
            Err(e) => {
                context = context.with_metadata("error", json!(e.to_string()));
                context.warn(&format!("Operation failed after {}ms: {}", duration, e));
            }
        }

        duration
    }
}

/// Error logging utilities
pub struct ErrorLogger;

impl ErrorLogger {
    pub fn log_error(error: &crate::error::CheckerError, context: Option<LogContext>) {
        let severity = error.severity();
        let is_recoverable = error.is_recoverable();
        let retry_delay = error.retry_delay();

        let mut log_context = context.unwrap_or_else(|| LogContext::new("error", "unknown"));
        log_context = log_context
            .with_metadata("error_type", json!(format!("{:?}", error)))
            .with_metadata("severity", json!(format!("{:?}", severity)))
            .with_metadata("recoverable", json!(is_recoverable));

        if let Some(delay) = retry_delay {
            log_context = log_context.with_metadata("retry_delay_seconds", json!(delay));
        }

        let message = format!("Error occurred: {}", error);

        match severity {
            crate::error::ErrorSeverity::Critical => log_context.error(&message),
            crate::error::ErrorSeverity::High => log_context.error(&message),
            crate::error::ErrorSeverity::Medium => log_context.warn(&message),
            crate::error::ErrorSeverity::Low => log_context.info(&message),
        }
    }

    pub fn log_recovery_attempt(error: &crate::error::CheckerError, attempt: u32, max_attempts: u32) {
        let context = LogContext::new("recovery", "retry_attempt")
            .with_retry_count(attempt)
            .with_metadata("max_attempts", json!(max_attempts))
            .with_metadata("error_type", json!(format!("{:?}", error)));

        if attempt == max_attempts {
            context.error(&format!("Final retry attempt failed: {}", error));
        } else {
            context.warn(&format!("Retry attempt {} of {}: {}", attempt, max_attempts, error));
        }
    }

    pub fn log_recovery_success(operation: &str, attempts: u32, total_duration_ms: u64) {
        let context = LogContext::new("recovery", "success")
            .with_metadata("operation", json!(operation))
            .with_retry_count(attempts)
            .with_duration_ms(total_duration_ms);

        context.info(&format!("Operation recovered after {} attempts in {}ms", attempts, total_duration_ms));
    }
}

/// Per-session metrics
pub struct MetricsLogger;

impl MetricsLogger {
    pub fn log_page_fetched(query: &str, page_number: usize, token_count: usize, has_next: bool) {
        let context = LogContext::new("metrics", "page_fetched")
            .with_query(query)
            .with_page_number(page_number)
            .with_metadata("token_count", json!(token_count))
            .with_metadata("has_next", json!(has_next));

        context.info(&format!("Fetched page {} of {} query with {} tokens", page_number, query, token_count));
    }

    pub fn log_provider_call(endpoint: &str, duration_ms: u64, success: bool) {
        let context = LogContext::new("metrics", "provider_call")
            .with_metadata("endpoint", json!(endpoint))
            .with_duration_ms(duration_ms)
            .with_metadata("success", json!(success));

        if success {
            context.debug(&format!("Provider call {} completed in {}ms", endpoint, duration_ms));
        } else {
            context.warn(&format!("Provider call {} failed after {}ms", endpoint, duration_ms));
        }
    }

    pub fn log_price_lookup(contract_address: &str, duration_ms: u64, quoted: bool) {
        let context = LogContext::new("metrics", "price_lookup")
            .with_contract(contract_address)
            .with_duration_ms(duration_ms)
            .with_metadata("quoted", json!(quoted));

        context.debug(&format!("Floor price lookup for {} took {}ms", contract_address, duration_ms));
    }

    pub fn log_bag_summary(address: &str, clean_count: usize, spam_count: usize, duration_ms: u64) {
        let context = LogContext::new("metrics", "bag_summary")
            .with_address(address)
            .with_metadata("clean_count", json!(clean_count))
            .with_metadata("spam_count", json!(spam_count))
            .with_duration_ms(duration_ms);

        context.info(&format!("Bag for {}: {} clean, {} spam", address, clean_count, spam_count));
    }
}

/// Initialize structured logging for the application
pub fn init_logging(config: &crate::config::LoggingConfig) {
    let env = env_logger::Env::default().default_filter_or(config.level.as_str());
    let pretty = config.format == "pretty";

    // Ignore a second init, e.g. when tests share a process
    let _ = env_logger::Builder::from_env(env)
        .format(move |buf, record| {
            use std::io::Write;

            let line = record.args().to_string();
            if let Ok(json_value) = serde_json::from_str::<Value>(&line) {
                if pretty {
                    writeln!(buf, "{}", serde_json::to_string_pretty(&json_value)?)
                } else {
                    writeln!(buf, "{}", line)
                }
            } else {
                writeln!(
                    buf,
                    "{} [{}] {}: {}",
                    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    record.args()
                )
            }
        })
        .try_init();
}
