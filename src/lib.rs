pub mod models;
pub mod provider;
pub mod pipeline;
pub mod export;
pub mod api;
pub mod error;
pub mod logging;
pub mod retry;
pub mod config;

pub use error::{CheckerError, Result};
pub use logging::{LogContext, PerformanceMonitor, ErrorLogger, MetricsLogger};
pub use retry::{RetryManager, RetryConfig};
pub use config::{AppConfig, ProviderConfig, ExportConfig, ApiConfig, LoggingConfig};
pub use models::{validate_address, Address, PricedToken, TokenRecord};
pub use provider::AlchemyClient;
pub use pipeline::{BagChecker, BagReport};
