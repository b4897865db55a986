use thiserror::Error;

/// Main error type for the NFT bag checker
#[derive(Error, Debug)]
pub enum CheckerError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Errors raised while talking to the NFT indexing provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {endpoint} failed with status {status}")]
    RequestFailed { status: u16, endpoint: String },

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Rate limit exceeded, retry after {seconds} seconds")]
    RateLimit { seconds: u64 },
}

/// Errors raised while reshaping provider responses into tables
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing credential: set {0} in the environment or config file")]
    MissingCredential(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
}

/// Input validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid address or ENS name: {0}")]
    InvalidAddress(String),
}

/// Errors raised while writing bags out
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid output name: {0}")]
    InvalidName(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CheckerError>;

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Errors that stop the program before any work is done
    Critical,
    /// Errors that lose data for the current request
    High,
    /// Errors that may resolve on their own
    Medium,
    /// Bad user input
    Low,
}

impl CheckerError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CheckerError::Config(_) => ErrorSeverity::Critical,

            CheckerError::Processing(_) => ErrorSeverity::High,
            CheckerError::Export(_) => ErrorSeverity::High,
            CheckerError::Provider(ProviderError::RequestFailed { status, .. })
                if *status == 401 || *status == 403 =>
            {
                ErrorSeverity::High
            }

            CheckerError::Provider(_) => ErrorSeverity::Medium,

            CheckerError::Validation(_) => ErrorSeverity::Low,
        }
    }

    /// Check if the error is transient and the request can be retried
    pub fn is_recoverable(&self) -> bool {
        match self {
            CheckerError::Provider(ProviderError::Timeout { .. }) => true,
            CheckerError::Provider(ProviderError::Connection(_)) => true,
            CheckerError::Provider(ProviderError::RateLimit { .. }) => true,
            CheckerError::Provider(ProviderError::RequestFailed { status, .. }) => *status >= 500,
            CheckerError::Provider(ProviderError::Http(e)) => e.is_timeout() || e.is_connect(),

            CheckerError::Config(_) => false,
            CheckerError::Validation(_) => false,
            CheckerError::Processing(_) => false,
            CheckerError::Export(_) => false,
        }
    }

    /// Get suggested retry delay in seconds for recoverable errors
    pub fn retry_delay(&self) -> Option<u64> {
        if !self.is_recoverable() {
            return None;
        }

        match self {
            CheckerError::Provider(ProviderError::RateLimit { seconds }) => Some(*seconds),
            CheckerError::Provider(ProviderError::Timeout { .. }) => Some(5),
            CheckerError::Provider(ProviderError::Connection(_)) => Some(10),
            _ => Some(2),
        }
    }

    /// True when the provider itself answered with a non-success status
    /// or could not be reached, i.e. the failure belongs to one query and
    /// not to the whole session.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, CheckerError::Provider(_))
    }
}
