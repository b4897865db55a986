use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use crate::error::ConfigError;

/// Name of the environment variable holding the provider API key
pub const API_KEY_ENV_VAR: &str = "ALCHEMY_API_KEY";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub export: ExportConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// NFT indexing provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the NFT API, without the API key segment
    pub base_url: String,
    /// Provider API key; usually supplied through ALCHEMY_API_KEY
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    /// Maximum number of attempts per request
    pub max_retries: u32,
    /// Initial retry delay in seconds
    pub retry_delay_seconds: u64,
    /// Maximum retry delay in seconds
    pub max_retry_delay_seconds: u64,
}

/// CSV export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory CSV files are written into
    pub output_dir: String,
}

/// Form UI server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Server port
    pub port: u16,
    /// Server host/bind address
    pub host: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://eth-mainnet.g.alchemy.com/nft/v2".to_string(),
            api_key: None,
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 1,
            max_retry_delay_seconds: 10,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: ".".to_string(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl ProviderConfig {
    /// The API key, or `MissingCredential` if none was configured.
    /// Called before any request is built so an absent key never ends up in a URL.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::MissingCredential(API_KEY_ENV_VAR.to_string())),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    /// Environment variables take precedence over file values
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parsing(e.to_string()))?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // Provider configuration
        if let Ok(api_key) = env::var(API_KEY_ENV_VAR) {
            self.provider.api_key = Some(api_key);
        }
        if let Ok(base_url) = env::var("ALCHEMY_BASE_URL") {
            self.provider.base_url = base_url;
        }
        if let Ok(timeout) = env::var("PROVIDER_TIMEOUT_SECONDS") {
            self.provider.timeout_seconds = timeout.parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "PROVIDER_TIMEOUT_SECONDS".to_string(),
                    value: timeout,
                })?;
        }
        if let Ok(retries) = env::var("PROVIDER_MAX_RETRIES") {
            self.provider.max_retries = retries.parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "PROVIDER_MAX_RETRIES".to_string(),
                    value: retries,
                })?;
        }

        // Export configuration
        if let Ok(output_dir) = env::var("EXPORT_OUTPUT_DIR") {
            self.export.output_dir = output_dir;
        }

        // API configuration
        if let Ok(port) = env::var("API_PORT") {
            self.api.port = port.parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "API_PORT".to_string(),
                    value: port,
                })?;
        }
        if let Ok(host) = env::var("API_HOST") {
            self.api.host = host;
        }

        // Logging configuration
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.provider.base_url.starts_with("http://") && !self.provider.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.provider.base_url.clone()));
        }

        if self.provider.timeout_seconds == 0 || self.provider.timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "provider.timeout_seconds".to_string(),
                value: self.provider.timeout_seconds.to_string(),
            });
        }

        if self.provider.max_retries == 0 || self.provider.max_retries > 20 {
            return Err(ConfigError::InvalidValue {
                key: "provider.max_retries".to_string(),
                value: self.provider.max_retries.to_string(),
            });
        }

        if self.provider.retry_delay_seconds > self.provider.max_retry_delay_seconds {
            return Err(ConfigError::InvalidValue {
                key: "provider.retry_delay_seconds".to_string(),
                value: self.provider.retry_delay_seconds.to_string(),
            });
        }

        if self.export.output_dir.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "export.output_dir".to_string(),
                value: self.export.output_dir.clone(),
            });
        }

        if self.api.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api.port".to_string(),
                value: self.api.port.to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        let config = Self::default();
        toml::to_string_pretty(&config)
            .map_err(|e| ConfigError::Parsing(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider.base_url, "https://eth-mainnet.g.alchemy.com/nft/v2");
        assert_eq!(config.provider.timeout_seconds, 30);
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.export.output_dir, ".");
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.provider.base_url = "invalid-url".to_string();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.provider.timeout_seconds = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.provider.max_retries = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_api_key() {
        let mut provider = ProviderConfig::default();
        assert!(matches!(
            provider.require_api_key(),
            Err(ConfigError::MissingCredential(ref var)) if var == API_KEY_ENV_VAR
        ));

        provider.api_key = Some("   ".to_string());
        assert!(provider.require_api_key().is_err());

        provider.api_key = Some("demo-key".to_string());
        assert_eq!(provider.require_api_key().unwrap(), "demo-key");
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        env::set_var("ALCHEMY_API_KEY", "env-key");
        env::set_var("ALCHEMY_BASE_URL", "http://localhost:9000/nft/v2");
        env::set_var("PROVIDER_TIMEOUT_SECONDS", "5");
        env::set_var("API_PORT", "9090");
        env::set_var("LOG_LEVEL", "debug");

        let mut config = AppConfig::default();
        config.apply_env_overrides().unwrap();

        assert_eq!(config.provider.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.provider.base_url, "http://localhost:9000/nft/v2");
        assert_eq!(config.provider.timeout_seconds, 5);
        assert_eq!(config.api.port, 9090);
        assert_eq!(config.logging.level, "debug");

        env::remove_var("ALCHEMY_API_KEY");
        env::remove_var("ALCHEMY_BASE_URL");
        env::remove_var("PROVIDER_TIMEOUT_SECONDS");
        env::remove_var("API_PORT");
        env::remove_var("LOG_LEVEL");
    }

    #[test]
    #[serial]
    fn test_invalid_env_values() {
        env::set_var("PROVIDER_TIMEOUT_SECONDS", "invalid");

        let mut config = AppConfig::default();
        let result = config.apply_env_overrides();

        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::InvalidValue { .. }));

        env::remove_var("PROVIDER_TIMEOUT_SECONDS");
    }

    #[test]
    #[serial]
    fn test_config_file_loading() {
        let config_content = r#"
[provider]
base_url = "https://polygon-mainnet.g.alchemy.com/nft/v2"
api_key = "file-key"
timeout_seconds = 45
max_retries = 2
retry_delay_seconds = 1
max_retry_delay_seconds = 5

[export]
output_dir = "/tmp/bags"

[api]
port = 3000
host = "0.0.0.0"

[logging]
level = "warn"
format = "json"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut temp_file, config_content.as_bytes()).unwrap();

        env::set_var("CONFIG_FILE", temp_file.path().to_str().unwrap());

        let config = AppConfig::load_from_file().unwrap();

        assert_eq!(config.provider.base_url, "https://polygon-mainnet.g.alchemy.com/nft/v2");
        assert_eq!(config.provider.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.provider.timeout_seconds, 45);
        assert_eq!(config.provider.max_retries, 2);
        assert_eq!(config.export.output_dir, "/tmp/bags");
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "json");

        env::remove_var("CONFIG_FILE");
    }

    #[test]
    fn test_generate_sample_config() {
        let sample = AppConfig::generate_sample_config().unwrap();
        assert!(sample.contains("[provider]"));
        assert!(sample.contains("[export]"));
        assert!(sample.contains("[api]"));
        assert!(sample.contains("[logging]"));
        assert!(!sample.contains("api_key"));
    }
}
