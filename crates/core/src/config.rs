//! Shared configuration loader module for Dining Gateway services
//!
//! Provides a unified configuration loading system with environment variable
//! parsing, validation, and support for .env files. All configuration uses
//! the `DINING_GATEWAY_` prefix for environment variables, with unprefixed
//! fallbacks (`DATABASE_URL`, `HOST`, `PORT`, `RUST_LOG`) for container
//! environments.
//!
//! Configuration override hierarchy: defaults < .env < environment.

use crate::error::DiningGatewayError;
use std::time::Duration;
use url::Url;

/// Configuration loader trait
///
/// Standardized methods for loading and validating configuration from
/// environment variables.
pub trait ConfigLoader: Sized {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if required variables are missing or
    /// values cannot be parsed.
    fn from_env() -> Result<Self, DiningGatewayError>;

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if any validation check fails.
    fn validate(&self) -> Result<(), DiningGatewayError>;
}

/// Database configuration
///
/// # Environment Variables
///
/// - `DINING_GATEWAY_DATABASE_URL` (required): PostgreSQL connection URL
/// - `DINING_GATEWAY_DATABASE_MAX_CONNECTIONS` (optional, default: 20)
/// - `DINING_GATEWAY_DATABASE_MIN_CONNECTIONS` (optional, default: 2)
/// - `DINING_GATEWAY_DATABASE_CONNECT_TIMEOUT` (optional, seconds, default: 30)
/// - `DINING_GATEWAY_DATABASE_IDLE_TIMEOUT` (optional, seconds, default: 600)
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle connection timeout duration
    pub idle_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/dining_gateway".to_string(),
            max_connections: 20,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl ConfigLoader for DatabaseConfig {
    fn from_env() -> Result<Self, DiningGatewayError> {
        let url = std::env::var("DINING_GATEWAY_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map_err(|_| DiningGatewayError::ConfigurationError {
                message: "DATABASE_URL or DINING_GATEWAY_DATABASE_URL must be set".to_string(),
                key: Some("DINING_GATEWAY_DATABASE_URL".to_string()),
            })?;

        let max_connections = parse_env_var(
            "DINING_GATEWAY_DATABASE_MAX_CONNECTIONS",
            DatabaseConfig::default().max_connections,
        )?;

        let min_connections = parse_env_var(
            "DINING_GATEWAY_DATABASE_MIN_CONNECTIONS",
            DatabaseConfig::default().min_connections,
        )?;

        let connect_timeout_secs = parse_env_var("DINING_GATEWAY_DATABASE_CONNECT_TIMEOUT", 30u64)?;

        let idle_timeout_secs = parse_env_var("DINING_GATEWAY_DATABASE_IDLE_TIMEOUT", 600u64)?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            idle_timeout: Duration::from_secs(idle_timeout_secs),
        })
    }

    fn validate(&self) -> Result<(), DiningGatewayError> {
        Url::parse(&self.url).map_err(|e| DiningGatewayError::ConfigurationError {
            message: format!("Invalid DATABASE_URL: {}", e),
            key: Some("DINING_GATEWAY_DATABASE_URL".to_string()),
        })?;

        if self.max_connections == 0 {
            return Err(DiningGatewayError::ConfigurationError {
                message: "max_connections must be greater than 0".to_string(),
                key: Some("DINING_GATEWAY_DATABASE_MAX_CONNECTIONS".to_string()),
            });
        }

        if self.min_connections > self.max_connections {
            return Err(DiningGatewayError::ConfigurationError {
                message: format!(
                    "min_connections ({}) cannot exceed max_connections ({})",
                    self.min_connections, self.max_connections
                ),
                key: Some("DINING_GATEWAY_DATABASE_MIN_CONNECTIONS".to_string()),
            });
        }

        if self.connect_timeout.as_secs() == 0 {
            return Err(DiningGatewayError::ConfigurationError {
                message: "connect_timeout must be greater than 0 seconds".to_string(),
                key: Some("DINING_GATEWAY_DATABASE_CONNECT_TIMEOUT".to_string()),
            });
        }

        if self.idle_timeout.as_secs() == 0 {
            return Err(DiningGatewayError::ConfigurationError {
                message: "idle_timeout must be greater than 0 seconds".to_string(),
                key: Some("DINING_GATEWAY_DATABASE_IDLE_TIMEOUT".to_string()),
            });
        }

        Ok(())
    }
}

/// Service configuration
///
/// # Environment Variables
///
/// - `DINING_GATEWAY_SERVICE_HOST` (optional, default: "0.0.0.0")
/// - `DINING_GATEWAY_SERVICE_PORT` (optional, default: 8083)
/// - `DINING_GATEWAY_SERVICE_WORKERS` (optional, default: CPU count)
/// - `DINING_GATEWAY_SERVICE_LOG_LEVEL` (optional, default: "info")
/// - `DINING_GATEWAY_SERVICE_REQUEST_TIMEOUT` (optional, seconds, default: 60)
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Service bind host
    pub host: String,
    /// Service bind port
    pub port: u16,
    /// Number of worker threads
    pub workers: usize,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Request timeout duration
    pub request_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8083,
            workers: num_cpus::get(),
            log_level: "info".to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ConfigLoader for ServiceConfig {
    fn from_env() -> Result<Self, DiningGatewayError> {
        let host = std::env::var("DINING_GATEWAY_SERVICE_HOST")
            .or_else(|_| std::env::var("HOST"))
            .unwrap_or_else(|_| ServiceConfig::default().host);

        let port = if std::env::var("DINING_GATEWAY_SERVICE_PORT").is_ok() {
            parse_env_var("DINING_GATEWAY_SERVICE_PORT", ServiceConfig::default().port)?
        } else {
            parse_env_var("PORT", ServiceConfig::default().port)?
        };

        let workers = parse_env_var(
            "DINING_GATEWAY_SERVICE_WORKERS",
            ServiceConfig::default().workers,
        )?;

        let log_level = std::env::var("DINING_GATEWAY_SERVICE_LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| ServiceConfig::default().log_level);

        let request_timeout_secs = parse_env_var("DINING_GATEWAY_SERVICE_REQUEST_TIMEOUT", 60u64)?;

        Ok(Self {
            host,
            port,
            workers,
            log_level,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    fn validate(&self) -> Result<(), DiningGatewayError> {
        if self.port == 0 {
            return Err(DiningGatewayError::ConfigurationError {
                message: "port must be greater than 0".to_string(),
                key: Some("DINING_GATEWAY_SERVICE_PORT".to_string()),
            });
        }

        if self.workers == 0 {
            return Err(DiningGatewayError::ConfigurationError {
                message: "workers must be greater than 0".to_string(),
                key: Some("DINING_GATEWAY_SERVICE_WORKERS".to_string()),
            });
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(DiningGatewayError::ConfigurationError {
                message: format!(
                    "Invalid log_level '{}'. Must be one of: {}",
                    self.log_level,
                    valid_log_levels.join(", ")
                ),
                key: Some("DINING_GATEWAY_SERVICE_LOG_LEVEL".to_string()),
            });
        }

        if self.request_timeout.as_secs() == 0 {
            return Err(DiningGatewayError::ConfigurationError {
                message: "request_timeout must be greater than 0 seconds".to_string(),
                key: Some("DINING_GATEWAY_SERVICE_REQUEST_TIMEOUT".to_string()),
            });
        }

        Ok(())
    }
}

/// Parse an environment variable with a default value
///
/// # Errors
///
/// Returns a `ConfigurationError` if the value is set but cannot be parsed.
fn parse_env_var<T>(key: &str, default: T) -> Result<T, DiningGatewayError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .ok()
        .map(|v| {
            v.parse::<T>()
                .map_err(|e| DiningGatewayError::ConfigurationError {
                    message: format!("Failed to parse {}: {}", key, e),
                    key: Some(key.to_string()),
                })
        })
        .unwrap_or(Ok(default))
}

/// Load .env file if present
///
/// Convenience wrapper around dotenvy; a missing .env file is not an error.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn set_test_env(key: &str, value: &str) {
        env::set_var(key, value);
    }

    fn clear_test_env(key: &str) {
        env::remove_var(key);
    }

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_database_config_from_env() {
        set_test_env("DINING_GATEWAY_DATABASE_URL", "postgresql://localhost/test");
        set_test_env("DINING_GATEWAY_DATABASE_MAX_CONNECTIONS", "50");
        set_test_env("DINING_GATEWAY_DATABASE_MIN_CONNECTIONS", "5");

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.url, "postgresql://localhost/test");
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.min_connections, 5);

        clear_test_env("DINING_GATEWAY_DATABASE_URL");
        clear_test_env("DINING_GATEWAY_DATABASE_MAX_CONNECTIONS");
        clear_test_env("DINING_GATEWAY_DATABASE_MIN_CONNECTIONS");
    }

    #[test]
    fn test_database_config_validation_invalid_url() {
        let config = DatabaseConfig {
            url: "not-a-valid-url".to_string(),
            ..DatabaseConfig::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            DiningGatewayError::ConfigurationError { .. }
        ));
    }

    #[test]
    fn test_database_config_validation_min_exceeds_max() {
        let config = DatabaseConfig {
            url: "postgresql://localhost/test".to_string(),
            min_connections: 30,
            max_connections: 20,
            ..DatabaseConfig::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_service_config_default() {
        let config = ServiceConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8083);
        assert_eq!(config.log_level, "info");
        assert!(config.workers > 0);
    }

    #[test]
    fn test_service_config_validation_invalid_log_level() {
        let config = ServiceConfig {
            log_level: "invalid".to_string(),
            ..ServiceConfig::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        match result.unwrap_err() {
            DiningGatewayError::ConfigurationError { message, .. } => {
                assert!(message.contains("Invalid log_level"));
            }
            _ => panic!("Expected ConfigurationError"),
        }
    }

    #[test]
    fn test_service_config_validation_zero_port() {
        let config = ServiceConfig {
            port: 0,
            ..ServiceConfig::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_env_var_with_default() {
        let result: u32 = parse_env_var("NON_EXISTENT_VAR", 42).unwrap();
        assert_eq!(result, 42);
    }

    #[test]
    fn test_parse_env_var_invalid_value() {
        set_test_env("TEST_INVALID_VAR", "not-a-number");
        let result: Result<u32, _> = parse_env_var("TEST_INVALID_VAR", 42);
        assert!(result.is_err());
        clear_test_env("TEST_INVALID_VAR");
    }
}
