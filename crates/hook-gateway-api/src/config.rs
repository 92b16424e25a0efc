//! Configuration types for the HTTP service
//!
//! Every field carries a serde default so an absent or partial configuration
//! still yields a runnable service.

use crate::errors::ConfigError;
use hook_gateway_core::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Webhook verification settings
    pub webhooks: WebhookConfig,

    /// Backoff applied to general event handlers
    pub retry: RetryConfig,

    /// Tenant management service
    pub tenant: TenantConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be non-zero".to_string(),
            });
        }

        if self.server.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be non-zero".to_string(),
            });
        }

        self.retry.validate()?;

        url::Url::parse(&self.tenant.base_url).map_err(|e| ConfigError::Invalid {
            message: format!("tenant.base_url '{}' is not a valid URL: {}", self.tenant.base_url, e),
        })?;

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Webhook verification configuration
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WebhookConfig {
    /// Shared HMAC secret; empty disables signature verification
    pub secret: String,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secret = if self.secret.is_empty() {
            "<EMPTY>"
        } else {
            "<REDACTED>"
        };
        f.debug_struct("WebhookConfig")
            .field("secret", &secret)
            .finish()
    }
}

/// Exponential backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub initial_interval_ms: u64,
    pub multiplier: f64,
    pub max_interval_seconds: u64,

    /// Total time budget for one delivery
    pub max_elapsed_seconds: u64,

    /// Jitter as a fraction of the current interval
    pub randomization_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            initial_interval_ms: policy.initial_interval.as_millis() as u64,
            multiplier: policy.multiplier,
            max_interval_seconds: policy.max_interval.as_secs(),
            max_elapsed_seconds: policy.max_elapsed_time.as_secs(),
            randomization_factor: policy.randomization_factor,
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "retry.initial_interval_ms must be non-zero".to_string(),
            });
        }

        let initial = Duration::from_millis(self.initial_interval_ms);
        let max = Duration::from_secs(self.max_interval_seconds);
        if max < initial {
            return Err(ConfigError::Invalid {
                message: format!(
                    "retry.max_interval_seconds ({:?}) must not be below retry.initial_interval_ms ({:?})",
                    max, initial
                ),
            });
        }

        if !(self.multiplier > 0.0) {
            return Err(ConfigError::Invalid {
                message: format!("retry.multiplier must be positive, got {}", self.multiplier),
            });
        }

        if self.max_elapsed_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "retry.max_elapsed_seconds must be non-zero".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.randomization_factor) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "retry.randomization_factor must be within [0, 1], got {}",
                    self.randomization_factor
                ),
            });
        }

        Ok(())
    }

    /// Convert to the policy used by the retry loop
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_secs(self.max_elapsed_seconds))
            .with_initial_interval(Duration::from_millis(self.initial_interval_ms))
            .with_multiplier(self.multiplier)
            .with_max_interval(Duration::from_secs(self.max_interval_seconds))
            .with_randomization_factor(self.randomization_factor)
    }
}

/// Tenant management service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantConfig {
    /// Base URL of the tenant service
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl TenantConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
