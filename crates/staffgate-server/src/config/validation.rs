//! Configuration validation.

use super::types::ServerConfig;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid JWT secret: must be at least 32 characters")]
    InvalidJwtSecret,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid session cookie name")]
    InvalidSessionCookie,

    #[error("Audit buffer size must be greater than zero")]
    ZeroAuditBuffer,

    #[error("Audit write attempts must be greater than zero")]
    ZeroAuditAttempts,

    #[error("Audit retry delays are inverted: base {base_ms}ms > max {max_ms}ms")]
    InvertedRetryDelays { base_ms: u64, max_ms: u64 },
}

/// Validate server configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.auth.jwt_secret.len() < 32 {
        errors.push(ConfigError::InvalidJwtSecret);
    }

    if config.server.port == 0 || config.server.socket_addr().is_none() {
        errors.push(ConfigError::InvalidBindAddress(format!(
            "{}:{}",
            config.server.host, config.server.port
        )));
    }

    let cookie = &config.auth.session_cookie;
    if cookie.is_empty() || cookie.contains(|c: char| c == ';' || c == '=' || c.is_whitespace()) {
        errors.push(ConfigError::InvalidSessionCookie);
    }

    if config.audit.buffer_size == 0 {
        errors.push(ConfigError::ZeroAuditBuffer);
    }

    if config.audit.max_attempts == 0 {
        errors.push(ConfigError::ZeroAuditAttempts);
    }

    if config.audit.retry_base_delay_ms > config.audit.retry_max_delay_ms {
        errors.push(ConfigError::InvertedRetryDelays {
            base_ms: config.audit.retry_base_delay_ms,
            max_ms: config.audit.retry_max_delay_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl ServerConfig {
    /// Validate this configuration.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        validate_config(self)
    }
}
