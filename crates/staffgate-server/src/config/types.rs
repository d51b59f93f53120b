//! Server configuration types.

use serde::{Deserialize, Serialize};
use staffgate_audit_capture::CaptureConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Main server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server binding configuration.
    pub server: ServerBindConfig,
    /// Session and token configuration.
    pub auth: AuthConfig,
    /// Audit pipeline configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Access policy source.
    #[serde(default)]
    pub access: AccessConfig,
    /// Demo data.
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Server binding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerBindConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Take the client address from `x-forwarded-for`. Enable only behind a
    /// proxy that overwrites the header.
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

impl ServerBindConfig {
    /// Parsed bind address, if host and port form one.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        format!("{}:{}", self.host, self.port).parse().ok()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Session carrier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret for bearer tokens.
    pub jwt_secret: String,
    /// Name of the cookie holding the session id.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// Lifetime of a server-side session.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

fn default_session_cookie() -> String {
    "sid".to_string()
}

fn default_session_ttl() -> u64 {
    12 * 60 * 60
}

impl AuthConfig {
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs.min(i64::MAX as u64) as i64)
    }
}

/// Audit writer and storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay")]
    pub retry_max_delay_ms: u64,
    /// SQLite database file. Entries are kept in memory when unset.
    pub sqlite_path: Option<PathBuf>,
}

fn default_buffer_size() -> usize {
    1024
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_base_delay() -> u64 {
    100
}

fn default_retry_max_delay() -> u64 {
    5_000
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
            retry_max_delay_ms: default_retry_max_delay(),
            sqlite_path: None,
        }
    }
}

impl AuditConfig {
    pub fn capture(&self) -> CaptureConfig {
        CaptureConfig {
            buffer_size: self.buffer_size,
            max_attempts: self.max_attempts,
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
            retry_max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }
}

/// Where role grants come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// YAML access policy. The built-in catalog is used when unset.
    pub policy_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Seed sample principals, facilities and sessions at startup.
    #[serde(default)]
    pub seed: bool,
}
