//! Configuration loading utilities.

use super::types::ServerConfig;
use super::validation::validate_config;
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing::info;

/// Load configuration from layered sources.
pub struct ConfigLoader {
    config_path: Option<String>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: "STAFFGATE".to_string(),
        }
    }

    /// Set config file path.
    pub fn with_config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Set environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration: embedded defaults, then the optional file, then
    /// `<PREFIX>__SECTION__KEY` environment variables.
    pub fn load(&self) -> Result<ServerConfig> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            include_str!("defaults.toml"),
            config::FileFormat::Toml,
        ));

        if let Some(path) = &self.config_path {
            if Path::new(path).exists() {
                info!(path = %path, "Loading config file");
                builder = builder.add_source(config::File::with_name(path));
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and validate configuration from the environment.
pub fn load_config() -> Result<ServerConfig> {
    let mut loader = ConfigLoader::new();
    if let Ok(path) = std::env::var("CONFIG_PATH") {
        loader = loader.with_config_path(path);
    }

    let config = loader.load()?;
    validate_config(&config).map_err(|errors| {
        let joined = errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
        anyhow!("Invalid configuration: {joined}")
    })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 9191\n\n[auth]\njwt_secret = \"0123456789abcdef0123456789abcdef\"\n\n[audit]\nmax_attempts = 2"
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_env_prefix("STAFFGATE_LOADER_TEST")
            .with_config_path(file.path().to_string_lossy())
            .load()
            .unwrap();

        assert_eq!(config.server.port, 9191);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.session_cookie, "sid");
        assert_eq!(config.audit.max_attempts, 2);
        assert_eq!(config.audit.buffer_size, 1024);
        assert!(config.audit.sqlite_path.is_none());
        assert!(!config.demo.seed);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ConfigLoader::new()
            .with_env_prefix("STAFFGATE_LOADER_TEST_MISSING")
            .with_config_path("/nonexistent/staffgate.toml")
            .load()
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(!config.server.trust_forwarded_for);
        assert!(config.auth.jwt_secret.is_empty());
    }
}
