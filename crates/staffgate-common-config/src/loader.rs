//! Access policy file loading and parsing.

use crate::types::AccessPolicyConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Permission tokens are dot-separated `resource.action` segments.
static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*(\.[a-z][a-z0-9_]*)+$").expect("static pattern compiles")
});

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },
}

/// Check that a permission token is well-formed (`resource.action`).
pub fn is_valid_permission_token(token: &str) -> bool {
    TOKEN_PATTERN.is_match(token)
}

/// Load and validate an access policy file.
pub fn load_access_policy(path: impl AsRef<Path>) -> Result<AccessPolicyConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(path)?;
    parse_access_policy(&contents)
}

/// Parse and validate access policy YAML.
pub fn parse_access_policy(contents: &str) -> Result<AccessPolicyConfig, ConfigError> {
    let config: AccessPolicyConfig =
        serde_yaml::from_str(contents).map_err(|e| ConfigError::ParseError {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &AccessPolicyConfig) -> Result<(), ConfigError> {
    for (role, tokens) in &config.roles {
        if role.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "role tag must not be empty".to_string(),
            });
        }

        for token in tokens {
            if !is_valid_permission_token(token) {
                return Err(ConfigError::ValidationError {
                    message: format!("role '{role}' lists malformed permission token '{token}'"),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_valid_policy() {
        let config = parse_access_policy(
            r#"
roles:
  scheduler:
    - shifts.view
    - shifts.create
  viewer:
    - staff.view
"#,
        )
        .unwrap();

        assert_eq!(
            config.grants_for("scheduler").unwrap(),
            &["shifts.view".to_string(), "shifts.create".to_string()]
        );
        assert!(config.grants_for("employee").is_none());
    }

    #[test]
    fn test_token_validation() {
        assert!(is_valid_permission_token("shifts.create"));
        assert!(is_valid_permission_token("admin.impersonate"));
        assert!(is_valid_permission_token("time_off.requests.approve"));
        assert!(!is_valid_permission_token("shifts"));
        assert!(!is_valid_permission_token("shifts."));
        assert!(!is_valid_permission_token(".create"));
        assert!(!is_valid_permission_token("Shifts.Create"));
        assert!(!is_valid_permission_token("*"));
    }

    #[test]
    fn test_empty_document_has_no_roles() {
        let config = parse_access_policy("roles: {}\n").unwrap();
        assert!(config.roles.is_empty());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let err = parse_access_policy("roles:\n  viewer:\n    - ShiftsView\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_token_without_action_rejected() {
        let err = parse_access_policy("roles:\n  viewer:\n    - shifts\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        let err = parse_access_policy("grants: {}\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "roles:\n  contractor:\n    - shifts.view").unwrap();

        let config = load_access_policy(file.path()).unwrap();
        assert_eq!(config.roles.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = load_access_policy("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
