//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::TrackerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `backend.url`.
pub const ENV_BACKEND_URL: &str = "TRACKER_BACKEND_URL";
/// Environment variable overriding `backend.anon_key`.
pub const ENV_BACKEND_ANON_KEY: &str = "TRACKER_BACKEND_ANON_KEY";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<TrackerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load from `path` when given, otherwise start from defaults. Environment
/// overrides and validation apply either way.
pub fn load_or_default(path: Option<&Path>) -> Result<TrackerConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => default_config_with(env_lookup),
    }
}

/// Parse, apply environment overrides and validate configuration text.
pub fn parse_config(content: &str) -> Result<TrackerConfig, ConfigError> {
    parse_config_with(content, env_lookup)
}

/// Like [`parse_config`], reading overrides through `lookup`.
pub fn parse_config_with<F>(content: &str, lookup: F) -> Result<TrackerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config: TrackerConfig = toml::from_str(content)?;
    finish(config, lookup)
}

/// Defaults plus overrides read through `lookup`, validated.
pub fn default_config_with<F>(lookup: F) -> Result<TrackerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    finish(TrackerConfig::default(), lookup)
}

fn finish<F>(mut config: TrackerConfig, lookup: F) -> Result<TrackerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Overlay backend credentials from the environment.
///
/// Empty values are ignored so an exported-but-blank variable does not
/// wipe a value from the file.
pub fn apply_env_overrides<F>(config: &mut TrackerConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.is_empty()) {
        config.backend.url = url;
    }
    if let Some(key) = lookup(ENV_BACKEND_ANON_KEY).filter(|v| !v.is_empty()) {
        config.backend.anon_key = key;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BackendMode;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.router.mount_id, "app");
        assert_eq!(config.backend.mode, BackendMode::Rest);
        assert_eq!(config.backend.storage_bucket, "strategy-attachments");
    }

    #[test]
    fn test_sections_are_parsed() {
        let config = parse_config(
            r#"
            [backend]
            mode = "memory"
            timeout_secs = 3

            [router]
            mount_id = "root"
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.mode, BackendMode::Memory);
        assert_eq!(config.backend.timeout_secs, 3);
        assert_eq!(config.router.mount_id, "root");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = parse_config("[router]\nmount_id = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = TrackerConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            ENV_BACKEND_URL => Some("https://project.example.co".to_string()),
            ENV_BACKEND_ANON_KEY => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.backend.url, "https://project.example.co");
        assert!(config.backend.anon_key.is_empty());
    }

    fn credentials(key: &str) -> Option<String> {
        match key {
            ENV_BACKEND_URL => Some("https://project.example.co".to_string()),
            ENV_BACKEND_ANON_KEY => Some("anon-key".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_defaults_pick_up_env_credentials() {
        let config = default_config_with(credentials).unwrap();
        assert_eq!(config.backend.mode, BackendMode::Rest);
        assert_eq!(config.backend.url, "https://project.example.co");
        assert_eq!(config.backend.anon_key, "anon-key");
    }

    #[test]
    fn test_defaults_validate_env_credentials() {
        let err = default_config_with(|key| {
            (key == ENV_BACKEND_URL).then(|| "not a url".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_file_values_yield_to_env() {
        let config = parse_config_with(
            "[backend]\nurl = \"https://file.example.co\"\n",
            credentials,
        )
        .unwrap();
        assert_eq!(config.backend.url, "https://project.example.co");
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = load_or_default(None).unwrap();
        assert_eq!(config.router.mount_id, "app");
    }
}
