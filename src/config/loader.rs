//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

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

/// Environment variables that override file settings.
pub const ENV_DATABASE_URL: &str = "DIALOGUES_DATABASE_URL";
pub const ENV_DB_HOST: &str = "DIALOGUES_DB_HOST";
pub const ENV_DB_USER: &str = "DIALOGUES_DB_USER";
pub const ENV_DB_PASSWORD: &str = "DIALOGUES_DB_PASSWORD";
pub const ENV_DB_NAME: &str = "DIALOGUES_DB_NAME";
pub const ENV_BIND_ADDRESS: &str = "DIALOGUES_BIND_ADDRESS";

/// Load configuration from an optional TOML file, apply environment
/// overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply overrides looked up through `lookup` (normally the process environment).
pub fn apply_overrides<F>(config: &mut ServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_DATABASE_URL) {
        config.database.url = Some(url);
    }
    if let Some(host) = lookup(ENV_DB_HOST) {
        config.database.host = host;
    }
    if let Some(user) = lookup(ENV_DB_USER) {
        config.database.user = user;
    }
    if let Some(password) = lookup(ENV_DB_PASSWORD) {
        config.database.password = password;
    }
    if let Some(name) = lookup(ENV_DB_NAME) {
        config.database.name = name;
    }
    if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [listener]
            bind_address = "127.0.0.1:9001"

            [database]
            url = "sqlite://dialogues.db?mode=rwc"
            bootstrap_schema = true
            "#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9001");
        assert!(config.database.bootstrap_schema);
    }

    #[test]
    fn test_shipped_demo_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/dialogues.toml");
        let content = fs::read_to_string(path).unwrap();
        let config: ServiceConfig = toml::from_str(&content).unwrap();

        assert_eq!(config.database.name, "w4153");
        assert_eq!(config.tasks.write_delay_ms, 10_000);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_file_reports_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nmax_page_size = 0").unwrap();

        match load_config(Some(file.path())) {
            Err(ConfigError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.field == "api.max_page_size"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listener\nbind_address =").unwrap();
        assert!(matches!(load_config(Some(file.path())), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DB_PASSWORD, "from-env"),
            (ENV_DB_HOST, "10.0.0.5"),
            (ENV_BIND_ADDRESS, "127.0.0.1:7000"),
        ]);
        let mut config = ServiceConfig::default();
        apply_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.database.password, "from-env");
        assert_eq!(config.database.host, "10.0.0.5");
        assert_eq!(config.listener.bind_address, "127.0.0.1:7000");
        assert!(config.database.url.is_none());
    }
}
