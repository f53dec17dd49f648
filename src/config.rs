//! Database connection settings.

use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

/// Loader configuration, read from a TOML file:
///
/// ```toml
/// [database]
/// host = "localhost"
/// port = 4200
/// user = "crate"
/// password = ""
/// timeout_seconds = 5
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
}

/// Settings for reaching the CrateDB HTTP endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_timeout() -> u64 {
    5
}

impl Config {
    /// Loads the config from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {}", path.display(), e))?;
        let config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {}", path.display(), e))?;
        Ok(config)
    }
}

impl DatabaseConfig {
    /// URL of the SQL endpoint this configuration points at.
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}/_sql", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [database]
        host = "db.internal"
        port = 4200
        user = "crate"
        password = "secret"
        timeout_seconds = 30
    "#;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 4200);
        assert_eq!(config.database.user, "crate");
        assert_eq!(config.database.timeout_seconds, 30);
    }

    #[test]
    fn test_timeout_defaults_when_omitted() {
        let toml = r#"
            [database]
            host = "localhost"
            port = 4200
            user = "crate"
            password = ""
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database.timeout_seconds, 5);
    }

    #[test]
    fn test_endpoint_url() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.database.endpoint(), "http://db.internal:4200/_sql");
    }

    #[test]
    fn test_missing_section_is_an_error() {
        assert!(toml::from_str::<Config>("host = \"localhost\"").is_err());
    }
}
