//! Configuration for [`Quarry::from_config`](crate::Quarry::from_config).
//!
//! ```toml
//! database_url = "postgres://localhost/app"
//! max_connections = 10
//! log = ["query", "error"]
//! schema = "app"
//! camel_case = true
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::driver::PoolSettings;
use crate::error::{QuarryError, QuarryResult};
use crate::log::LogLevel;
use crate::transpiler::Dialect;

/// Overrides `database_url` from the file.
pub const DATABASE_URL_ENV: &str = "QUARRY_DATABASE_URL";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuarryConfig {
    pub database_url: Option<String>,

    /// Inferred from the URL when absent. When set it must agree with it.
    pub dialect: Option<Dialect>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default)]
    pub min_connections: u32,

    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    pub log: Option<Vec<LogLevel>>,

    /// Installs a `WithSchemaPlugin` for this schema.
    pub schema: Option<String>,

    /// Installs a `CamelCasePlugin`.
    #[serde(default)]
    pub camel_case: bool,
}

fn default_max_connections() -> u32 {
    PoolSettings::default().max_connections
}

fn default_acquire_timeout() -> u64 {
    PoolSettings::default().acquire_timeout.as_secs()
}

impl Default for QuarryConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            dialect: None,
            max_connections: default_max_connections(),
            min_connections: 0,
            acquire_timeout_secs: default_acquire_timeout(),
            log: None,
            schema: None,
            camel_case: false,
        }
    }
}

impl QuarryConfig {
    pub fn builder() -> QuarryConfigBuilder {
        QuarryConfigBuilder::default()
    }

    /// `<config dir>/quarry/config.toml`, e.g. `~/.config/quarry/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("quarry").join("config.toml"))
    }

    pub fn from_toml(source: &str) -> QuarryResult<Self> {
        toml::from_str(source).map_err(|e| QuarryError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> QuarryResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
            .map_err(|e| QuarryError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Reads `path`, or the default location when `path` is `None`. A
    /// missing default file yields the default configuration. The
    /// environment override is applied last.
    pub fn load(path: Option<&Path>) -> QuarryResult<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        Ok(config.with_env_override(std::env::var(DATABASE_URL_ENV).ok()))
    }

    fn with_env_override(self, url: Option<String>) -> Self {
        match url {
            Some(url) if !url.trim().is_empty() => Self {
                database_url: Some(url),
                ..self
            },
            _ => self,
        }
    }

    pub fn database_url(&self) -> QuarryResult<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            QuarryError::Config(format!(
                "no database url configured, set database_url or {}",
                DATABASE_URL_ENV
            ))
        })
    }

    /// The configured dialect, or the one implied by the URL.
    pub fn resolved_dialect(&self) -> QuarryResult<Dialect> {
        match (self.dialect, self.database_url.as_deref()) {
            (Some(dialect), _) => Ok(dialect),
            (None, Some(url)) => Dialect::from_url(url),
            (None, None) => Ok(Dialect::default()),
        }
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
        }
    }
}

#[derive(Debug, Default)]
pub struct QuarryConfigBuilder {
    config: QuarryConfig,
}

impl QuarryConfigBuilder {
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.config.dialect = Some(dialect);
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.config.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.config.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.config.acquire_timeout_secs = timeout.as_secs();
        self
    }

    pub fn log(mut self, levels: impl Into<Vec<LogLevel>>) -> Self {
        self.config.log = Some(levels.into());
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.config.schema = Some(schema.into());
        self
    }

    pub fn camel_case(mut self, enabled: bool) -> Self {
        self.config.camel_case = enabled;
        self
    }

    pub fn build(self) -> QuarryConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_toml() {
        let config = QuarryConfig::from_toml(
            r#"
            database_url = "sqlite::memory:"
            max_connections = 2
            log = ["query", "error"]
            schema = "app"
            camel_case = true
            "#,
        )
        .unwrap();

        assert_eq!(config.database_url().unwrap(), "sqlite::memory:");
        assert_eq!(config.resolved_dialect().unwrap(), Dialect::Sqlite);
        assert_eq!(config.log, Some(vec![LogLevel::Query, LogLevel::Error]));
        assert_eq!(config.schema.as_deref(), Some("app"));
        assert!(config.camel_case);
        assert_eq!(
            config.pool_settings(),
            PoolSettings {
                max_connections: 2,
                min_connections: 0,
                acquire_timeout: PoolSettings::default().acquire_timeout,
            }
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(
            QuarryConfig::from_toml("databse_url = \"x\""),
            Err(QuarryError::Config(_))
        ));
    }

    #[test]
    fn test_env_override() {
        let config = QuarryConfig::builder()
            .database_url("postgres://localhost/file")
            .build()
            .with_env_override(Some("mysql://localhost/env".to_string()));
        assert_eq!(config.database_url().unwrap(), "mysql://localhost/env");
        assert_eq!(config.resolved_dialect().unwrap(), Dialect::MySql);

        let untouched = QuarryConfig::default().with_env_override(Some("  ".to_string()));
        assert!(untouched.database_url().is_err());
    }

    #[test]
    fn test_builder() {
        let config = QuarryConfig::builder()
            .dialect(Dialect::MsSql)
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(3))
            .log([LogLevel::Error])
            .camel_case(true)
            .build();

        assert_eq!(config.resolved_dialect().unwrap(), Dialect::MsSql);
        assert_eq!(config.pool_settings().max_connections, 20);
        assert_eq!(config.pool_settings().acquire_timeout, Duration::from_secs(3));
        assert_eq!(config.log, Some(vec![LogLevel::Error]));
    }
}
