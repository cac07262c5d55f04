//! Hierarchical configuration for the blueprints server.
//!
//! # Hierarchy
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A YAML file, located via `BLUEPRINTS_CONFIG` (default `configuration/base.yml`).
//!    A missing file is skipped.
//! 3. Environment variables prefixed with `BLUEPRINTS_`, using `__` to reach
//!    nested keys (e.g. `BLUEPRINTS_SERVER__PORT=9000`).
//!
//! Later sources override earlier ones.

use anyhow::Context;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_PATH_ENV_VAR: &str = "BLUEPRINTS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "configuration/base.yml";
const ENV_PREFIX: &str = "BLUEPRINTS_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file; created on first start.
    pub path: PathBuf,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files. Logs go to stderr when unset.
    pub directory: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                path: PathBuf::from("blueprints.db"),
                max_connections: 8,
            },
            logging: LoggingConfig {
                level: blueprints_core::default_log_level().to_string(),
                directory: None,
            },
        }
    }
}

impl Config {
    /// Loads configuration from defaults, the YAML file and the environment.
    pub fn load() -> Result<Self, anyhow::Error> {
        let path = std::env::var(CONFIG_PATH_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        Self::figment(&path)
            .extract()
            .with_context(|| {
                format!(
                    "Failed to load hierarchical configuration (file `{}`)",
                    path.display()
                )
            })
    }

    /// Builds the provider stack without extracting it.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

impl ServerConfig {
    /// `host:port` string accepted by `TcpListener::bind`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use figment::Jail;
    use std::path::{Path, PathBuf};

    #[test]
    fn defaults_apply_when_file_is_missing() {
        Jail::expect_with(|_jail| {
            let config: Config = Config::figment(Path::new("missing.yml")).extract()?;
            assert_eq!(config, Config::default());
            assert_eq!(config.server.address(), "127.0.0.1:8080");
            Ok(())
        });
    }

    #[test]
    fn yaml_overrides_defaults_and_env_overrides_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "base.yml",
                "server:\n  port: 9000\ndatabase:\n  path: /var/lib/blueprints.db\n  max_connections: 2\n",
            )?;
            jail.set_env("BLUEPRINTS_SERVER__PORT", "9100");
            jail.set_env("BLUEPRINTS_LOGGING__LEVEL", "warn");

            let config: Config = Config::figment(Path::new("base.yml")).extract()?;
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.server.host, "127.0.0.1");
            assert_eq!(
                config.database.path,
                PathBuf::from("/var/lib/blueprints.db")
            );
            assert_eq!(config.database.max_connections, 2);
            assert_eq!(config.logging.level, "warn");
            assert_eq!(config.logging.directory, None);
            Ok(())
        });
    }
}
