//! # Configuration Management for Crudhaus
//!
//! This crate provides centralized configuration structures for all Crudhaus components:
//! the pipeline defaults every request configuration falls back to, and the optional
//! PostgreSQL connection settings used by the SQL storage backend.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{AppConfig, DatabaseConfig, PipelineConfig};
//!
//! let config = AppConfig {
//!     pipeline: PipelineConfig::new(true, false, true),
//!     database: Some(
//!         DatabaseConfig::new("localhost", "myapp", "postgres")
//!             .password("password")
//!             .pool_size(1, 10),
//!     ),
//! };
//! assert!(config.validate().is_ok());
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [pipeline]
//! failed_to_find_is_error = true
//! use_projection = false
//! emit_signals = true
//!
//! [database]
//! host = "localhost"
//! port = 5432
//! database = "myapp"
//! username = "postgres"
//! password = "password"
//! min_connections = 1
//! max_connections = 10
//! connection_timeout_seconds = 30
//! idle_timeout_seconds = 600
//! max_lifetime_seconds = 3600
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from crudhaus.toml
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./crudhaus.toml";
const CONFIG_PATH_VAR: &str = "CRUDHAUS_CONFIG";
const PASSWORD_VAR: &str = "CRUDHAUS_DATABASE_PASSWORD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Defaults applied to every request configuration unless a profile overrides them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Selector matching nothing produces a FailedToFind error
    pub failed_to_find_is_error: bool,
    /// Get-family handlers project queries straight into the result type
    pub use_projection: bool,
    /// Emit change events after a successful commit
    pub emit_signals: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            failed_to_find_is_error: true,
            use_projection: false,
            emit_signals: true,
        }
    }
}

/// PostgreSQL connection settings
///
/// Only `host`, `database` and `username` are required in TOML; pool limits
/// and timeouts fall back to [`DatabaseConfig::default`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    /// Zero keeps connections for the lifetime of the pool
    pub max_lifetime_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 5432,
            database: String::new(),
            username: String::new(),
            password: String::new(),
            min_connections: 1,
            max_connections: 10,
            connection_timeout_seconds: 30,
            idle_timeout_seconds: 600,
            max_lifetime_seconds: 3600,
        }
    }
}

impl AppConfig {
    /// Load configuration from the TOML file named in .env or the default path
    pub fn load() -> Result<Self, ConfigError> {
        let config = {
            // A missing .env file is fine, the variable may come from the process environment
            match dotenvy::dotenv() {
                Ok(_) => {}
                Err(e) if e.not_found() => {}
                Err(e) => return Err(e.into()),
            }

            if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
                Self::from_file(&config_path)
            } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
                Self::from_file(DEFAULT_CONFIG_PATH)
            } else {
                Err(ConfigError::Invalid(format!(
                    "Config path must be specified in .env file as {} or in {} file",
                    CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH
                )))
            }
        }?;

        config.apply_env()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Take the database password from the environment when it is set there
    fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let (Some(database), Ok(password)) = (&mut self.database, env::var(PASSWORD_VAR)) {
            database.password = password;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.database {
            Some(database) => database.validate(),
            None => Ok(()),
        }
    }
}

impl PipelineConfig {
    /// Create a new pipeline configuration
    pub fn new(failed_to_find_is_error: bool, use_projection: bool, emit_signals: bool) -> Self {
        Self {
            failed_to_find_is_error,
            use_projection,
            emit_signals,
        }
    }
}

impl DatabaseConfig {
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            username: username.into(),
            ..Self::default()
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn pool_size(mut self, min_connections: u32, max_connections: u32) -> Self {
        self.min_connections = min_connections;
        self.max_connections = max_connections;
        self
    }

    pub fn timeouts(mut self, connect: u64, idle: u64, lifetime: u64) -> Self {
        self.connection_timeout_seconds = connect;
        self.idle_timeout_seconds = idle;
        self.max_lifetime_seconds = lifetime;
        self
    }

    /// Reports every problem at once, one per line
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (self.host.is_empty(), "database host is empty"),
            (self.port == 0, "database port is zero"),
            (self.database.is_empty(), "database name is empty"),
            (self.username.is_empty(), "database username is empty"),
            (self.max_connections == 0, "max_connections is zero"),
            (
                self.min_connections > self.max_connections,
                "min_connections exceeds max_connections",
            ),
            (
                self.connection_timeout_seconds == 0,
                "connection_timeout_seconds is zero",
            ),
        ];

        let problems: Vec<&str> = checks
            .iter()
            .filter(|(failed, _)| *failed)
            .map(|(_, problem)| *problem)
            .collect();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems.join("\n")))
        }
    }

    pub fn connection_string(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }
}
