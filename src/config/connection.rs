//! Database connection configuration.
//!
//! Supports configuration via environment variables:
//! - `SCHEMASCOPE_DB_DRIVER`: Database driver (mysql, postgres, sqlite)
//! - `SCHEMASCOPE_DB_HOST`: Database server hostname
//! - `SCHEMASCOPE_DB_NAME`: Database name (file path for SQLite)
//! - `SCHEMASCOPE_DB_PORT`: Port (optional, uses driver default)
//! - `SCHEMASCOPE_DB_SCHEMA`: Namespace inside the database (Postgres only)
//! - `SCHEMASCOPE_CACHE_PREFIX`: Prefix for reflection cache keys

use std::env;

use serde::{Deserialize, Serialize};

/// Error type for connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported driver: {0}. Supported: mysql, postgres, sqlite")]
    UnsupportedDriver(String),
}

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    /// MySQL / MariaDB
    MySql,
    /// PostgreSQL
    Postgres,
    /// SQLite (file or in-memory)
    Sqlite,
}

impl Driver {
    /// Parse driver from string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConnectionConfigError> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Driver::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Driver::Postgres),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            other => Err(ConnectionConfigError::UnsupportedDriver(other.to_string())),
        }
    }

    /// The connection type name the registry resolves handlers against.
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::MySql => "mysql",
            Driver::Postgres => "postgres",
            Driver::Sqlite => "sqlite",
        }
    }

    /// Get the default port for this driver.
    pub fn default_port(&self) -> u16 {
        match self {
            Driver::MySql => 3306,
            Driver::Postgres => 5432,
            Driver::Sqlite => 0, // Not applicable
        }
    }
}

/// Database connection configuration.
///
/// Only `database`, `schema` and `cache_key_prefix` matter to reflection;
/// the remaining fields are carried for the connection layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Database driver.
    pub driver: Driver,
    /// Server hostname.
    pub host: String,
    /// Port (optional).
    pub port: Option<u16>,
    /// Database name.
    pub database: String,
    /// Namespace inside the database (Postgres `search_path` schema).
    pub schema: Option<String>,
    /// Prefix prepended to every reflection cache key for this connection.
    pub cache_key_prefix: Option<String>,
    /// Username.
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
}

impl ConnectionConfig {
    /// Create a config with only a driver and a database name.
    pub fn new(driver: Driver, database: impl Into<String>) -> Self {
        Self {
            driver,
            host: String::new(),
            port: None,
            database: database.into(),
            schema: None,
            cache_key_prefix: None,
            username: None,
            password: None,
        }
    }

    /// Create a new connection config for MySQL on localhost.
    pub fn mysql(database: impl Into<String>) -> Self {
        Self {
            host: "localhost".to_string(),
            ..Self::new(Driver::MySql, database)
        }
    }

    /// Create a new connection config for PostgreSQL on localhost.
    pub fn postgres(database: impl Into<String>) -> Self {
        Self {
            host: "localhost".to_string(),
            ..Self::new(Driver::Postgres, database)
        }
    }

    /// Create a new connection config for SQLite.
    ///
    /// The file `path` is the database name, so two files never share a
    /// cache namespace. The catalog is always read from the `main` schema.
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            schema: Some("main".to_string()),
            ..Self::new(Driver::Sqlite, path)
        }
    }

    /// Set the namespace inside the database.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the cache key prefix.
    pub fn with_cache_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_key_prefix = Some(prefix.into());
        self
    }

    /// The namespace tables are read from (`public` unless configured).
    pub fn schema_name(&self) -> &str {
        self.schema.as_deref().unwrap_or("public")
    }

    /// Get the port, falling back to the driver default.
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or_else(|| self.driver.default_port())
    }

    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `SCHEMASCOPE_DB_DRIVER`: mysql, postgres or sqlite
    /// - `SCHEMASCOPE_DB_NAME`: Database name (file path for SQLite)
    ///
    /// Optional:
    /// - `SCHEMASCOPE_DB_HOST`, `SCHEMASCOPE_DB_PORT`
    /// - `SCHEMASCOPE_DB_SCHEMA`, `SCHEMASCOPE_CACHE_PREFIX`
    /// - `SCHEMASCOPE_DB_USER`, `SCHEMASCOPE_DB_PASSWORD`
    pub fn from_env() -> Result<Self, ConnectionConfigError> {
        let driver_str = env::var("SCHEMASCOPE_DB_DRIVER")
            .map_err(|_| ConnectionConfigError::MissingEnvVar("SCHEMASCOPE_DB_DRIVER".to_string()))?;
        let driver = Driver::from_str(&driver_str)?;

        let database = env::var("SCHEMASCOPE_DB_NAME")
            .map_err(|_| ConnectionConfigError::MissingEnvVar("SCHEMASCOPE_DB_NAME".to_string()))?;

        let mut config = match driver {
            Driver::Sqlite => Self::sqlite(database),
            _ => Self::new(driver, database),
        };

        if let Ok(host) = env::var("SCHEMASCOPE_DB_HOST") {
            config.host = host;
        }
        config.port = env::var("SCHEMASCOPE_DB_PORT")
            .ok()
            .and_then(|p| p.parse().ok());
        if let Ok(schema) = env::var("SCHEMASCOPE_DB_SCHEMA") {
            config.schema = Some(schema);
        }
        config.cache_key_prefix = env::var("SCHEMASCOPE_CACHE_PREFIX").ok();
        config.username = env::var("SCHEMASCOPE_DB_USER").ok();
        config.password = env::var("SCHEMASCOPE_DB_PASSWORD").ok();

        Ok(config)
    }
}
