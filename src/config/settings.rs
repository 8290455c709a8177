//! TOML-based configuration.
//!
//! Supports a config file (`schemascope.toml`) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [connections.shop]
//! driver = "mysql"
//! host = "${SHOP_DB_HOST}"
//! database = "shop"
//! cache_key_prefix = "tenant1"
//!
//! [connections.reporting]
//! driver = "postgres"
//! database = "warehouse"
//! schema = "reporting"
//!
//! [cache]
//! backend = "sqlite"
//! path = "~/.schemascope/cache.db"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::connection::{ConnectionConfig, ConnectionConfigError, Driver};
use crate::cache::{CacheError, CacheStore, MemoryCache, SqliteCache};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    #[error(transparent)]
    InvalidConnection(#[from] ConnectionConfigError),

    #[error("Failed to open cache: {0}")]
    Cache(#[from] CacheError),
}

/// Top-level settings structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Named database connections.
    pub connections: HashMap<String, ConnectionSettings>,

    /// Reflection cache settings.
    pub cache: CacheSettings,
}

/// Connection settings as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionSettings {
    /// Database driver (mysql, postgres, sqlite).
    pub driver: String,

    /// Database name, or file path for SQLite. May contain `${ENV_VAR}` references.
    pub database: String,

    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    /// Namespace inside the database (Postgres).
    #[serde(default)]
    pub schema: Option<String>,

    #[serde(default)]
    pub cache_key_prefix: Option<String>,
}

impl ConnectionSettings {
    /// Parse the driver type.
    pub fn driver_type(&self) -> Result<Driver, SettingsError> {
        Ok(Driver::from_str(&self.driver)?)
    }

    /// Resolve into a [`ConnectionConfig`], expanding environment variables.
    pub fn to_config(&self) -> Result<ConnectionConfig, SettingsError> {
        let driver = self.driver_type()?;
        let database = expand_env_vars(&self.database)?;

        let mut config = match driver {
            Driver::MySql => ConnectionConfig::mysql(database),
            Driver::Postgres => ConnectionConfig::postgres(database),
            Driver::Sqlite => ConnectionConfig::sqlite(database),
        };

        if let Some(host) = &self.host {
            config.host = expand_env_vars(host)?;
        }
        config.port = self.port;
        if let Some(schema) = &self.schema {
            config.schema = Some(expand_env_vars(schema)?);
        }
        if let Some(prefix) = &self.cache_key_prefix {
            config.cache_key_prefix = Some(expand_env_vars(prefix)?);
        }
        Ok(config)
    }
}

/// Which cache store backs reflected metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Reflect from the catalog on every cold load.
    #[default]
    None,
    /// Process-local map.
    Memory,
    /// Persistent SQLite file.
    Sqlite,
}

/// Cache configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    pub backend: CacheBackend,

    /// Path for the SQLite backend. Defaults to `~/.schemascope/cache.db`.
    pub path: Option<String>,
}

impl CacheSettings {
    /// Resolve the SQLite cache path, expanding `~` and environment variables.
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        match &self.path {
            Some(path) => {
                let expanded = expand_env_vars(path)?;
                match expanded.strip_prefix("~/") {
                    Some(rest) => Ok(dirs::home_dir().unwrap_or_default().join(rest)),
                    None => Ok(PathBuf::from(expanded)),
                }
            }
            None => Ok(default_cache_path()),
        }
    }
}

/// Default location of the persistent cache.
pub fn default_cache_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".schemascope")
        .join("cache.db")
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SCHEMASCOPE_CONFIG`
    /// 2. `./schemascope.toml`
    /// 3. `~/.config/schemascope/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SCHEMASCOPE_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("schemascope.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("schemascope").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Resolve a named connection.
    pub fn connection(&self, name: &str) -> Result<ConnectionConfig, SettingsError> {
        self.connections
            .get(name)
            .ok_or_else(|| SettingsError::ConnectionNotFound(name.to_string()))?
            .to_config()
    }

    /// Open the configured cache store, if any.
    pub fn build_cache(&self) -> Result<Option<Arc<dyn CacheStore>>, SettingsError> {
        let store: Arc<dyn CacheStore> = match self.cache.backend {
            CacheBackend::None => return Ok(None),
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
            CacheBackend::Sqlite => Arc::new(SqliteCache::open(self.cache.resolved_path()?)?),
        };
        Ok(Some(store))
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A lone `$` is kept as is.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                var_name.push(ch);
            }
            if var_name.is_empty() {
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
