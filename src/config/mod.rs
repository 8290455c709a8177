//! Configuration module.
//!
//! Handles connection configuration, environment variables, and settings.

mod connection;
mod settings;

pub use connection::{ConnectionConfig, ConnectionConfigError, Driver};
pub use settings::{
    default_cache_path, expand_env_vars, CacheBackend, CacheSettings, ConnectionSettings,
    Settings, SettingsError,
};
