//! # Schemascope
//!
//! Cross-dialect database schema reflection.
//!
//! ## Architecture
//!
//! Schemascope reads the catalog of a live MySQL, PostgreSQL or SQLite
//! connection into one dialect-independent model:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    SchemaRegistry                        │
//! │   (connection → Schema, dialect chosen by type chain)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [use_schema]
//! ┌─────────────────────────────────────────────────────────┐
//! │               Schema  →  Table (lazy)                    │
//! │      columns / indexes / foreign keys, memoized          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [cache: remember / delete]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  SchemaReader (dialect)                  │
//! │   INFORMATION_SCHEMA · pg_catalog · PRAGMA functions     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │              Connection (query collaborator)             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use schemascope::{Connection, SchemaRegistry, SqliteConnection};
//!
//! let connection: Arc<dyn Connection> = Arc::new(SqliteConnection::open_in_memory()?);
//! let registry = SchemaRegistry::new();
//! let schema = registry.use_schema(&connection)?;
//! for (name, table) in schema.tables()? {
//!     println!("{name}: {:?}", table.primary_key()?);
//! }
//! ```

pub mod cache;
pub mod config;
pub mod connection;
pub mod dialect;
pub mod error;
pub mod model;
pub mod registry;
pub mod schema;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::{CacheStore, MemoryCache, SqliteCache};
pub use config::{ConnectionConfig, Driver, Settings};
pub use connection::{Connection, ConnectionError, Row, SqliteConnection};
pub use dialect::{Dialect, SchemaReader};
pub use error::{SchemaError, SchemaResult};
pub use model::{Column, ForeignKey, Index, ReferentialAction, SemanticType};
pub use registry::SchemaRegistry;
pub use schema::{Schema, Table};
