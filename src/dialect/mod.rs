//! Dialect catalog readers.
//!
//! Each dialect implements [`SchemaReader`] to translate its catalog into the
//! canonical records of [`crate::model`]:
//!
//! - MySQL: `INFORMATION_SCHEMA` with combined type declarations
//!   (`decimal(10,2) unsigned`, `enum('Y','N')`)
//! - PostgreSQL: `information_schema` plus `pg_catalog` with split
//!   precision columns and cast-wrapped defaults
//! - SQLite: `PRAGMA` table-valued functions with free-form type strings
//!
//! # Usage
//!
//! ```ignore
//! use schemascope::dialect::{Dialect, ReadContext};
//!
//! let reader = Dialect::MySql.reader();
//! let ctx = ReadContext::new(&*connection);
//! let tables = reader.read_tables(&ctx)?;
//! ```

pub mod helpers;
mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MysqlReader;
pub use postgres::PostgresReader;
pub use sqlite::SqliteReader;

use std::fmt;
use std::sync::Arc;

use crate::config::Driver;
use crate::connection::{Connection, ConnectionError, Row, Value};
use crate::model::{ColumnData, Directory, ForeignKeyData, IndexData, SemanticType, TableData};

/// What a reader needs to scope its catalog queries.
#[derive(Clone, Copy)]
pub struct ReadContext<'a> {
    pub connection: &'a dyn Connection,
    /// Database (catalog) name.
    pub database: &'a str,
    /// Namespace inside the database. Only Postgres uses it.
    pub namespace: &'a str,
}

impl<'a> ReadContext<'a> {
    /// Scope taken from the connection's configuration.
    pub fn new(connection: &'a dyn Connection) -> Self {
        let config = connection.config();
        Self {
            connection,
            database: &config.database,
            namespace: config.schema_name(),
        }
    }

    /// Run a catalog query on the borrowed connection.
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, ConnectionError> {
        tracing::trace!(sql, params = params.len(), "catalog query");
        self.connection.query(sql, params)
    }
}

impl fmt::Debug for ReadContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadContext")
            .field("database", &self.database)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// Catalog reader for one dialect.
///
/// Every method issues catalog queries through the borrowed connection and
/// returns records in a deterministic order. Query failures are returned
/// unchanged; type strings that cannot be parsed never fail a read.
pub trait SchemaReader: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Base tables of the database, by name.
    fn read_tables(&self, ctx: &ReadContext<'_>) -> Result<Directory<TableData>, ConnectionError>;

    /// Columns of a table, in ordinal order.
    fn read_columns(
        &self,
        ctx: &ReadContext<'_>,
        table: &str,
    ) -> Result<Directory<ColumnData>, ConnectionError>;

    /// Indexes of a table: primary first, then unique, then by name.
    fn read_indexes(
        &self,
        ctx: &ReadContext<'_>,
        table: &str,
    ) -> Result<Directory<IndexData>, ConnectionError>;

    /// Foreign keys of a table, with local and referenced columns paired by position.
    fn read_foreign_keys(
        &self,
        ctx: &ReadContext<'_>,
        table: &str,
    ) -> Result<Directory<ForeignKeyData>, ConnectionError>;

    /// Canonical type of a column. Unknown native types map to
    /// [`SemanticType::String`].
    fn semantic_type(&self, column: &ColumnData) -> SemanticType;
}

/// Supported catalog dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::MySql, Dialect::Postgres, Dialect::Sqlite];

    /// Connection type name the dialect is registered under by default.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// A fresh reader for this dialect.
    pub fn reader(&self) -> Arc<dyn SchemaReader> {
        match self {
            Dialect::MySql => Arc::new(MysqlReader),
            Dialect::Postgres => Arc::new(PostgresReader),
            Dialect::Sqlite => Arc::new(SqliteReader),
        }
    }
}

impl From<Driver> for Dialect {
    fn from(driver: Driver) -> Self {
        match driver {
            Driver::MySql => Dialect::MySql,
            Driver::Postgres => Dialect::Postgres,
            Driver::Sqlite => Dialect::Sqlite,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
