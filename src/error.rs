//! Error types for schema reflection.

use thiserror::Error;

use crate::connection::ConnectionError;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors surfaced by [`Schema`](crate::schema::Schema), [`Table`](crate::schema::Table)
/// and the [`SchemaRegistry`](crate::registry::SchemaRegistry).
///
/// Lookup errors are never retried. Catalog failures are passed through
/// unmodified so that connectivity problems stay visible to the caller.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The table is not part of the schema.
    #[error("invalid table schema: {0}")]
    InvalidTable(String),

    /// The column is not part of the table.
    #[error("invalid table column: {table}.{column}")]
    InvalidColumn { table: String, column: String },

    /// The index is not part of the table.
    #[error("invalid table index: {table}.{index}")]
    InvalidIndex { table: String, index: String },

    /// The foreign key is not part of the table.
    #[error("invalid table foreign key: {table}.{foreign_key}")]
    InvalidForeignKey { table: String, foreign_key: String },

    /// No dialect handler is registered for the connection type or any of its ancestors.
    #[error("missing handler for connection type: {0}")]
    MissingHandler(String),

    /// A catalog query failed.
    #[error("catalog query failed: {0}")]
    ConnectionFailure(#[from] ConnectionError),
}

impl SchemaError {
    pub fn invalid_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::InvalidColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn invalid_index(table: impl Into<String>, index: impl Into<String>) -> Self {
        Self::InvalidIndex {
            table: table.into(),
            index: index.into(),
        }
    }

    pub fn invalid_foreign_key(table: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::InvalidForeignKey {
            table: table.into(),
            foreign_key: foreign_key.into(),
        }
    }

    /// Check if this error is a failed lookup of an unknown name.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::InvalidTable(_)
                | Self::InvalidColumn { .. }
                | Self::InvalidIndex { .. }
                | Self::InvalidForeignKey { .. }
        )
    }
}
