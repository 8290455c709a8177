//! Reflected database schemas.
//!
//! A [`Schema`] is bound to one live connection and owns the table
//! directory of that connection's database. [`Table`]s are built from the
//! directory on first request and load their columns, indexes and foreign
//! keys lazily, each through the metadata cache when one is configured.
//!
//! ```ignore
//! let registry = SchemaRegistry::new();
//! let schema = registry.use_schema(&connection)?;
//!
//! let users = schema.table("users")?;
//! for (name, column) in users.columns()? {
//!     println!("{name}: {}", column.semantic_type());
//! }
//! ```

mod lazy;
mod table;

pub use table::Table;

use std::fmt;
use std::sync::{Arc, Weak};

use serde::{de::DeserializeOwned, Serialize};

use crate::cache::{remember, CacheKey, CacheStore};
use crate::connection::{Connection, ConnectionError};
use crate::dialect::{Dialect, ReadContext, SchemaReader};
use crate::error::{SchemaError, SchemaResult};
use crate::model::{Directory, TableData};
use lazy::LazyDirectory;

/// State shared by a schema and every table built from it.
pub(crate) struct SchemaContext {
    connection: Weak<dyn Connection>,
    reader: Arc<dyn SchemaReader>,
    cache: Option<Arc<dyn CacheStore>>,
    database: String,
    namespace: String,
    cache_prefix: String,
}

impl SchemaContext {
    fn connection(&self) -> Result<Arc<dyn Connection>, ConnectionError> {
        self.connection.upgrade().ok_or(ConnectionError::Closed)
    }

    /// Load a metadata directory through the cache, or straight from the
    /// catalog when no cache is configured.
    pub(crate) fn load<T, F>(&self, key: &str, read: F) -> SchemaResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&dyn SchemaReader, &ReadContext<'_>) -> Result<T, ConnectionError>,
    {
        let produce = || {
            let connection = self.connection()?;
            let ctx = ReadContext {
                connection: &*connection,
                database: &self.database,
                namespace: &self.namespace,
            };
            tracing::debug!(key, dialect = %self.reader.dialect(), "reading catalog");
            read(&*self.reader, &ctx)
        };

        let value = match &self.cache {
            Some(store) => remember(&**store, key, produce)?,
            None => produce()?,
        };
        Ok(value)
    }

    /// Drop a persisted directory. Store failures are logged, not raised.
    pub(crate) fn forget(&self, key: &str) {
        let Some(store) = &self.cache else {
            return;
        };
        match store.delete(key) {
            Ok(removed) => tracing::debug!(key, removed, "metadata cache entry cleared"),
            Err(error) => tracing::warn!(key, %error, "failed to clear metadata cache entry"),
        }
    }

    pub(crate) fn cache_prefix(&self) -> &str {
        &self.cache_prefix
    }

    pub(crate) fn reader(&self) -> &dyn SchemaReader {
        &*self.reader
    }

    pub(crate) fn weak_connection(&self) -> Weak<dyn Connection> {
        Weak::clone(&self.connection)
    }
}

/// The reflected schema of one connection.
pub struct Schema {
    ctx: Arc<SchemaContext>,
    tables: LazyDirectory<TableData, Table>,
}

impl Schema {
    /// Bind a schema to `connection`. The schema holds the connection weakly.
    pub fn new(
        connection: &Arc<dyn Connection>,
        reader: Arc<dyn SchemaReader>,
        cache: Option<Arc<dyn CacheStore>>,
    ) -> Self {
        let config = connection.config();
        let cache_prefix =
            CacheKey::namespace(config.cache_key_prefix.as_deref(), &config.database);

        Self {
            ctx: Arc::new(SchemaContext {
                connection: Arc::downgrade(connection),
                reader,
                cache,
                database: config.database.clone(),
                namespace: config.schema_name().to_string(),
                cache_prefix,
            }),
            tables: LazyDirectory::new(),
        }
    }

    fn directory(&self) -> SchemaResult<lazy::Snapshot<TableData>> {
        self.tables.snapshot(|| {
            let key = CacheKey::tables(&self.ctx.cache_prefix);
            self.ctx.load(&key, |reader, ctx| reader.read_tables(ctx))
        })
    }

    fn build(&self) -> impl Fn(&str, &TableData) -> Table + '_ {
        move |name: &str, data: &TableData| Table::new(Arc::clone(&self.ctx), name, data.clone())
    }

    /// The table called `name`.
    pub fn table(&self, name: &str) -> SchemaResult<Arc<Table>> {
        let snapshot = self.directory()?;
        self.tables
            .entity(&snapshot, name, self.build())
            .ok_or_else(|| SchemaError::InvalidTable(name.to_string()))
    }

    /// Table names in catalog order.
    pub fn table_names(&self) -> SchemaResult<Vec<String>> {
        let snapshot = self.directory()?;
        Ok(snapshot.directory().names().map(String::from).collect())
    }

    pub fn has_table(&self, name: &str) -> SchemaResult<bool> {
        Ok(self.directory()?.directory().contains(name))
    }

    /// Every table, built as the iterator advances.
    ///
    /// Each call iterates from the start of the directory. Tables already
    /// built are shared with [`Schema::table`].
    pub fn tables(&self) -> SchemaResult<impl Iterator<Item = (String, Arc<Table>)> + '_> {
        let snapshot = self.directory()?;
        Ok(self.tables.entries(snapshot, self.build()))
    }

    /// Forget the table directory and every built table, and drop the
    /// persisted table directory. Per-table metadata is kept; use
    /// [`Table::clear`] for that.
    pub fn clear(&self) {
        self.tables.clear();
        self.ctx.forget(&CacheKey::tables(&self.ctx.cache_prefix));
    }

    pub fn database_name(&self) -> &str {
        &self.ctx.database
    }

    /// Namespace of this schema's cache keys.
    pub fn cache_prefix(&self) -> &str {
        &self.ctx.cache_prefix
    }

    pub fn dialect(&self) -> Dialect {
        self.ctx.reader.dialect()
    }

    /// The bound connection, if it is still alive.
    pub fn connection(&self) -> SchemaResult<Arc<dyn Connection>> {
        Ok(self.ctx.connection()?)
    }

    pub fn cache(&self) -> Option<&Arc<dyn CacheStore>> {
        self.ctx.cache.as_ref()
    }

    /// The raw table directory.
    pub fn table_data(&self) -> SchemaResult<Directory<TableData>> {
        Ok(self.directory()?.directory().clone())
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("dialect", &self.dialect())
            .field("database", &self.ctx.database)
            .field("cache_prefix", &self.ctx.cache_prefix)
            .field("loaded", &self.tables.is_loaded())
            .finish()
    }
}
