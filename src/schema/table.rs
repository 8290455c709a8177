use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use super::lazy::{LazyDirectory, Snapshot};
use super::SchemaContext;
use crate::cache::CacheKey;
use crate::error::{SchemaError, SchemaResult};
use crate::model::{
    Column, ColumnData, Directory, ForeignKey, ForeignKeyData, Index, IndexData, TableData,
};

/// A reflected table.
///
/// Columns, indexes and foreign keys are three independent directories,
/// each loaded on first use and kept until [`Table::clear`].
pub struct Table {
    ctx: Arc<SchemaContext>,
    name: String,
    data: TableData,
    columns: LazyDirectory<ColumnData, Column>,
    indexes: LazyDirectory<IndexData, Index>,
    foreign_keys: LazyDirectory<ForeignKeyData, ForeignKey>,
}

impl Table {
    pub(crate) fn new(ctx: Arc<SchemaContext>, name: impl Into<String>, data: TableData) -> Self {
        Self {
            ctx,
            name: name.into(),
            data,
            columns: LazyDirectory::new(),
            indexes: LazyDirectory::new(),
            foreign_keys: LazyDirectory::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comment(&self) -> Option<&str> {
        self.data.comment.as_deref()
    }

    /// Storage engine (MySQL).
    pub fn engine(&self) -> Option<&str> {
        self.data.engine.as_deref()
    }

    pub fn charset(&self) -> Option<&str> {
        self.data.charset.as_deref()
    }

    pub fn collation(&self) -> Option<&str> {
        self.data.collation.as_deref()
    }

    /// The raw attributes this table was built from.
    pub fn data(&self) -> &TableData {
        &self.data
    }

    // Columns

    fn column_directory(&self) -> SchemaResult<Snapshot<ColumnData>> {
        self.columns.snapshot(|| {
            let key = CacheKey::columns(self.ctx.cache_prefix(), &self.name);
            self.ctx
                .load(&key, |reader, ctx| reader.read_columns(ctx, &self.name))
        })
    }

    fn build_column(&self) -> impl Fn(&str, &ColumnData) -> Column + '_ {
        move |name: &str, data: &ColumnData| {
            Column::new(
                self.name.as_str(),
                name,
                data.clone(),
                self.ctx.reader().semantic_type(data),
                self.ctx.weak_connection(),
            )
        }
    }

    pub fn column(&self, name: &str) -> SchemaResult<Arc<Column>> {
        let snapshot = self.column_directory()?;
        self.columns
            .entity(&snapshot, name, self.build_column())
            .ok_or_else(|| SchemaError::invalid_column(&self.name, name))
    }

    /// Column names in ordinal order.
    pub fn column_names(&self) -> SchemaResult<Vec<String>> {
        Ok(names(self.column_directory()?.directory()))
    }

    pub fn columns(&self) -> SchemaResult<impl Iterator<Item = (String, Arc<Column>)> + '_> {
        let snapshot = self.column_directory()?;
        Ok(self.columns.entries(snapshot, self.build_column()))
    }

    pub fn has_column(&self, name: &str) -> SchemaResult<bool> {
        Ok(self.column_directory()?.directory().contains(name))
    }

    /// The raw column directory.
    pub fn column_data(&self) -> SchemaResult<Directory<ColumnData>> {
        Ok(self.column_directory()?.directory().clone())
    }

    /// Whether any column is auto-incremented.
    pub fn has_auto_increment(&self) -> SchemaResult<bool> {
        let snapshot = self.column_directory()?;
        let result = snapshot.directory().values().any(|c| c.auto_increment);
        Ok(result)
    }

    // Indexes

    fn index_directory(&self) -> SchemaResult<Snapshot<IndexData>> {
        self.indexes.snapshot(|| {
            let key = CacheKey::indexes(self.ctx.cache_prefix(), &self.name);
            self.ctx
                .load(&key, |reader, ctx| reader.read_indexes(ctx, &self.name))
        })
    }

    fn build_index(&self) -> impl Fn(&str, &IndexData) -> Index + '_ {
        move |name: &str, data: &IndexData| Index::new(self.name.as_str(), name, data.clone())
    }

    pub fn index(&self, name: &str) -> SchemaResult<Arc<Index>> {
        let snapshot = self.index_directory()?;
        self.indexes
            .entity(&snapshot, name, self.build_index())
            .ok_or_else(|| SchemaError::invalid_index(&self.name, name))
    }

    pub fn index_names(&self) -> SchemaResult<Vec<String>> {
        Ok(names(self.index_directory()?.directory()))
    }

    pub fn indexes(&self) -> SchemaResult<impl Iterator<Item = (String, Arc<Index>)> + '_> {
        let snapshot = self.index_directory()?;
        Ok(self.indexes.entries(snapshot, self.build_index()))
    }

    pub fn has_index(&self, name: &str) -> SchemaResult<bool> {
        Ok(self.index_directory()?.directory().contains(name))
    }

    pub fn index_data(&self) -> SchemaResult<Directory<IndexData>> {
        Ok(self.index_directory()?.directory().clone())
    }

    /// Columns of the primary index, or `None` without one.
    pub fn primary_key(&self) -> SchemaResult<Option<Vec<String>>> {
        let snapshot = self.index_directory()?;
        let result = snapshot
            .directory()
            .values()
            .find(|index| index.primary)
            .map(|index| index.columns.clone());
        Ok(result)
    }

    // Foreign keys

    fn foreign_key_directory(&self) -> SchemaResult<Snapshot<ForeignKeyData>> {
        self.foreign_keys.snapshot(|| {
            let key = CacheKey::foreign_keys(self.ctx.cache_prefix(), &self.name);
            self.ctx
                .load(&key, |reader, ctx| reader.read_foreign_keys(ctx, &self.name))
        })
    }

    fn build_foreign_key(&self) -> impl Fn(&str, &ForeignKeyData) -> ForeignKey + '_ {
        move |name: &str, data: &ForeignKeyData| ForeignKey::new(self.name.as_str(), name, data.clone())
    }

    pub fn foreign_key(&self, name: &str) -> SchemaResult<Arc<ForeignKey>> {
        let snapshot = self.foreign_key_directory()?;
        self.foreign_keys
            .entity(&snapshot, name, self.build_foreign_key())
            .ok_or_else(|| SchemaError::invalid_foreign_key(&self.name, name))
    }

    pub fn foreign_key_names(&self) -> SchemaResult<Vec<String>> {
        Ok(names(self.foreign_key_directory()?.directory()))
    }

    pub fn foreign_keys(
        &self,
    ) -> SchemaResult<impl Iterator<Item = (String, Arc<ForeignKey>)> + '_> {
        let snapshot = self.foreign_key_directory()?;
        Ok(self.foreign_keys.entries(snapshot, self.build_foreign_key()))
    }

    pub fn has_foreign_key(&self, name: &str) -> SchemaResult<bool> {
        Ok(self.foreign_key_directory()?.directory().contains(name))
    }

    pub fn foreign_key_data(&self) -> SchemaResult<Directory<ForeignKeyData>> {
        Ok(self.foreign_key_directory()?.directory().clone())
    }

    /// Forget columns, indexes and foreign keys, in memory and in the cache.
    pub fn clear(&self) {
        self.columns.clear();
        self.indexes.clear();
        self.foreign_keys.clear();

        let prefix = self.ctx.cache_prefix();
        self.ctx.forget(&CacheKey::columns(prefix, &self.name));
        self.ctx.forget(&CacheKey::indexes(prefix, &self.name));
        self.ctx.forget(&CacheKey::foreign_keys(prefix, &self.name));
    }
}

fn names<T>(directory: &Directory<T>) -> Vec<String> {
    directory.names().map(String::from).collect()
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            name: &'a str,
            #[serde(flatten)]
            data: &'a TableData,
        }

        Repr {
            name: &self.name,
            data: &self.data,
        }
        .serialize(serializer)
    }
}
