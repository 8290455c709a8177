//! Row decoding and grouping shared by the readers.

use std::cmp::Reverse;

use crate::connection::{ConnectionError, Row};
use crate::model::{Directory, ForeignKeyData, IndexData, ReferentialAction, SemanticType};

/// Read a column that must be present and non-NULL.
pub fn required_str(row: &Row, column: &str) -> Result<String, ConnectionError> {
    row.get_str(column)
        .ok_or_else(|| ConnectionError::MissingField(column.to_string()))
}

/// A nullable column whose catalog default is NULL has an explicit `NULL`
/// default. Non-nullable columns keep an absent default.
pub fn normalize_null_default(nullable: bool, default: Option<String>) -> Option<String> {
    match default {
        None if nullable => Some("NULL".to_string()),
        other => other,
    }
}

/// Look up a native type name in a dialect type map.
pub fn lookup_type(map: &[(&str, SemanticType)], type_name: &str) -> SemanticType {
    map.iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, semantic)| *semantic)
        .unwrap_or(SemanticType::String)
}

/// One catalog row per (index, column).
#[derive(Debug, Clone)]
pub struct IndexRow {
    pub name: String,
    pub column: String,
    pub unique: bool,
    pub primary: bool,
    /// Position of the column inside the index.
    pub seq: i64,
    pub index_type: Option<String>,
}

/// Group index rows into indexes.
///
/// Rows are ordered primary first, then unique, then by index name, then by
/// position inside the index, so composite indexes keep their column order
/// whatever order the catalog returned.
pub fn group_indexes(mut rows: Vec<IndexRow>) -> Directory<IndexData> {
    rows.sort_by(|a, b| {
        (Reverse(a.primary), Reverse(a.unique), &a.name, a.seq).cmp(&(
            Reverse(b.primary),
            Reverse(b.unique),
            &b.name,
            b.seq,
        ))
    });

    let mut indexes = Directory::new();
    for row in rows {
        let index = indexes.entry_or_insert_with(&row.name, || IndexData {
            columns: Vec::new(),
            unique: row.unique,
            primary: row.primary,
            index_type: row.index_type.clone(),
        });
        index.columns.push(row.column);
    }
    indexes
}

/// One catalog row per (foreign key, column pair).
#[derive(Debug, Clone)]
pub struct ForeignKeyRow {
    pub name: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    /// Position of the pair inside the key.
    pub seq: i64,
    pub on_update: ReferentialAction,
    pub on_delete: ReferentialAction,
}

/// Group foreign key rows into keys.
///
/// Keys keep the order in which the catalog first reports them. Column pairs
/// are ordered by position and never separated.
pub fn group_foreign_keys(rows: Vec<ForeignKeyRow>) -> Directory<ForeignKeyData> {
    let mut grouped: Directory<Vec<ForeignKeyRow>> = Directory::new();
    for row in rows {
        let name = row.name.clone();
        grouped.entry_or_insert_with(&name, Vec::new).push(row);
    }

    grouped
        .iter()
        .map(|(name, pairs)| {
            let mut pairs = pairs.clone();
            pairs.sort_by_key(|pair| pair.seq);
            let first = &pairs[0];
            let data = ForeignKeyData {
                columns: pairs.iter().map(|p| p.column.clone()).collect(),
                referenced_table: first.referenced_table.clone(),
                referenced_columns: pairs.iter().map(|p| p.referenced_column.clone()).collect(),
                on_update: first.on_update,
                on_delete: first.on_delete,
            };
            (name.to_string(), data)
        })
        .collect()
}
