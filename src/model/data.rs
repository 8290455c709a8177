//! Raw metadata records.
//!
//! These are what readers produce and what the cache stores. Entity types
//! wrap them once a table asks for a name.

use serde::{Deserialize, Serialize};

use super::types::ReferentialAction;

/// Attributes of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    #[serde(default)]
    pub comment: Option<String>,
    /// Storage engine (MySQL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
}

/// Normalized attributes of one column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnData {
    /// Dialect-native type name, lower-case, without modifiers.
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub length: Option<u32>,
    /// Precision for temporal types, scale for numeric types.
    #[serde(default)]
    pub precision: Option<u32>,
    /// Members of an enum or set type.
    #[serde(default)]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub unsigned: bool,
    /// Default in native literal form. `"NULL"` means an explicit NULL default.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub auto_increment: bool,
}

impl ColumnData {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }
}

/// Attributes of one index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexData {
    /// Member columns in index order.
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary: bool,
    /// Access method reported by the dialect (e.g. `btree`).
    #[serde(rename = "type", default)]
    pub index_type: Option<String>,
}

/// Attributes of one foreign key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyData {
    /// Local columns, paired by position with `referenced_columns`.
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    #[serde(default)]
    pub on_update: ReferentialAction,
    #[serde(default)]
    pub on_delete: ReferentialAction,
}
