//! SQLite catalog reader.
//!
//! Reads `sqlite_master` and the `pragma_*` table-valued functions. SQLite
//! keeps the declared type text verbatim, so type name, length, precision
//! and the unsigned flag are recovered by pattern matching.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::helpers::{group_foreign_keys, lookup_type, required_str, ForeignKeyRow};
use super::{Dialect, ReadContext, SchemaReader};
use crate::connection::{ConnectionError, Row};
use crate::model::{
    ColumnData, Directory, ForeignKeyData, IndexData, ReferentialAction, SemanticType, TableData,
};

static DECIMAL_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(unsigned)?\s*(decimal|numeric)(?:\(([0-9]+),([0-9]+)\))?").unwrap()
});
static INTEGER_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(unsigned)?\s*(tinyint|smallint|mediumint|integer|int|bigint)(?:\(([0-9]+)\))?")
        .unwrap()
});
static FLOAT_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(unsigned)?\s*(float|real|double)").unwrap());
static CHAR_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(char|varchar)\(([0-9]+)\)").unwrap());

const TYPES: &[(&str, SemanticType)] = &[
    ("bigint", SemanticType::Integer),
    ("binary", SemanticType::Binary),
    ("blob", SemanticType::Binary),
    ("boolean", SemanticType::Boolean),
    ("clob", SemanticType::Text),
    ("date", SemanticType::Date),
    ("datetime", SemanticType::Datetime),
    ("datetimefractional", SemanticType::DatetimeFractional),
    ("decimal", SemanticType::Decimal),
    ("double", SemanticType::Float),
    ("float", SemanticType::Float),
    ("int", SemanticType::Integer),
    ("integer", SemanticType::Integer),
    ("json", SemanticType::Json),
    ("mediumint", SemanticType::Integer),
    ("numeric", SemanticType::Decimal),
    ("real", SemanticType::Float),
    ("smallint", SemanticType::Integer),
    ("text", SemanticType::Text),
    ("time", SemanticType::Time),
    ("timestamp", SemanticType::Datetime),
    ("timestampfractional", SemanticType::DatetimeFractional),
    ("timestamptimezone", SemanticType::DatetimeTimezone),
    ("tinyint", SemanticType::Integer),
    ("varbinary", SemanticType::Binary),
];

pub(crate) const TABLES_SQL: &str = "SELECT name FROM sqlite_master \
    WHERE type = 'table' AND substr(name, 1, 7) <> 'sqlite_' \
    ORDER BY name ASC";

pub(crate) const COLUMNS_SQL: &str = "SELECT name, type, \"notnull\" AS not_null, \
    dflt_value AS col_default, pk FROM pragma_table_info(?) ORDER BY cid ASC";

pub(crate) const PRIMARY_KEY_SQL: &str =
    "SELECT name FROM pragma_table_info(?) WHERE pk > 0 ORDER BY pk ASC";

pub(crate) const INDEX_LIST_SQL: &str = "SELECT name, \"unique\" AS is_unique \
    FROM pragma_index_list(?) WHERE substr(name, 1, 7) <> 'sqlite_' ORDER BY seq ASC";

pub(crate) const INDEX_INFO_SQL: &str =
    "SELECT name FROM pragma_index_info(?) ORDER BY seqno ASC";

pub(crate) const FOREIGN_KEYS_SQL: &str = "SELECT id, seq, \"table\" AS ref_table_name, \
    \"from\" AS column_name, \"to\" AS ref_column, on_update, on_delete \
    FROM pragma_foreign_key_list(?) ORDER BY id ASC, seq ASC";

/// Reader for SQLite.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteReader;

impl SqliteReader {
    /// Split a declared type into type name, length, precision and unsigned flag.
    pub fn parse_type(declared: &str, column: &mut ColumnData) {
        let declared = declared.trim();

        if let Some(caps) = DECIMAL_TYPE.captures(declared) {
            column.unsigned = caps.get(1).is_some();
            column.type_name = caps[2].to_lowercase();
            if let (Some(length), Some(scale)) = (caps.get(3), caps.get(4)) {
                column.length = length.as_str().parse().ok();
                column.precision = scale.as_str().parse().ok();
            }
        } else if let Some(caps) = INTEGER_TYPE.captures(declared) {
            column.unsigned = caps.get(1).is_some();
            column.type_name = caps[2].to_lowercase();
            column.length = caps.get(3).and_then(|m| m.as_str().parse().ok());
            column.precision = Some(0);
        } else if let Some(caps) = FLOAT_TYPE.captures(declared) {
            column.unsigned = caps.get(1).is_some();
            column.type_name = caps[2].to_lowercase();
        } else if let Some(caps) = CHAR_TYPE.captures(declared) {
            column.type_name = caps[1].to_lowercase();
            column.length = caps[2].parse().ok();
        } else {
            column.type_name = declared.to_lowercase();
        }
    }

    /// Primary key columns in key order.
    fn primary_key(ctx: &ReadContext<'_>, table: &str) -> Result<Vec<String>, ConnectionError> {
        ctx
            .query(PRIMARY_KEY_SQL, &[Value::from(table)])?
            .iter()
            .map(|row| required_str(row, "name"))
            .collect()
    }
}

impl SchemaReader for SqliteReader {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(database = ctx.database))]
    fn read_tables(&self, ctx: &ReadContext<'_>) -> Result<Directory<TableData>, ConnectionError> {
        ctx
            .query(TABLES_SQL, &[])?
            .iter()
            .map(|row| Ok((required_str(row, "name")?, TableData::default())))
            .collect()
    }

    #[tracing::instrument(level = "debug", skip(self, ctx))]
    fn read_columns(
        &self,
        ctx: &ReadContext<'_>,
        table: &str,
    ) -> Result<Directory<ColumnData>, ConnectionError> {
        let rows = ctx.query(COLUMNS_SQL, &[Value::from(table)])?;

        let mut columns = Directory::new();
        let mut primary_keys = Vec::new();

        for row in &rows {
            let name = required_str(row, "name")?;
            let mut column = ColumnData::default();
            Self::parse_type(&row.get_str("type").unwrap_or_default(), &mut column);

            let primary = row.get_i64("pk").unwrap_or_default() > 0;
            column.nullable = !primary && !row.get_bool("not_null");
            column.default = row.get_str("col_default");

            if primary {
                primary_keys.push(name.clone());
            }
            columns.insert(name, column);
        }

        // A lone primary key column aliases the rowid.
        if let [primary_key] = primary_keys.as_slice() {
            let column = columns.entry_or_insert_with(primary_key, ColumnData::default);
            column.auto_increment = true;
        }

        Ok(columns)
    }

    #[tracing::instrument(level = "debug", skip(self, ctx))]
    fn read_indexes(
        &self,
        ctx: &ReadContext<'_>,
        table: &str,
    ) -> Result<Directory<IndexData>, ConnectionError> {
        let mut indexes = Directory::new();

        let primary_key = Self::primary_key(ctx, table)?;
        if !primary_key.is_empty() {
            indexes.insert(
                "primary",
                IndexData {
                    columns: primary_key,
                    unique: true,
                    primary: true,
                    index_type: None,
                },
            );
        }

        for row in ctx.query(INDEX_LIST_SQL, &[Value::from(table)])? {
            let name = required_str(&row, "name")?;
            let columns = ctx
                .query(INDEX_INFO_SQL, &[Value::from(name.as_str())])?
                .iter()
                // Expression members have no column name.
                .filter_map(|member| member.get_str("name"))
                .collect();

            indexes.insert(
                name,
                IndexData {
                    columns,
                    unique: row.get_bool("is_unique"),
                    primary: false,
                    index_type: None,
                },
            );
        }

        Ok(indexes)
    }

    #[tracing::instrument(level = "debug", skip(self, ctx))]
    fn read_foreign_keys(
        &self,
        ctx: &ReadContext<'_>,
        table: &str,
    ) -> Result<Directory<ForeignKeyData>, ConnectionError> {
        let rows = ctx.query(FOREIGN_KEYS_SQL, &[Value::from(table)])?;

        let mut parent_keys: Vec<(String, Vec<String>)> = Vec::new();
        let mut pairs = Vec::with_capacity(rows.len());
        for row in &rows {
            let referenced_table = required_str(row, "ref_table_name")?;
            let seq = row.get_i64("seq").unwrap_or_default();

            // `REFERENCES parent` without a column list targets the parent's primary key.
            let referenced_column = match row.get_str("ref_column") {
                Some(column) => column,
                None => {
                    if !parent_keys.iter().any(|(t, _)| *t == referenced_table) {
                        let key = Self::primary_key(ctx, &referenced_table)?;
                        parent_keys.push((referenced_table.clone(), key));
                    }
                    parent_keys
                        .iter()
                        .find(|(t, _)| *t == referenced_table)
                        .and_then(|(_, key)| key.get(seq as usize).cloned())
                        .ok_or_else(|| ConnectionError::MissingField("to".to_string()))?
                }
            };

            pairs.push(ForeignKeyRow {
                name: required_str(row, "id")?,
                column: required_str(row, "column_name")?,
                referenced_table,
                referenced_column,
                seq,
                on_update: action(row, "on_update"),
                on_delete: action(row, "on_delete"),
            });
        }

        // The pragma identifies keys by number only.
        Ok(group_foreign_keys(pairs)
            .values()
            .map(|data| (format!("{}_{}", table, data.columns.join("_")), data.clone()))
            .collect())
    }

    fn semantic_type(&self, column: &ColumnData) -> SemanticType {
        lookup_type(TYPES, &column.type_name)
    }
}

fn action(row: &Row, column: &str) -> ReferentialAction {
    row.get_str(column)
        .map(|rule| ReferentialAction::parse(&rule))
        .unwrap_or_default()
}
