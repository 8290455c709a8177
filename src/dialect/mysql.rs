//! MySQL / MariaDB catalog reader.
//!
//! Reads `INFORMATION_SCHEMA`. Column attributes are parsed out of the
//! combined `COLUMN_TYPE` declaration.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::helpers::{
    group_foreign_keys, group_indexes, lookup_type, normalize_null_default, required_str,
    ForeignKeyRow, IndexRow,
};
use super::{Dialect, ReadContext, SchemaReader};
use crate::connection::{ConnectionError, Row};
use crate::model::{
    ColumnData, Directory, ForeignKeyData, IndexData, ReferentialAction, SemanticType, TableData,
};

static DECIMAL_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:decimal|numeric)\(([0-9]+),([0-9]+)\)").unwrap());
static INTEGER_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:tinyint|smallint|mediumint|int|bigint|bit)\(([0-9]+)\)").unwrap()
});
static TEMPORAL_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:datetime|time|timestamp)\(([0-9]+)\)").unwrap());
static MEMBER_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:enum|set)\((.*)\)$").unwrap());

const TYPES: &[(&str, SemanticType)] = &[
    ("bigint", SemanticType::Integer),
    ("binary", SemanticType::Binary),
    ("blob", SemanticType::Binary),
    ("boolean", SemanticType::Boolean),
    ("date", SemanticType::Date),
    ("datetime", SemanticType::Datetime),
    ("decimal", SemanticType::Decimal),
    ("double", SemanticType::Float),
    ("enum", SemanticType::Enum),
    ("float", SemanticType::Float),
    ("int", SemanticType::Integer),
    ("json", SemanticType::Json),
    ("longblob", SemanticType::Binary),
    ("longtext", SemanticType::Text),
    ("mediumblob", SemanticType::Binary),
    ("mediumint", SemanticType::Integer),
    ("mediumtext", SemanticType::Text),
    ("set", SemanticType::Set),
    ("smallint", SemanticType::Integer),
    ("text", SemanticType::Text),
    ("time", SemanticType::Time),
    ("timestamp", SemanticType::Datetime),
    ("tinyblob", SemanticType::Binary),
    ("tinyint", SemanticType::Integer),
    ("tinytext", SemanticType::Text),
    ("varbinary", SemanticType::Binary),
];

pub(crate) const TABLES_SQL: &str = "SELECT t.TABLE_NAME AS name, t.ENGINE AS engine, \
    ccsa.CHARACTER_SET_NAME AS charset, t.TABLE_COLLATION AS collation, t.TABLE_COMMENT AS comment \
    FROM INFORMATION_SCHEMA.TABLES AS t \
    INNER JOIN INFORMATION_SCHEMA.COLLATION_CHARACTER_SET_APPLICABILITY AS ccsa \
    ON ccsa.COLLATION_NAME = t.TABLE_COLLATION \
    WHERE t.TABLE_SCHEMA = ? AND t.TABLE_TYPE = 'BASE TABLE' \
    ORDER BY t.TABLE_NAME ASC";

pub(crate) const COLUMNS_SQL: &str = "SELECT c.COLUMN_NAME AS name, c.DATA_TYPE AS type, \
    c.CHARACTER_MAXIMUM_LENGTH AS char_length, c.IS_NULLABLE AS nullable, \
    c.COLUMN_TYPE AS col_type, c.COLUMN_DEFAULT AS col_default, \
    c.CHARACTER_SET_NAME AS charset, c.COLLATION_NAME AS collation, \
    c.EXTRA AS extra, c.COLUMN_COMMENT AS comment \
    FROM INFORMATION_SCHEMA.COLUMNS AS c \
    WHERE c.TABLE_SCHEMA = ? AND c.TABLE_NAME = ? \
    ORDER BY c.ORDINAL_POSITION ASC";

pub(crate) const INDEXES_SQL: &str = "SELECT s.INDEX_NAME AS name, s.COLUMN_NAME AS column_name, \
    s.NON_UNIQUE AS not_unique, s.INDEX_TYPE AS type, s.SEQ_IN_INDEX AS seq \
    FROM INFORMATION_SCHEMA.STATISTICS AS s \
    WHERE s.TABLE_SCHEMA = ? AND s.TABLE_NAME = ? \
    ORDER BY (s.INDEX_NAME = 'PRIMARY') DESC, s.NON_UNIQUE ASC, s.INDEX_NAME ASC, s.SEQ_IN_INDEX ASC";

pub(crate) const FOREIGN_KEYS_SQL: &str = "SELECT k.CONSTRAINT_NAME AS name, k.COLUMN_NAME AS column_name, \
    k.REFERENCED_TABLE_NAME AS ref_table_name, k.REFERENCED_COLUMN_NAME AS ref_column, \
    k.ORDINAL_POSITION AS seq, r.UPDATE_RULE AS on_update, r.DELETE_RULE AS on_delete \
    FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE AS k \
    INNER JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS AS r \
    ON r.CONSTRAINT_SCHEMA = k.CONSTRAINT_SCHEMA AND r.CONSTRAINT_NAME = k.CONSTRAINT_NAME \
    AND r.TABLE_NAME = k.TABLE_NAME \
    WHERE k.TABLE_SCHEMA = ? AND k.TABLE_NAME = ? \
    ORDER BY k.ORDINAL_POSITION ASC";

/// Reader for MySQL and MariaDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlReader;

impl MysqlReader {
    /// Decode one `INFORMATION_SCHEMA.COLUMNS` row.
    pub fn parse_column(row: &Row) -> Result<(String, ColumnData), ConnectionError> {
        let name = required_str(row, "name")?;
        let data_type = required_str(row, "type")?.to_lowercase();
        let col_type = row.get_str("col_type").unwrap_or_else(|| data_type.clone());

        let mut column = ColumnData::new(data_type);

        if let Some(caps) = DECIMAL_TYPE.captures(&col_type) {
            column.length = caps[1].parse().ok();
            column.precision = caps[2].parse().ok();
        } else if let Some(caps) = INTEGER_TYPE.captures(&col_type) {
            column.length = caps[1].parse().ok();
            column.precision = Some(0);
        } else if let Some(caps) = TEMPORAL_TYPE.captures(&col_type) {
            column.precision = caps[1].parse().ok();
        } else if let Some(caps) = MEMBER_TYPE.captures(&col_type) {
            column.values = Some(caps[1].split(',').map(strip_quotes).collect());
        } else if !matches!(column.type_name.as_str(), "float" | "double" | "real") {
            column.length = row.get_u32("char_length");
        }

        column.nullable = row.get_str("nullable").as_deref() == Some("YES");
        column.unsigned = col_type.ends_with("unsigned");
        column.default = normalize_null_default(column.nullable, row.get_str("col_default"));
        column.charset = row.get_str("charset");
        column.collation = row.get_str("collation");
        column.comment = row.get_str("comment");
        column.auto_increment = row.get_str("extra").as_deref() == Some("auto_increment");

        Ok((name, column))
    }
}

/// Drop the first and last character of an enum member (its quotes).
fn strip_quotes(member: &str) -> String {
    let mut chars = member.chars();
    chars.next();
    chars.next_back();
    chars.as_str().to_string()
}

impl SchemaReader for MysqlReader {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    #[tracing::instrument(level = "debug", skip(self, ctx), fields(database = ctx.database))]
    fn read_tables(&self, ctx: &ReadContext<'_>) -> Result<Directory<TableData>, ConnectionError> {
        let rows = ctx.query(TABLES_SQL, &[Value::from(ctx.database)])?;

        rows.iter()
            .map(|row| {
                let data = TableData {
                    comment: row.get_str("comment"),
                    engine: row.get_str("engine"),
                    charset: row.get_str("charset"),
                    collation: row.get_str("collation"),
                };
                Ok((required_str(row, "name")?, data))
            })
            .collect()
    }

    #[tracing::instrument(level = "debug", skip(self, ctx))]
    fn read_columns(
        &self,
        ctx: &ReadContext<'_>,
        table: &str,
    ) -> Result<Directory<ColumnData>, ConnectionError> {
        let rows = ctx.query(COLUMNS_SQL, &[Value::from(ctx.database), Value::from(table)])?;
        rows.iter().map(Self::parse_column).collect()
    }

    #[tracing::instrument(level = "debug", skip(self, ctx))]
    fn read_indexes(
        &self,
        ctx: &ReadContext<'_>,
        table: &str,
    ) -> Result<Directory<IndexData>, ConnectionError> {
        let rows = ctx.query(INDEXES_SQL, &[Value::from(ctx.database), Value::from(table)])?;

        let rows = rows
            .iter()
            .map(|row| {
                let name = required_str(row, "name")?;
                Ok(IndexRow {
                    column: required_str(row, "column_name")?,
                    unique: !row.get_bool("not_unique"),
                    primary: name == "PRIMARY",
                    seq: row.get_i64("seq").unwrap_or_default(),
                    index_type: row.get_str("type").map(|t| t.to_lowercase()),
                    name,
                })
            })
            .collect::<Result<Vec<_>, ConnectionError>>()?;

        Ok(group_indexes(rows))
    }

    #[tracing::instrument(level = "debug", skip(self, ctx))]
    fn read_foreign_keys(
        &self,
        ctx: &ReadContext<'_>,
        table: &str,
    ) -> Result<Directory<ForeignKeyData>, ConnectionError> {
        let rows = ctx.query(FOREIGN_KEYS_SQL, &[Value::from(ctx.database), Value::from(table)])?;

        let rows = rows
            .iter()
            .map(|row| {
                Ok(ForeignKeyRow {
                    name: required_str(row, "name")?,
                    column: required_str(row, "column_name")?,
                    referenced_table: required_str(row, "ref_table_name")?,
                    referenced_column: required_str(row, "ref_column")?,
                    seq: row.get_i64("seq").unwrap_or_default(),
                    on_update: action(row, "on_update"),
                    on_delete: action(row, "on_delete"),
                })
            })
            .collect::<Result<Vec<_>, ConnectionError>>()?;

        Ok(group_foreign_keys(rows))
    }

    fn semantic_type(&self, column: &ColumnData) -> SemanticType {
        if column.type_name == "tinyint" && column.length == Some(1) {
            return SemanticType::Boolean;
        }
        lookup_type(TYPES, &column.type_name)
    }
}

fn action(row: &Row, column: &str) -> ReferentialAction {
    row.get_str(column)
        .map(|rule| ReferentialAction::parse(&rule))
        .unwrap_or_default()
}
