use std::fmt;
use std::sync::Weak;

use serde::{Serialize, Serializer};

use super::data::ColumnData;
use super::types::SemanticType;
use crate::connection::{Connection, ConnectionError, SqliteConnection, Value};
use crate::error::SchemaResult;

/// A reflected column.
pub struct Column {
    table: String,
    name: String,
    data: ColumnData,
    semantic_type: SemanticType,
    connection: Weak<dyn Connection>,
}

impl Column {
    pub fn new(
        table: impl Into<String>,
        name: impl Into<String>,
        data: ColumnData,
        semantic_type: SemanticType,
        connection: Weak<dyn Connection>,
    ) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            data,
            semantic_type,
            connection,
        }
    }

    /// A column not bound to any connection. Only literal defaults can be
    /// evaluated.
    pub fn detached(
        table: impl Into<String>,
        name: impl Into<String>,
        data: ColumnData,
        semantic_type: SemanticType,
    ) -> Self {
        let unbound: Weak<dyn Connection> = Weak::<SqliteConnection>::new();
        Self::new(table, name, data, semantic_type, unbound)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning table.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Dialect-native type name (`varchar`, `int`, `timestamptz`, ...).
    pub fn type_name(&self) -> &str {
        &self.data.type_name
    }

    pub fn semantic_type(&self) -> SemanticType {
        self.semantic_type
    }

    pub fn length(&self) -> Option<u32> {
        self.data.length
    }

    pub fn precision(&self) -> Option<u32> {
        self.data.precision
    }

    /// Enumerated members for enum and set columns.
    pub fn values(&self) -> Option<&[String]> {
        self.data.values.as_deref()
    }

    pub fn is_nullable(&self) -> bool {
        self.data.nullable
    }

    pub fn is_unsigned(&self) -> bool {
        self.data.unsigned
    }

    pub fn is_auto_increment(&self) -> bool {
        self.data.auto_increment
    }

    /// Raw default in native literal form.
    pub fn default(&self) -> Option<&str> {
        self.data.default.as_deref()
    }

    pub fn charset(&self) -> Option<&str> {
        self.data.charset.as_deref()
    }

    pub fn collation(&self) -> Option<&str> {
        self.data.collation.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.data.comment.as_deref()
    }

    /// The raw attributes this column was built from.
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Evaluate the default to a value.
    ///
    /// Literals are decoded locally. Anything else (`CURRENT_TIMESTAMP`,
    /// `now()`, arithmetic) is evaluated by the database.
    pub fn default_value(&self) -> SchemaResult<Value> {
        let raw = match self.data.default.as_deref() {
            None | Some("") => return Ok(Value::String(String::new())),
            Some(raw) => raw,
        };

        if let Some(value) = literal_value(raw) {
            return Ok(value);
        }

        let connection = self.connection.upgrade().ok_or(ConnectionError::Closed)?;
        tracing::debug!(table = %self.table, column = %self.name, expr = raw, "evaluating column default");
        let rows = connection.query(&format!("SELECT {}", raw), &[])?;
        Ok(rows
            .first()
            .and_then(|row| row.get_index(0))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

/// Decode a default that is a plain literal.
fn literal_value(raw: &str) -> Option<Value> {
    if raw.eq_ignore_ascii_case("null") {
        return Some(Value::Null);
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = raw.parse::<i64>() {
            return Some(Value::from(n));
        }
    }
    if is_numeric(raw) {
        if let Ok(f) = raw.trim().parse::<f64>() {
            return serde_json::Number::from_f64(f).map(Value::Number);
        }
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Some(Value::String(raw[1..raw.len() - 1].replace("''", "'")));
    }
    None
}

/// A decimal number with optional sign, fraction and exponent.
pub(crate) fn is_numeric(raw: &str) -> bool {
    let s = raw.trim();
    let s = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);
    let (mantissa, exponent) = match s.find(|c: char| c == 'e' || c == 'E') {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };
    let mut parts = mantissa.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next().unwrap_or_default();
    let digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());

    let mantissa_ok = !(whole.is_empty() && fraction.is_empty()) && digits(whole) && digits(fraction);
    let exponent_ok = match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(e);
            !e.is_empty() && digits(e)
        }
    };
    mantissa_ok && exponent_ok
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("table", &self.table)
            .field("name", &self.name)
            .field("semantic_type", &self.semantic_type)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Repr<'a> {
            name: &'a str,
            #[serde(flatten)]
            data: &'a ColumnData,
            semantic_type: SemanticType,
        }

        Repr {
            name: &self.name,
            data: &self.data,
            semantic_type: self.semantic_type,
        }
        .serialize(serializer)
    }
}
