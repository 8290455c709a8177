//! Canonical type vocabulary shared by every dialect.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dialect-independent category of a column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SemanticType {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Json,
    Date,
    Time,
    Datetime,
    DatetimeFractional,
    DatetimeTimezone,
    Enum,
    Set,
    /// Fallback for every type a dialect does not map.
    String,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Integer => "integer",
            SemanticType::Float => "float",
            SemanticType::Decimal => "decimal",
            SemanticType::Boolean => "boolean",
            SemanticType::Text => "text",
            SemanticType::Binary => "binary",
            SemanticType::Json => "json",
            SemanticType::Date => "date",
            SemanticType::Time => "time",
            SemanticType::Datetime => "datetime",
            SemanticType::DatetimeFractional => "datetime-fractional",
            SemanticType::DatetimeTimezone => "datetime-timezone",
            SemanticType::Enum => "enum",
            SemanticType::Set => "set",
            SemanticType::String => "string",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SemanticType::Integer | SemanticType::Float | SemanticType::Decimal
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            SemanticType::Date
                | SemanticType::Time
                | SemanticType::Datetime
                | SemanticType::DatetimeFractional
                | SemanticType::DatetimeTimezone
        )
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action taken on referencing rows when a referenced key changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferentialAction {
    #[default]
    #[serde(rename = "NO ACTION")]
    NoAction,
    #[serde(rename = "CASCADE")]
    Cascade,
    #[serde(rename = "RESTRICT")]
    Restrict,
    #[serde(rename = "SET NULL")]
    SetNull,
    #[serde(rename = "SET DEFAULT")]
    SetDefault,
}

impl ReferentialAction {
    /// Parse a catalog rule name. Unknown names are treated as `NO ACTION`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().replace('_', " ").as_str() {
            "CASCADE" => ReferentialAction::Cascade,
            "RESTRICT" => ReferentialAction::Restrict,
            "SET NULL" => ReferentialAction::SetNull,
            "SET DEFAULT" => ReferentialAction::SetDefault,
            _ => ReferentialAction::NoAction,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
