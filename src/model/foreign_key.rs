use serde::{Serialize, Serializer};

use super::data::ForeignKeyData;
use super::types::ReferentialAction;

/// A reflected foreign key.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    table: String,
    name: String,
    data: ForeignKeyData,
}

impl ForeignKey {
    pub fn new(table: impl Into<String>, name: impl Into<String>, data: ForeignKeyData) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.data.columns
    }

    pub fn referenced_table(&self) -> &str {
        &self.data.referenced_table
    }

    pub fn referenced_columns(&self) -> &[String] {
        &self.data.referenced_columns
    }

    /// Local and referenced columns paired by position.
    pub fn column_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data
            .columns
            .iter()
            .zip(&self.data.referenced_columns)
            .map(|(local, referenced)| (local.as_str(), referenced.as_str()))
    }

    pub fn on_update(&self) -> ReferentialAction {
        self.data.on_update
    }

    pub fn on_delete(&self) -> ReferentialAction {
        self.data.on_delete
    }

    pub fn data(&self) -> &ForeignKeyData {
        &self.data
    }
}

impl Serialize for ForeignKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            name: &'a str,
            #[serde(flatten)]
            data: &'a ForeignKeyData,
        }

        Repr {
            name: &self.name,
            data: &self.data,
        }
        .serialize(serializer)
    }
}
