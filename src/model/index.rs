use serde::{Serialize, Serializer};

use super::data::IndexData;

/// A reflected index.
#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    table: String,
    name: String,
    data: IndexData,
}

impl Index {
    pub fn new(table: impl Into<String>, name: impl Into<String>, data: IndexData) -> Self {
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

    /// Member columns in index order.
    pub fn columns(&self) -> &[String] {
        &self.data.columns
    }

    pub fn is_unique(&self) -> bool {
        self.data.unique
    }

    pub fn is_primary(&self) -> bool {
        self.data.primary
    }

    /// Access method (`btree`, `hash`, ...), when the dialect reports one.
    pub fn index_type(&self) -> Option<&str> {
        self.data.index_type.as_deref()
    }

    pub fn data(&self) -> &IndexData {
        &self.data
    }
}

impl Serialize for Index {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Repr<'a> {
            name: &'a str,
            #[serde(flatten)]
            data: &'a IndexData,
        }

        Repr {
            name: &self.name,
            data: &self.data,
        }
        .serialize(serializer)
    }
}
