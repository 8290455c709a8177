//! Entity model.
//!
//! Readers produce raw records ([`TableData`], [`ColumnData`], [`IndexData`],
//! [`ForeignKeyData`]) grouped in [`Directory`] maps. Tables wrap records in
//! the entity types on first request.

mod column;
mod data;
mod directory;
mod foreign_key;
mod index;
mod types;

pub use column::Column;
pub(crate) use column::is_numeric;
pub use data::{ColumnData, ForeignKeyData, IndexData, TableData};
pub use directory::Directory;
pub use foreign_key::ForeignKey;
pub use index::Index;
pub use types::{ReferentialAction, SemanticType};
