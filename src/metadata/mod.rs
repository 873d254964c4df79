//! Metadata row sources.
//!
//! A row source produces one [`ColumnRow`] per table column, ordered by
//! table and ordinal position. This is the only input the graph
//! construction needs.
//!
//! # Example
//!
//! ```ignore
//! use erdm::metadata::{RowSource, SqliteRowSource};
//!
//! let source = SqliteRowSource::new("./app.db");
//! let rows = source.fetch_rows().await?;
//! ```

mod provider;
mod sqlite_provider;
mod types;

pub use provider::{JsonRowSource, MemoryRowSource, MetadataError, MetadataResult, RowSource};
pub use sqlite_provider::SqliteRowSource;
pub use types::{sort_rows, ColumnRow};
