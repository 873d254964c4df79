//! RowSource trait definition.
//!
//! A row source yields the complete, ordered row stream for one analysis
//! run. Fetching may be asynchronous; the rows come back materialized so
//! the graph construction that follows never suspends.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::types::ColumnRow;

/// Errors raised while fetching rows.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rows: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Metadata task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Trait for fetching schema metadata rows.
///
/// Implementations must return rows ordered by (table_name,
/// ordinal_position) so that every table's columns are contiguous.
///
/// # Example
///
/// ```ignore
/// use erdm::metadata::{JsonRowSource, RowSource};
///
/// async fn example(source: &impl RowSource) -> MetadataResult<()> {
///     let rows = source.fetch_rows().await?;
///     println!("{}: {} rows", source.describe(), rows.len());
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Human-readable description for logs.
    fn describe(&self) -> String;

    /// Fetch every row of the run.
    async fn fetch_rows(&self) -> MetadataResult<Vec<ColumnRow>>;
}

#[async_trait]
impl<T: RowSource + ?Sized> RowSource for Box<T> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    async fn fetch_rows(&self) -> MetadataResult<Vec<ColumnRow>> {
        (**self).fetch_rows().await
    }
}

/// Rows held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryRowSource {
    rows: Vec<ColumnRow>,
}

impl MemoryRowSource {
    pub fn new(rows: Vec<ColumnRow>) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl RowSource for MemoryRowSource {
    fn describe(&self) -> String {
        format!("memory ({} rows)", self.rows.len())
    }

    async fn fetch_rows(&self) -> MetadataResult<Vec<ColumnRow>> {
        Ok(self.rows.clone())
    }
}

/// Rows read from a JSON array on disk, e.g. an exported query result.
#[derive(Debug, Clone)]
pub struct JsonRowSource {
    path: PathBuf,
}

impl JsonRowSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RowSource for JsonRowSource {
    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }

    async fn fetch_rows(&self) -> MetadataResult<Vec<ColumnRow>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| MetadataError::Io {
                path: self.path.clone(),
                source,
            })?;
        let rows: Vec<ColumnRow> = serde_json::from_str(&content)?;
        log::debug!("read {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}
