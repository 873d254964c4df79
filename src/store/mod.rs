//! Persistence of finished graphs.
//!
//! A [`GraphStore`] receives a completed graph as one unit of work: either
//! the whole graph becomes visible or none of it does.

mod document;
mod json_store;
mod sqlite_store;

pub use document::{
    ColumnDocument, ColumnPath, EndDocument, EntityDocument, GraphDocument, RelationshipDocument,
};
pub use json_store::JsonGraphStore;
pub use sqlite_store::SqliteGraphStore;

use serde::Serialize;

use crate::erd::SchemaGraph;

/// Errors that can occur while committing a graph.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Value {value} of {column} does not fit the store")]
    ValueOutOfRange { column: String, value: u64 },

    #[error("Store schema version {found} does not match expected {expected}")]
    VersionMismatch { found: i64, expected: i64 },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// What a commit wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub target: String,
    /// Run row id, for stores that keep history
    pub run_id: Option<i64>,
    pub entities: usize,
    pub columns: usize,
    pub relationships: usize,
}

impl CommitSummary {
    fn new(target: String, run_id: Option<i64>, graph: &SchemaGraph) -> Self {
        Self {
            target,
            run_id,
            entities: graph.entity_count(),
            columns: graph.column_count(),
            relationships: graph.relationship_count(),
        }
    }
}

/// Commits a graph atomically.
pub trait GraphStore {
    fn commit(&mut self, graph: &SchemaGraph) -> StoreResult<CommitSummary>;
}

/// Keeps committed graphs in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraphStore {
    pub documents: Vec<GraphDocument>,
}

impl GraphStore for MemoryGraphStore {
    fn commit(&mut self, graph: &SchemaGraph) -> StoreResult<CommitSummary> {
        self.documents.push(GraphDocument::from_graph(graph));
        Ok(CommitSummary::new(
            "memory".to_string(),
            Some(self.documents.len() as i64),
            graph,
        ))
    }
}
