//! # erdm
//!
//! Builds entity-relationship data models from relational schema metadata.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                RowSource (metadata)                      │
//! │   one ColumnRow per column, ordered by table/position    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [phase 1: ingest]
//! ┌─────────────────────────────────────────────────────────┐
//! │              SchemaRowProcessor (analyzer)               │
//! │   entities + columns, immediate FK resolution,           │
//! │   pending references for forward FKs                     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [phase 2: finalize]
//! ┌─────────────────────────────────────────────────────────┐
//! │                SchemaGraph (erd)                         │
//! │   entities, columns, relationships (merged per FK name)  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [commit]
//! ┌─────────────────────────────────────────────────────────┐
//! │                GraphStore (store)                        │
//! │   one atomic unit of work: JSON file or SQLite           │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod analyzer;
pub mod config;
pub mod erd;
pub mod metadata;
pub mod naming;
pub mod store;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::analyzer::{
        Analysis, AnalysisSummary, DiagnosticsSink, LogSink, SchemaAnalyzer, SchemaRowProcessor,
        UnresolvedReference,
    };
    pub use crate::erd::{
        Cardinality, ColumnId, ColumnNode, EntityId, EntityNode, ErdBuildError, Relationship,
        RelationshipEnd, SchemaGraph, SchemaGraphBuilder,
    };
    pub use crate::metadata::{ColumnRow, JsonRowSource, MemoryRowSource, RowSource, SqliteRowSource};
    pub use crate::naming::{NameNormalizer, NamingConvention};
    pub use crate::store::{GraphDocument, GraphStore, JsonGraphStore, SqliteGraphStore};
}

pub use analyzer::{SchemaAnalyzer, SchemaRowProcessor};
pub use erd::{SchemaGraph, SchemaGraphBuilder};
pub use metadata::ColumnRow;
