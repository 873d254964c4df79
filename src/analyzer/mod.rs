//! Schema analysis: row stream → entity-relationship graph → store.
//!
//! [`SchemaAnalyzer`] runs one analysis end to end:
//!
//! ```text
//! RowSource::fetch_rows (async)
//!        │
//!        ▼
//! SchemaRowProcessor::ingest (phase 1, per row)
//!        │
//!        ▼
//! SchemaRowProcessor::finalize (phase 2, pending references)
//!        │
//!        ├──► DiagnosticsSink (one warning per unresolved FK)
//!        ▼
//! GraphStore::commit (one unit of work)
//! ```

mod diagnostics;
mod processor;

pub use diagnostics::{DiagnosticsSink, LogSink, UnresolvedReference};
pub use processor::{
    add_or_merge_relationship, Analysis, MergeOutcome, PendingReference, ProcessingStats,
    SchemaRowProcessor,
};

use serde::Serialize;

use crate::erd::ErdBuildError;
use crate::metadata::{MetadataError, RowSource};
use crate::naming::NamingConvention;
use crate::store::{CommitSummary, GraphStore, StoreError};

/// Errors that abort an analysis run.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("Failed to fetch schema metadata: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Failed to build graph: {0}")]
    Build(#[from] ErdBuildError),

    #[error("Failed to store graph: {0}")]
    Store(#[from] StoreError),
}

pub type AnalyzeResult<T> = Result<T, AnalyzeError>;

/// What a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub source: String,
    pub entities: usize,
    pub columns: usize,
    pub relationships: usize,
    pub warnings: usize,
    pub stats: ProcessingStats,
    /// Present when the graph was committed
    pub commit: Option<CommitSummary>,
}

impl AnalysisSummary {
    fn new(source: String, analysis: &Analysis) -> Self {
        Self {
            source,
            entities: analysis.graph.entity_count(),
            columns: analysis.graph.column_count(),
            relationships: analysis.graph.relationship_count(),
            warnings: analysis.warnings.len(),
            stats: analysis.stats,
            commit: None,
        }
    }
}

/// Runs an analysis over one row source.
pub struct SchemaAnalyzer<S> {
    source: S,
    convention: NamingConvention,
}

impl<S: RowSource> SchemaAnalyzer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            convention: NamingConvention::default(),
        }
    }

    pub fn with_convention(mut self, convention: NamingConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch rows and run both phases without committing anything.
    pub async fn analyze_only(&self) -> AnalyzeResult<Analysis> {
        let rows = self.source.fetch_rows().await?;
        log::info!("fetched {} rows from {}", rows.len(), self.source.describe());

        let mut processor = SchemaRowProcessor::new(self.convention);
        processor.ingest_all(&rows)?;
        Ok(processor.finalize()?)
    }

    /// Full run: analyze, report warnings to `sink`, commit to `store`.
    ///
    /// Warnings never fail the run; every resolvable entity, column and
    /// relationship is committed.
    pub async fn analyze(
        &self,
        store: &mut dyn GraphStore,
        sink: &mut dyn DiagnosticsSink,
    ) -> AnalyzeResult<AnalysisSummary> {
        let analysis = self.analyze_only().await?;
        for warning in &analysis.warnings {
            sink.unresolved_reference(warning);
        }

        let mut summary = AnalysisSummary::new(self.source.describe(), &analysis);
        summary.commit = Some(store.commit(&analysis.graph)?);
        Ok(summary)
    }
}
