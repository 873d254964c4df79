//! Two-phase construction of the graph from an ordered row stream.
//!
//! Phase 1 (`ingest`) opens an entity whenever the table name changes,
//! adds one column per row and links foreign keys whose target is already
//! known. Foreign keys pointing forward are queued. Phase 2 (`finalize`)
//! consumes the processor, replays the queue once in FIFO order against the
//! complete entity set and reports whatever is still missing.

use serde::Serialize;

use crate::erd::{
    ColumnId, ColumnReference, EntityId, ErdBuildError, ErdBuildResult, ForeignKeyRef,
    ReferenceResolution, SchemaGraph, SchemaGraphBuilder,
};
use crate::metadata::ColumnRow;
use crate::naming::{NameNormalizer, NamingConvention};

use super::UnresolvedReference;

/// A foreign key queued until every entity is known.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReference {
    pub column: ColumnId,
    pub foreign_key: ForeignKeyRef,
}

/// Counters collected across both phases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingStats {
    pub rows: usize,
    pub entities_opened: usize,
    pub pending_queued: usize,
    pub resolved_during_ingest: usize,
    pub resolved_during_finalize: usize,
    pub relationships_created: usize,
    pub relationships_merged: usize,
    pub unresolved: usize,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub graph: SchemaGraph,
    /// One entry per foreign key left without a target, in queue order
    pub warnings: Vec<UnresolvedReference>,
    pub stats: ProcessingStats,
}

/// Whether a relationship was new or absorbed into an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    Merged,
}

/// Phase-1 accumulator: the open entity and the queued references.
#[derive(Debug, Default)]
struct IngestCursor {
    current: Option<EntityId>,
    pending: Vec<PendingReference>,
}

/// Drives a [`SchemaGraphBuilder`] over one ordered row stream.
///
/// Rows must arrive grouped by table. A table name that shows up again
/// after another table opens a second, separate entity.
#[derive(Debug)]
pub struct SchemaRowProcessor<N = NamingConvention> {
    builder: SchemaGraphBuilder,
    normalizer: N,
    cursor: IngestCursor,
    stats: ProcessingStats,
}

impl<N: NameNormalizer> SchemaRowProcessor<N> {
    /// Start a run on an empty graph.
    pub fn new(normalizer: N) -> Self {
        Self::with_builder(SchemaGraphBuilder::new(), normalizer)
    }

    /// Start a run that augments an existing graph.
    pub fn with_builder(builder: SchemaGraphBuilder, normalizer: N) -> Self {
        Self {
            builder,
            normalizer,
            cursor: IngestCursor::default(),
            stats: ProcessingStats::default(),
        }
    }

    pub fn graph(&self) -> &SchemaGraph {
        self.builder.graph()
    }

    /// References queued so far.
    pub fn pending(&self) -> &[PendingReference] {
        &self.cursor.pending
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// Phase 1: ingest one row.
    pub fn ingest(&mut self, row: &ColumnRow) -> ErdBuildResult<ColumnId> {
        self.stats.rows += 1;
        let entity = self.open_entity(&row.table_name);

        let created = self
            .builder
            .create_column(entity, row, &self.normalizer)?;
        let column = self.builder.add_column(entity, created.column)?;

        match created.reference {
            ColumnReference::None => {}
            ColumnReference::Resolved {
                foreign_key,
                target,
            } => {
                self.stats.resolved_during_ingest += 1;
                let outcome = add_or_merge_relationship(
                    &mut self.builder,
                    column,
                    Some(target),
                    &foreign_key.name,
                )?;
                self.record(outcome);
            }
            ColumnReference::Pending(foreign_key) => {
                log::debug!(
                    "queued reference '{}' to {}.{}",
                    foreign_key.name,
                    foreign_key.entity,
                    foreign_key.column
                );
                self.stats.pending_queued += 1;
                self.cursor.pending.push(PendingReference {
                    column,
                    foreign_key,
                });
            }
        }

        Ok(column)
    }

    /// Phase 1 over a whole stream, in order.
    pub fn ingest_all<'a, I>(&mut self, rows: I) -> ErdBuildResult<()>
    where
        I: IntoIterator<Item = &'a ColumnRow>,
    {
        for row in rows {
            self.ingest(row)?;
        }
        Ok(())
    }

    /// Phase 2: resolve queued references and hand back the finished graph.
    ///
    /// Each queued reference is tried exactly once. A reference that still
    /// has no target becomes a warning and produces no relationship.
    pub fn finalize(mut self) -> ErdBuildResult<Analysis> {
        log::info!(
            "ingested {} rows into {} entities, {} references pending",
            self.stats.rows,
            self.stats.entities_opened,
            self.cursor.pending.len()
        );

        let pending = std::mem::take(&mut self.cursor.pending);
        let mut warnings = Vec::new();

        for reference in pending {
            match self
                .builder
                .resolve_reference(reference.column, &reference.foreign_key)?
            {
                ReferenceResolution::Resolved(target) => {
                    self.stats.resolved_during_finalize += 1;
                    let outcome = add_or_merge_relationship(
                        &mut self.builder,
                        reference.column,
                        Some(target),
                        &reference.foreign_key.name,
                    )?;
                    self.record(outcome);
                }
                ReferenceResolution::Unresolved(warning) => {
                    log::debug!("unresolved: {warning}");
                    warnings.push(warning);
                }
            }
        }
        self.stats.unresolved = warnings.len();

        let graph = self.builder.into_graph();
        log::info!(
            "resolved graph: {} entities, {} relationships, {} unresolved references",
            graph.entity_count(),
            graph.relationship_count(),
            warnings.len()
        );

        Ok(Analysis {
            graph,
            warnings,
            stats: self.stats,
        })
    }

    /// Return the open entity when the name matches, else open a new one.
    fn open_entity(&mut self, table_name: &str) -> EntityId {
        let name = self.normalizer.normalize(table_name);
        if let Some(current) = self.cursor.current {
            if self
                .builder
                .graph()
                .entity(current)
                .is_some_and(|entity| entity.name == name)
            {
                return current;
            }
        }

        log::debug!("opening entity '{name}'");
        let entity = self.builder.create_entity(name);
        let id = self.builder.add_entity(entity);
        self.cursor.current = Some(id);
        self.stats.entities_opened += 1;
        id
    }

    fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Created => self.stats.relationships_created += 1,
            MergeOutcome::Merged => self.stats.relationships_merged += 1,
        }
    }
}

/// Create the relationship `name`, or append `from` to it if it exists.
///
/// The relationship is registered on the entity owning `to`. A second
/// column under the same foreign-key name extends the "many" end label
/// instead of adding another edge.
pub fn add_or_merge_relationship(
    builder: &mut SchemaGraphBuilder,
    from: ColumnId,
    to: Option<ColumnId>,
    name: &str,
) -> ErdBuildResult<MergeOutcome> {
    let from_node = builder
        .graph()
        .column(from)
        .ok_or(ErdBuildError::UnknownColumn(from.index()))?;
    if !from_node.foreign_key {
        return Err(ErdBuildError::InvalidRelationship {
            name: name.to_string(),
            reason: format!("column '{}' is not a foreign key", from_node.name),
        });
    }
    let Some(to) = to else {
        return Err(ErdBuildError::InvalidRelationship {
            name: name.to_string(),
            reason: format!("column '{}' has no target column", from_node.name),
        });
    };
    let namespace = builder
        .graph()
        .column(to)
        .map(|column| column.entity)
        .ok_or(ErdBuildError::UnknownColumn(to.index()))?;

    if builder.find_relationship_by_name(namespace, name).is_some() {
        builder.extend_relationship(namespace, name, from)?;
        return Ok(MergeOutcome::Merged);
    }

    let relationship = builder.create_relationship(from, Some(to), name)?;
    builder.add_relationship(namespace, relationship)?;
    Ok(MergeOutcome::Created)
}
