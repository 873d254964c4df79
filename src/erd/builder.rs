//! Creation and lookup primitives for the entity-relationship graph.
//!
//! [`SchemaGraphBuilder`] knows nothing about SQL or row ordering. It turns
//! single rows into columns, resolves foreign keys against whatever has been
//! registered so far and keeps the relationship invariants:
//!
//! - a relationship always starts from a foreign-key column and has a target
//! - at most one relationship per (referenced entity, foreign-key name)

use crate::metadata::ColumnRow;
use crate::naming::NameNormalizer;

use super::{
    Cardinality, ColumnId, ColumnNode, ColumnReference, CreatedColumn, EntityId, EntityNode,
    ForeignKeyRef, GraphEdge, GraphNode, Relationship, RelationshipEnd, SchemaGraph,
    UnresolvedReference,
};

// ============================================================================
// Error Types
// ============================================================================

/// Contract violations raised while building the graph.
///
/// These indicate a caller bug, never bad source data: unresolvable
/// references are reported as [`ReferenceResolution::Unresolved`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ErdBuildError {
    #[error("Invalid relationship '{name}': {reason}")]
    InvalidRelationship { name: String, reason: String },

    #[error("Duplicate relationship '{name}' on entity {entity}")]
    DuplicateRelationship { entity: String, name: String },

    #[error("Entity not found: #{0}")]
    UnknownEntity(usize),

    #[error("Column not found: #{0}")]
    UnknownColumn(usize),
}

pub type ErdBuildResult<T> = Result<T, ErdBuildError>;

/// Outcome of resolving a queued foreign key.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceResolution {
    Resolved(ColumnId),
    Unresolved(UnresolvedReference),
}

// ============================================================================
// Builder
// ============================================================================

/// Owns a [`SchemaGraph`] and exposes the primitives used to grow it.
#[derive(Debug, Clone, Default)]
pub struct SchemaGraphBuilder {
    graph: SchemaGraph,
}

impl SchemaGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue building on top of an existing graph.
    pub fn from_graph(graph: SchemaGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    pub fn into_graph(self) -> SchemaGraph {
        self.graph
    }

    // ------------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------------

    /// Construct an unregistered entity with no columns or relationships.
    ///
    /// No deduplication happens here; registering two entities with the
    /// same name yields two distinct entities.
    pub fn create_entity(&self, name: impl Into<String>) -> EntityNode {
        EntityNode::new(name.into())
    }

    /// Register an entity, making it discoverable by name.
    pub fn add_entity(&mut self, entity: EntityNode) -> EntityId {
        let name = entity.name.clone();
        let id = EntityId(self.graph.graph.add_node(GraphNode::Entity(entity)));
        self.graph.entities.push(id);
        self.graph.entity_index.entry(name).or_default().push(id);
        id
    }

    // ------------------------------------------------------------------------
    // Columns
    // ------------------------------------------------------------------------

    /// Map one row into a column of `entity`.
    ///
    /// Every identifier read from the row goes through `normalizer`. A
    /// foreign-key column is resolved against the graph built so far; when
    /// the target is missing the reference comes back as
    /// [`ColumnReference::Pending`].
    pub fn create_column(
        &self,
        entity: EntityId,
        row: &ColumnRow,
        normalizer: &dyn NameNormalizer,
    ) -> ErdBuildResult<CreatedColumn> {
        if self.graph.entity(entity).is_none() {
            return Err(ErdBuildError::UnknownEntity(entity.index()));
        }

        let mut column = ColumnNode {
            entity,
            name: normalizer.normalize(&row.column_name),
            data_type: row.data_type.clone(),
            max_length: row.max_length,
            precision: row.date_precision,
            ordinal_position: row.ordinal_position,
            default_value: row.default_setting.clone(),
            nullable: row.is_nullable,
            primary_key: row.is_primary_key,
            unique: row.is_unique,
            foreign_key: row.is_foreign_key,
            reference_to: None,
        };

        if !row.is_foreign_key {
            return Ok(CreatedColumn {
                column,
                reference: ColumnReference::None,
            });
        }

        let normalize = |raw: &Option<String>| {
            raw.as_deref()
                .map(|name| normalizer.normalize(name))
                .unwrap_or_default()
        };
        let foreign_key = ForeignKeyRef {
            name: normalize(&row.foreign_key_name),
            entity: normalize(&row.referenced_table_name),
            column: normalize(&row.referenced_column_name),
        };

        let reference = match self.graph.lookup_column(&foreign_key.entity, &foreign_key.column) {
            Some(target) => {
                column.reference_to = Some(target);
                ColumnReference::Resolved {
                    foreign_key,
                    target,
                }
            }
            None => ColumnReference::Pending(foreign_key),
        };

        Ok(CreatedColumn { column, reference })
    }

    /// Append a column to its entity, in order.
    pub fn add_column(&mut self, entity: EntityId, mut column: ColumnNode) -> ErdBuildResult<ColumnId> {
        if self.graph.entity(entity).is_none() {
            return Err(ErdBuildError::UnknownEntity(entity.index()));
        }
        column.entity = entity;
        let reference = column.reference_to;

        let id = ColumnId(self.graph.graph.add_node(GraphNode::Column(column)));
        self.graph.graph.add_edge(id.0, entity.0, GraphEdge::BelongsTo);
        if let Some(target) = reference {
            self.graph.graph.add_edge(id.0, target.0, GraphEdge::References);
        }

        if let Some(owner) = self.graph.entity_mut(entity) {
            owner.columns.push(id);
        }
        Ok(id)
    }

    /// Resolve a queued foreign key against the current graph.
    ///
    /// On success `column.reference_to` is set and a REFERENCES edge is
    /// added. A missing target is not an error: it comes back as
    /// [`ReferenceResolution::Unresolved`] for the caller to report.
    pub fn resolve_reference(
        &mut self,
        column: ColumnId,
        foreign_key: &ForeignKeyRef,
    ) -> ErdBuildResult<ReferenceResolution> {
        if self.graph.column(column).is_none() {
            return Err(ErdBuildError::UnknownColumn(column.index()));
        }

        match self.graph.lookup_column(&foreign_key.entity, &foreign_key.column) {
            Some(target) => {
                if let Some(node) = self.graph.column_mut(column) {
                    node.reference_to = Some(target);
                }
                self.graph
                    .graph
                    .add_edge(column.0, target.0, GraphEdge::References);
                Ok(ReferenceResolution::Resolved(target))
            }
            None => Ok(ReferenceResolution::Unresolved(UnresolvedReference {
                column: self.graph.qualified_name(column).unwrap_or_default(),
                foreign_key_name: foreign_key.name.clone(),
                referenced_entity: foreign_key.entity.clone(),
                referenced_column: foreign_key.column.clone(),
            })),
        }
    }

    // ------------------------------------------------------------------------
    // Relationships
    // ------------------------------------------------------------------------

    /// Build a relationship from a foreign-key column to its target.
    ///
    /// The "one" end is the target column's entity, the "many" end is the
    /// source column's entity, labelled with the source column name.
    pub fn create_relationship(
        &self,
        from: ColumnId,
        to: Option<ColumnId>,
        name: impl Into<String>,
    ) -> ErdBuildResult<Relationship> {
        let name = name.into();
        let from_node = self
            .graph
            .column(from)
            .ok_or(ErdBuildError::UnknownColumn(from.index()))?;

        if !from_node.foreign_key {
            return Err(ErdBuildError::InvalidRelationship {
                name,
                reason: format!("column '{}' is not a foreign key", from_node.name),
            });
        }
        let Some(to) = to else {
            return Err(ErdBuildError::InvalidRelationship {
                name,
                reason: format!("column '{}' has no target column", from_node.name),
            });
        };
        let to_node = self
            .graph
            .column(to)
            .ok_or(ErdBuildError::UnknownColumn(to.index()))?;

        Ok(Relationship {
            name,
            end1: RelationshipEnd {
                entity: to_node.entity,
                columns: vec![to],
                cardinality: Cardinality::One,
                label: String::new(),
            },
            end2: RelationshipEnd {
                entity: from_node.entity,
                columns: vec![from],
                cardinality: Cardinality::Many,
                label: from_node.name.clone(),
            },
        })
    }

    /// Register a relationship on `namespace`, keyed by its name.
    pub fn add_relationship(
        &mut self,
        namespace: EntityId,
        relationship: Relationship,
    ) -> ErdBuildResult<()> {
        let entity = self
            .graph
            .entity_mut(namespace)
            .ok_or(ErdBuildError::UnknownEntity(namespace.index()))?;

        if entity.relationship_index.contains_key(&relationship.name) {
            return Err(ErdBuildError::DuplicateRelationship {
                entity: entity.name.clone(),
                name: relationship.name,
            });
        }

        entity
            .relationship_index
            .insert(relationship.name.clone(), entity.relationships.len());
        entity.relationships.push(relationship);
        Ok(())
    }

    pub fn find_relationship_by_name(&self, entity: EntityId, name: &str) -> Option<&Relationship> {
        self.graph.entity(entity)?.find_by_name(name)
    }

    /// Add `column` to the "many" end of an existing relationship.
    pub fn extend_relationship(
        &mut self,
        namespace: EntityId,
        name: &str,
        column: ColumnId,
    ) -> ErdBuildResult<()> {
        let column_name = self
            .graph
            .column(column)
            .map(|c| c.name.clone())
            .ok_or(ErdBuildError::UnknownColumn(column.index()))?;

        let relationship = self
            .graph
            .entity_mut(namespace)
            .ok_or(ErdBuildError::UnknownEntity(namespace.index()))?
            .find_by_name_mut(name)
            .ok_or_else(|| ErdBuildError::InvalidRelationship {
                name: name.to_string(),
                reason: "relationship is not registered".to_string(),
            })?;

        relationship.append_column(column, &column_name);
        Ok(())
    }
}
