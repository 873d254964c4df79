//! Type definitions for the entity-relationship graph.
//!
//! Entities and columns are petgraph nodes addressed through typed ids.
//! Relationships are not nodes: they are owned by the entity on the
//! referenced ("one") side and keyed by foreign-key name there.

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

// ============================================================================
// Identifiers
// ============================================================================

/// Handle to an entity node in a [`SchemaGraph`](super::SchemaGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) NodeIndex);

/// Handle to a column node in a [`SchemaGraph`](super::SchemaGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(pub(crate) NodeIndex);

impl EntityId {
    pub fn index(self) -> usize {
        self.0.index()
    }
}

impl ColumnId {
    pub fn index(self) -> usize {
        self.0.index()
    }
}

// ============================================================================
// Supporting Enums
// ============================================================================

/// Cardinality of one end of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Referenced side: exactly one row.
    One,
    /// Referencing side: any number of rows.
    Many,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::One => write!(f, "1"),
            Cardinality::Many => write!(f, "0..*"),
        }
    }
}

// ============================================================================
// Node Types
// ============================================================================

/// Entity node (one table).
#[derive(Debug, Clone)]
pub struct EntityNode {
    /// Normalized table name
    pub name: String,
    /// Owned columns in first-seen order
    pub columns: Vec<ColumnId>,
    /// Relationships where this entity is the referenced side
    pub(crate) relationships: Vec<Relationship>,
    /// Index: relationship name → position in `relationships`
    pub(crate) relationship_index: HashMap<String, usize>,
}

impl EntityNode {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            columns: Vec::new(),
            relationships: Vec::new(),
            relationship_index: HashMap::new(),
        }
    }

    /// Relationships owned by this entity, in creation order.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Look up an owned relationship by foreign-key name.
    pub fn find_by_name(&self, name: &str) -> Option<&Relationship> {
        self.relationship_index
            .get(name)
            .map(|&pos| &self.relationships[pos])
    }

    pub(crate) fn find_by_name_mut(&mut self, name: &str) -> Option<&mut Relationship> {
        match self.relationship_index.get(name) {
            Some(&pos) => self.relationships.get_mut(pos),
            None => None,
        }
    }
}

/// Column node (one table column).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnNode {
    /// Owning entity
    pub entity: EntityId,
    /// Normalized column name
    pub name: String,
    /// Raw data type as reported by the source
    pub data_type: String,
    /// Character length for string types
    pub max_length: Option<u64>,
    /// Fractional-second precision for temporal types
    pub precision: Option<u32>,
    /// 1-based position within the table
    pub ordinal_position: u32,
    /// Column default expression
    pub default_value: Option<String>,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub foreign_key: bool,
    /// Referenced column once the foreign key is resolved
    pub reference_to: Option<ColumnId>,
}

impl ColumnNode {
    /// A foreign key that has not been resolved yet.
    pub fn is_dangling(&self) -> bool {
        self.foreign_key && self.reference_to.is_none()
    }
}

// ============================================================================
// Relationships
// ============================================================================

/// One end of a relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipEnd {
    pub entity: EntityId,
    /// Participating columns in ingestion order
    pub columns: Vec<ColumnId>,
    pub cardinality: Cardinality,
    /// Display label: comma-joined column names on the "many" end
    pub label: String,
}

/// A resolved foreign-key link, stored on the referenced entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    /// Foreign-key name
    pub name: String,
    /// Referenced ("one") end
    pub end1: RelationshipEnd,
    /// Referencing ("many") end
    pub end2: RelationshipEnd,
}

impl Relationship {
    /// Record another column of the same foreign key on the "many" end.
    pub(crate) fn append_column(&mut self, column: ColumnId, column_name: &str) {
        self.end2.columns.push(column);
        self.end2.label.push_str(", ");
        self.end2.label.push_str(column_name);
    }
}

// ============================================================================
// Foreign-key references
// ============================================================================

/// Foreign-key fact read from a row, after name normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub name: String,
    pub entity: String,
    pub column: String,
}

/// How the reference of a freshly created column stands.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnReference {
    /// The column is not a foreign key.
    None,
    /// The target already exists in the graph.
    Resolved {
        foreign_key: ForeignKeyRef,
        target: ColumnId,
    },
    /// The target is not (yet) in the graph.
    Pending(ForeignKeyRef),
}

/// A column built from a row but not yet added to its entity.
#[derive(Debug, Clone)]
pub struct CreatedColumn {
    pub column: ColumnNode,
    pub reference: ColumnReference,
}

/// A foreign key whose target is missing from the fully ingested schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedReference {
    /// Referencing column as `entity.column`
    pub column: String,
    pub foreign_key_name: String,
    pub referenced_entity: String,
    pub referenced_column: String,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reference '{}' cannot be resolved: {} -> {}.{}",
            self.foreign_key_name, self.column, self.referenced_entity, self.referenced_column
        )
    }
}

// ============================================================================
// Graph Storage
// ============================================================================

/// Node type for graph storage.
#[derive(Debug, Clone)]
pub enum GraphNode {
    Entity(EntityNode),
    Column(ColumnNode),
}

/// Edge type for graph storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEdge {
    /// Column belongs to entity
    BelongsTo,
    /// Column references column (resolved FK)
    References,
}
