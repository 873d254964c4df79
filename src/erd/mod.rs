//! Entity-relationship graph: entities, columns and foreign-key relationships.
//!
//! [`SchemaGraph`] holds the data; [`SchemaGraphBuilder`] provides the
//! creation and lookup primitives the row processor drives.

mod builder;
pub mod query;
pub mod types;

pub use builder::{ErdBuildError, ErdBuildResult, ReferenceResolution, SchemaGraphBuilder};
pub use types::*;

use petgraph::graph::DiGraph;
use std::collections::HashMap;

/// The entity-relationship graph.
///
/// Nodes are entities and columns. Edges:
/// - BELONGS_TO: column → entity
/// - REFERENCES: column → column (resolved FK)
///
/// Relationships live on the referenced entity node.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    /// The underlying directed graph
    graph: DiGraph<GraphNode, GraphEdge>,

    /// Registered entities in registration order
    entities: Vec<EntityId>,

    /// Index: entity name → every entity registered under it
    entity_index: HashMap<String, Vec<EntityId>>,
}

impl SchemaGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            entities: Vec::new(),
            entity_index: HashMap::new(),
        }
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut EntityNode> {
        match self.graph.node_weight_mut(id.0) {
            Some(GraphNode::Entity(entity)) => Some(entity),
            _ => None,
        }
    }

    pub(crate) fn column_mut(&mut self, id: ColumnId) -> Option<&mut ColumnNode> {
        match self.graph.node_weight_mut(id.0) {
            Some(GraphNode::Column(column)) => Some(column),
            _ => None,
        }
    }
}

impl Default for SchemaGraph {
    fn default() -> Self {
        Self::new()
    }
}
