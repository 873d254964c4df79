//! Read-only queries over a [`SchemaGraph`].

use std::fmt::Write as _;

use petgraph::visit::EdgeRef;
use petgraph::Direction;

use super::{ColumnId, ColumnNode, EntityId, EntityNode, GraphEdge, GraphNode, Relationship, SchemaGraph};

impl SchemaGraph {
    pub fn entity(&self, id: EntityId) -> Option<&EntityNode> {
        match self.graph.node_weight(id.0) {
            Some(GraphNode::Entity(entity)) => Some(entity),
            _ => None,
        }
    }

    pub fn column(&self, id: ColumnId) -> Option<&ColumnNode> {
        match self.graph.node_weight(id.0) {
            Some(GraphNode::Column(column)) => Some(column),
            _ => None,
        }
    }

    /// Entity ids in registration order.
    pub fn entity_ids(&self) -> &[EntityId] {
        &self.entities
    }

    /// Entities in registration order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &EntityNode)> + '_ {
        self.entities
            .iter()
            .filter_map(|&id| self.entity(id).map(|entity| (id, entity)))
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn column_count(&self) -> usize {
        self.entities()
            .map(|(_, entity)| entity.columns.len())
            .sum()
    }

    pub fn relationship_count(&self) -> usize {
        self.entities()
            .map(|(_, entity)| entity.relationships.len())
            .sum()
    }

    /// First entity registered under `name`.
    pub fn find_entity(&self, name: &str) -> Option<EntityId> {
        self.entity_index.get(name)?.first().copied()
    }

    /// Every entity registered under `name`, oldest first.
    pub fn entities_named(&self, name: &str) -> &[EntityId] {
        self.entity_index
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Find a column of `entity` by name.
    pub fn find_column(&self, entity: EntityId, name: &str) -> Option<ColumnId> {
        self.entity(entity)?
            .columns
            .iter()
            .copied()
            .find(|&id| self.column(id).is_some_and(|column| column.name == name))
    }

    /// Find `entity.column`, trying same-named entities in registration order.
    pub fn lookup_column(&self, entity: &str, column: &str) -> Option<ColumnId> {
        self.entities_named(entity)
            .iter()
            .find_map(|&id| self.find_column(id, column))
    }

    /// Columns of `entity` in order.
    pub fn columns_of(&self, entity: EntityId) -> impl Iterator<Item = (ColumnId, &ColumnNode)> + '_ {
        self.entity(entity)
            .map(|e| e.columns.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|&id| self.column(id).map(|column| (id, column)))
    }

    /// All relationships with the entity that owns them.
    pub fn relationships(&self) -> impl Iterator<Item = (EntityId, &Relationship)> + '_ {
        self.entities().flat_map(|(id, entity)| {
            entity
                .relationships
                .iter()
                .map(move |relationship| (id, relationship))
        })
    }

    /// Foreign-key columns that never got a target.
    pub fn dangling_columns(&self) -> Vec<ColumnId> {
        self.entities()
            .flat_map(|(id, _)| self.columns_of(id))
            .filter(|(_, column)| column.is_dangling())
            .map(|(id, _)| id)
            .collect()
    }

    /// Columns whose REFERENCES edge points at `target`.
    pub fn referencing_columns(&self, target: ColumnId) -> Vec<ColumnId> {
        let mut columns: Vec<ColumnId> = self
            .graph
            .edges_directed(target.0, Direction::Incoming)
            .filter(|edge| *edge.weight() == GraphEdge::References)
            .map(|edge| ColumnId(edge.source()))
            .collect();
        columns.sort();
        columns
    }

    /// `entity.column` for a column id.
    pub fn qualified_name(&self, id: ColumnId) -> Option<String> {
        let column = self.column(id)?;
        let entity = self.entity(column.entity)?;
        Some(format!("{}.{}", entity.name, column.name))
    }

    /// Plain-text rendering, one entity block per table.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (id, entity) in self.entities() {
            let _ = writeln!(out, "{}", entity.name);
            for (_, column) in self.columns_of(id) {
                let mut flags = Vec::new();
                if column.primary_key {
                    flags.push("PK".to_string());
                }
                if column.unique {
                    flags.push("UQ".to_string());
                }
                if column.foreign_key {
                    let target = column
                        .reference_to
                        .and_then(|target| self.qualified_name(target))
                        .unwrap_or_else(|| "?".to_string());
                    flags.push(format!("FK -> {target}"));
                }
                if !column.nullable {
                    flags.push("NOT NULL".to_string());
                }
                let flags = if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join(", "))
                };
                let _ = writeln!(out, "  {} {}{}", column.name, column.data_type, flags);
            }
            for relationship in &entity.relationships {
                let many = self
                    .entity(relationship.end2.entity)
                    .map(|e| e.name.as_str())
                    .unwrap_or("?");
                let _ = writeln!(
                    out,
                    "  <{}> {} {} ({})",
                    relationship.name, relationship.end2.cardinality, many, relationship.end2.label
                );
            }
        }
        out
    }
}
