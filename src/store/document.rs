//! Serializable export view of a [`SchemaGraph`].

use serde::{Deserialize, Serialize};

use crate::erd::{ColumnId, RelationshipEnd, SchemaGraph};

/// A whole graph, entities in registration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub entities: Vec<EntityDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDocument {
    pub name: String,
    pub columns: Vec<ColumnDocument>,
    /// Relationships where this entity is the referenced side
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<RelationshipDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDocument {
    pub name: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    pub ordinal_position: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub foreign_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<ColumnPath>,
}

/// `entity.column` by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPath {
    pub entity: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDocument {
    pub name: String,
    pub end1: EndDocument,
    pub end2: EndDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndDocument {
    pub entity: String,
    pub columns: Vec<String>,
    pub cardinality: String,
    pub label: String,
}

impl GraphDocument {
    pub fn from_graph(graph: &SchemaGraph) -> Self {
        let column_path = |id: ColumnId| {
            let column = graph.column(id)?;
            let entity = graph.entity(column.entity)?;
            Some(ColumnPath {
                entity: entity.name.clone(),
                column: column.name.clone(),
            })
        };
        let end = |end: &RelationshipEnd| EndDocument {
            entity: graph
                .entity(end.entity)
                .map(|e| e.name.clone())
                .unwrap_or_default(),
            columns: end
                .columns
                .iter()
                .filter_map(|&id| graph.column(id).map(|c| c.name.clone()))
                .collect(),
            cardinality: end.cardinality.to_string(),
            label: end.label.clone(),
        };

        let entities = graph
            .entities()
            .map(|(id, entity)| EntityDocument {
                name: entity.name.clone(),
                columns: graph
                    .columns_of(id)
                    .map(|(_, column)| ColumnDocument {
                        name: column.name.clone(),
                        data_type: column.data_type.clone(),
                        max_length: column.max_length,
                        precision: column.precision,
                        ordinal_position: column.ordinal_position,
                        default_value: column.default_value.clone(),
                        nullable: column.nullable,
                        primary_key: column.primary_key,
                        unique: column.unique,
                        foreign_key: column.foreign_key,
                        references: column.reference_to.and_then(&column_path),
                    })
                    .collect(),
                relationships: entity
                    .relationships()
                    .iter()
                    .map(|relationship| RelationshipDocument {
                        name: relationship.name.clone(),
                        end1: end(&relationship.end1),
                        end2: end(&relationship.end2),
                    })
                    .collect(),
            })
            .collect();

        Self { entities }
    }

    pub fn column_count(&self) -> usize {
        self.entities.iter().map(|e| e.columns.len()).sum()
    }

    pub fn relationship_count(&self) -> usize {
        self.entities.iter().map(|e| e.relationships.len()).sum()
    }

    pub fn entity(&self, name: &str) -> Option<&EntityDocument> {
        self.entities.iter().find(|e| e.name == name)
    }
}
