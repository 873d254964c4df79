//! SQLite graph store.
//!
//! Each commit becomes one run in `erd_run` and is written inside a single
//! transaction. Earlier runs are left untouched.
//!
//! # Tables
//!
//! ```text
//! erd_run                  id, created_at
//! erd_entity               id, run_id, position, name
//! erd_column               id, entity_id, position, name, data_type, ...,
//!                          references_column_id
//! erd_relationship         id, entity_id, position, name, one_entity_id,
//!                          one_column_id, many_entity_id, label
//! erd_relationship_column  relationship_id, position, column_id
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};

use super::document::{
    ColumnDocument, ColumnPath, EndDocument, EntityDocument, RelationshipDocument,
};
use super::{CommitSummary, GraphDocument, GraphStore, StoreError, StoreResult};
use crate::erd::{Cardinality, ColumnId, EntityId, SchemaGraph};

/// Current store schema version, kept in `PRAGMA user_version`.
const STORE_VERSION: i64 = 1;

pub struct SqliteGraphStore {
    conn: Connection,
    target: String,
}

impl SqliteGraphStore {
    /// Open or create a store file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn,
            target: path.display().to_string(),
        };
        store.init()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            target: ":memory:".to_string(),
        };
        store.init()?;
        Ok(store)
    }

    /// Default store location: `<data_dir>/erdm/erdm.db`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("erdm").join("erdm.db"))
    }

    fn init(&self) -> StoreResult<()> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if version != 0 && version != STORE_VERSION {
            return Err(StoreError::VersionMismatch {
                found: version,
                expected: STORE_VERSION,
            });
        }

        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS erd_run (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS erd_entity (
                id INTEGER PRIMARY KEY,
                run_id INTEGER NOT NULL REFERENCES erd_run(id),
                position INTEGER NOT NULL,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS erd_column (
                id INTEGER PRIMARY KEY,
                entity_id INTEGER NOT NULL REFERENCES erd_entity(id),
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                data_type TEXT NOT NULL,
                max_length INTEGER,
                precision INTEGER,
                ordinal_position INTEGER NOT NULL,
                default_value TEXT,
                nullable INTEGER NOT NULL,
                primary_key INTEGER NOT NULL,
                is_unique INTEGER NOT NULL,
                foreign_key INTEGER NOT NULL,
                references_column_id INTEGER REFERENCES erd_column(id)
            );

            CREATE TABLE IF NOT EXISTS erd_relationship (
                id INTEGER PRIMARY KEY,
                entity_id INTEGER NOT NULL REFERENCES erd_entity(id),
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                one_entity_id INTEGER NOT NULL REFERENCES erd_entity(id),
                one_column_id INTEGER NOT NULL REFERENCES erd_column(id),
                many_entity_id INTEGER NOT NULL REFERENCES erd_entity(id),
                label TEXT NOT NULL,
                UNIQUE (entity_id, name)
            );

            CREATE TABLE IF NOT EXISTS erd_relationship_column (
                relationship_id INTEGER NOT NULL REFERENCES erd_relationship(id),
                position INTEGER NOT NULL,
                column_id INTEGER NOT NULL REFERENCES erd_column(id),
                PRIMARY KEY (relationship_id, position)
            );
            ",
        )?;
        self.conn
            .execute_batch(&format!("PRAGMA user_version = {STORE_VERSION}"))?;
        Ok(())
    }

    /// Run ids, oldest first.
    pub fn runs(&self) -> StoreResult<Vec<i64>> {
        let mut stmt = self.conn.prepare("SELECT id FROM erd_run ORDER BY id")?;
        let runs = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(runs)
    }

    /// Most recent run id.
    pub fn latest_run(&self) -> StoreResult<Option<i64>> {
        Ok(self
            .conn
            .query_row("SELECT MAX(id) FROM erd_run", [], |row| row.get(0))
            .optional()?
            .flatten())
    }

    /// Rebuild the document committed as `run_id`.
    pub fn load_document(&self, run_id: i64) -> StoreResult<GraphDocument> {
        let mut entity_stmt = self
            .conn
            .prepare("SELECT id, name FROM erd_entity WHERE run_id = ?1 ORDER BY position")?;
        let entity_rows = entity_stmt
            .query_map(params![run_id], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut column_stmt = self.conn.prepare(
            "SELECT c.name, c.data_type, c.max_length, c.precision, c.ordinal_position,
                    c.default_value, c.nullable, c.primary_key, c.is_unique, c.foreign_key,
                    re.name, rc.name
             FROM erd_column c
             LEFT JOIN erd_column rc ON rc.id = c.references_column_id
             LEFT JOIN erd_entity re ON re.id = rc.entity_id
             WHERE c.entity_id = ?1
             ORDER BY c.position",
        )?;
        let mut relationship_stmt = self.conn.prepare(
            "SELECT r.id, r.name, oe.name, oc.name, me.name, r.label
             FROM erd_relationship r
             JOIN erd_entity oe ON oe.id = r.one_entity_id
             JOIN erd_column oc ON oc.id = r.one_column_id
             JOIN erd_entity me ON me.id = r.many_entity_id
             WHERE r.entity_id = ?1
             ORDER BY r.position",
        )?;
        let mut member_stmt = self.conn.prepare(
            "SELECT c.name FROM erd_relationship_column rc
             JOIN erd_column c ON c.id = rc.column_id
             WHERE rc.relationship_id = ?1
             ORDER BY rc.position",
        )?;

        let mut entities = Vec::with_capacity(entity_rows.len());
        for (entity_id, name) in entity_rows {
            let columns = column_stmt
                .query_map(params![entity_id], |row| {
                    let ref_entity: Option<String> = row.get(10)?;
                    let ref_column: Option<String> = row.get(11)?;
                    Ok(ColumnDocument {
                        name: row.get(0)?,
                        data_type: row.get(1)?,
                        max_length: row.get::<_, Option<u64>>(2)?,
                        precision: row.get(3)?,
                        ordinal_position: row.get(4)?,
                        default_value: row.get(5)?,
                        nullable: row.get(6)?,
                        primary_key: row.get(7)?,
                        unique: row.get(8)?,
                        foreign_key: row.get(9)?,
                        references: ref_entity
                            .zip(ref_column)
                            .map(|(entity, column)| ColumnPath { entity, column }),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let relationship_rows = relationship_stmt
                .query_map(params![entity_id], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut relationships = Vec::with_capacity(relationship_rows.len());
            for (relationship_id, rel_name, one_entity, one_column, many_entity, label) in
                relationship_rows
            {
                let members = member_stmt
                    .query_map(params![relationship_id], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                relationships.push(RelationshipDocument {
                    name: rel_name,
                    end1: EndDocument {
                        entity: one_entity,
                        columns: vec![one_column],
                        cardinality: Cardinality::One.to_string(),
                        label: String::new(),
                    },
                    end2: EndDocument {
                        entity: many_entity,
                        columns: members,
                        cardinality: Cardinality::Many.to_string(),
                        label,
                    },
                });
            }

            entities.push(EntityDocument {
                name,
                columns,
                relationships,
            });
        }

        Ok(GraphDocument { entities })
    }
}

impl GraphStore for SqliteGraphStore {
    fn commit(&mut self, graph: &SchemaGraph) -> StoreResult<CommitSummary> {
        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        // Dropping the transaction without commit rolls it back.
        let tx = self.conn.transaction()?;
        tx.execute("INSERT INTO erd_run (created_at) VALUES (?1)", params![created_at])?;
        let run_id = tx.last_insert_rowid();

        let mut entity_ids: HashMap<EntityId, i64> = HashMap::new();
        let mut column_ids: HashMap<ColumnId, i64> = HashMap::new();

        for (position, (id, entity)) in graph.entities().enumerate() {
            tx.execute(
                "INSERT INTO erd_entity (run_id, position, name) VALUES (?1, ?2, ?3)",
                params![run_id, position as i64, entity.name],
            )?;
            let entity_row = tx.last_insert_rowid();
            entity_ids.insert(id, entity_row);

            for (column_position, (column_id, column)) in graph.columns_of(id).enumerate() {
                let max_length = column
                    .max_length
                    .map(|value| {
                        i64::try_from(value).map_err(|_| StoreError::ValueOutOfRange {
                            column: format!("{}.{}", entity.name, column.name),
                            value,
                        })
                    })
                    .transpose()?;
                tx.execute(
                    "INSERT INTO erd_column (entity_id, position, name, data_type, max_length,
                        precision, ordinal_position, default_value, nullable, primary_key,
                        is_unique, foreign_key)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        entity_row,
                        column_position as i64,
                        column.name,
                        column.data_type,
                        max_length,
                        column.precision,
                        column.ordinal_position,
                        column.default_value,
                        column.nullable,
                        column.primary_key,
                        column.unique,
                        column.foreign_key,
                    ],
                )?;
                column_ids.insert(column_id, tx.last_insert_rowid());
            }
        }

        for (id, entity) in graph.entities() {
            for (column_id, column) in graph.columns_of(id) {
                let Some(target) = column.reference_to else {
                    continue;
                };
                tx.execute(
                    "UPDATE erd_column SET references_column_id = ?1 WHERE id = ?2",
                    params![column_ids.get(&target), column_ids.get(&column_id)],
                )?;
            }

            for (position, relationship) in entity.relationships().iter().enumerate() {
                let one_column = relationship.end1.columns.first().and_then(|c| column_ids.get(c));
                tx.execute(
                    "INSERT INTO erd_relationship (entity_id, position, name, one_entity_id,
                        one_column_id, many_entity_id, label)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        entity_ids.get(&id),
                        position as i64,
                        relationship.name,
                        entity_ids.get(&relationship.end1.entity),
                        one_column,
                        entity_ids.get(&relationship.end2.entity),
                        relationship.end2.label,
                    ],
                )?;
                let relationship_row = tx.last_insert_rowid();
                for (member_position, member) in relationship.end2.columns.iter().enumerate() {
                    tx.execute(
                        "INSERT INTO erd_relationship_column (relationship_id, position, column_id)
                         VALUES (?1, ?2, ?3)",
                        params![relationship_row, member_position as i64, column_ids.get(member)],
                    )?;
                }
            }
        }

        tx.commit()?;
        log::info!("committed graph as run {run_id} to {}", self.target);
        Ok(CommitSummary::new(self.target.clone(), Some(run_id), graph))
    }
}
