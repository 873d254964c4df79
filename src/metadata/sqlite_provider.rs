//! SqliteRowSource implementation.
//!
//! Introspects a SQLite database through its PRAGMA table-valued functions
//! and produces the same row shape an information-schema query would.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use super::provider::{MetadataResult, RowSource};
use super::types::ColumnRow;

/// Schema name SQLite uses for the primary database.
const MAIN_SCHEMA: &str = "main";

/// RowSource over a SQLite database file.
///
/// SQLite foreign keys are unnamed, so each one gets a synthetic name
/// `fk_<table>_<id>`; every column of a composite key shares it. A column
/// taking part in several foreign keys reports only the first.
#[derive(Debug, Clone)]
pub struct SqliteRowSource {
    path: PathBuf,
}

impl SqliteRowSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read rows from an open connection, ordered by table then position.
    pub fn read_rows(conn: &Connection) -> MetadataResult<Vec<ColumnRow>> {
        let mut rows = Vec::new();
        for table in list_tables(conn)? {
            let unique = unique_columns(conn, &table)?;
            let foreign_keys = foreign_keys(conn, &table)?;

            let mut stmt = conn.prepare(
                "SELECT cid, name, type, \"notnull\", dflt_value, pk
                 FROM pragma_table_info(?1) ORDER BY cid",
            )?;
            let columns = stmt
                .query_map(params![table], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, bool>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            for (cid, name, declared_type, not_null, default, pk) in columns {
                let (data_type, max_length) = split_declared_type(&declared_type);
                let fk = foreign_keys.get(&name);
                rows.push(ColumnRow {
                    table_catalog: None,
                    owner: Some(MAIN_SCHEMA.to_string()),
                    table_name: table.clone(),
                    ordinal_position: (cid + 1) as u32,
                    default_setting: default,
                    data_type,
                    max_length,
                    date_precision: None,
                    is_nullable: !not_null && pk == 0,
                    is_primary_key: pk > 0,
                    is_unique: unique.contains(&name),
                    is_foreign_key: fk.is_some(),
                    foreign_key_name: fk.map(|fk| fk.name.clone()),
                    referenced_table_name: fk.map(|fk| fk.table.clone()),
                    referenced_column_name: fk.map(|fk| fk.column.clone()),
                    column_name: name,
                });
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl RowSource for SqliteRowSource {
    fn describe(&self) -> String {
        format!("sqlite database {}", self.path.display())
    }

    async fn fetch_rows(&self) -> MetadataResult<Vec<ColumnRow>> {
        let path = self.path.clone();
        let rows = tokio::task::spawn_blocking(move || {
            let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
            Self::read_rows(&conn)
        })
        .await??;
        log::debug!("introspected {} columns from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

struct ForeignKeyTarget {
    name: String,
    table: String,
    column: String,
}

fn list_tables(conn: &Connection) -> MetadataResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )?;
    let tables = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(tables)
}

/// Columns covered by a single-column UNIQUE constraint.
fn unique_columns(conn: &Connection, table: &str) -> MetadataResult<HashSet<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM pragma_index_list(?1) WHERE \"unique\" = 1 AND origin = 'u'",
    )?;
    let indexes = stmt
        .query_map(params![table], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;

    let mut columns = HashSet::new();
    for index in indexes {
        let mut stmt = conn.prepare("SELECT name FROM pragma_index_info(?1)")?;
        let indexed = stmt
            .query_map(params![index], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        if let [column] = indexed.as_slice() {
            columns.insert(column.clone());
        }
    }
    Ok(columns)
}

/// Foreign keys of `table`, keyed by referencing column.
fn foreign_keys(
    conn: &Connection,
    table: &str,
) -> MetadataResult<HashMap<String, ForeignKeyTarget>> {
    let mut stmt = conn.prepare(
        "SELECT id, seq, \"table\", \"from\", \"to\"
         FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
    )?;
    let entries = stmt
        .query_map(params![table], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut targets = HashMap::new();
    for (id, seq, ref_table, from, to) in entries {
        let ref_table = declared_table_name(conn, &ref_table)?;
        let column = match to {
            Some(column) => declared_column_name(conn, &ref_table, &column)?,
            // REFERENCES t without a column list targets t's primary key
            None => primary_key_columns(conn, &ref_table)?
                .into_iter()
                .nth(seq as usize)
                .unwrap_or_default(),
        };
        targets.entry(from).or_insert(ForeignKeyTarget {
            name: format!("fk_{table}_{id}"),
            table: ref_table,
            column,
        });
    }
    Ok(targets)
}

/// Spelling of `table` as declared in `sqlite_master`.
///
/// Identifiers match case-insensitively in SQLite, so `REFERENCES Customers`
/// targets `customers`. Unknown tables keep the spelling they were given.
fn declared_table_name(conn: &Connection, table: &str) -> MetadataResult<String> {
    let declared = conn
        .query_row(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name = ?1 COLLATE NOCASE
             LIMIT 1",
            params![table],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(declared.unwrap_or_else(|| table.to_string()))
}

/// Spelling of `column` as declared in `table`.
fn declared_column_name(conn: &Connection, table: &str, column: &str) -> MetadataResult<String> {
    let declared = conn
        .query_row(
            "SELECT name FROM pragma_table_info(?1)
             WHERE name = ?2 COLLATE NOCASE
             LIMIT 1",
            params![table, column],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(declared.unwrap_or_else(|| column.to_string()))
}

fn primary_key_columns(conn: &Connection, table: &str) -> MetadataResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk")?;
    let columns = stmt
        .query_map(params![table], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(columns)
}

/// Split `VARCHAR(40)` into (`VARCHAR`, Some(40)).
fn split_declared_type(declared: &str) -> (String, Option<u64>) {
    let declared = declared.trim();
    if let Some((base, rest)) = declared.split_once('(') {
        let length = rest.trim_end_matches(')').trim().parse().ok();
        return (base.trim().to_string(), length);
    }
    (declared.to_string(), None)
}
