use erdm::analyzer::SchemaRowProcessor;
use erdm::erd::SchemaGraph;
use erdm::metadata::ColumnRow;
use erdm::naming::NamingConvention;
use erdm::store::{
    ColumnPath, GraphDocument, GraphStore, JsonGraphStore, SqliteGraphStore, StoreError,
};
use rusqlite::Connection;

fn sample_graph() -> SchemaGraph {
    let rows = vec![
        ColumnRow::new("lines", "id", "int").position(1).primary_key(),
        ColumnRow::new("lines", "part_a_id", "int")
            .position(2)
            .references("fk_part", "parts", "id"),
        ColumnRow::new("lines", "part_b_id", "int")
            .position(3)
            .references("fk_part", "parts", "id"),
        ColumnRow::new("lines", "ghost_id", "int")
            .position(4)
            .references("fk_ghost", "ghosts", "id"),
        ColumnRow::new("parts", "id", "int").position(1).primary_key(),
        ColumnRow::new("parts", "name", "varchar")
            .position(2)
            .unique()
            .max_length(64),
    ];
    let mut processor = SchemaRowProcessor::new(NamingConvention::Preserve);
    processor.ingest_all(&rows).unwrap();
    processor.finalize().unwrap().graph
}

#[test]
fn test_document_from_graph() {
    let document = GraphDocument::from_graph(&sample_graph());

    assert_eq!(document.entities.len(), 2);
    assert_eq!(document.column_count(), 6);
    assert_eq!(document.relationship_count(), 1);

    let lines = document.entity("lines").unwrap();
    assert!(lines.relationships.is_empty());
    assert_eq!(
        lines.columns[1].references,
        Some(ColumnPath {
            entity: "parts".to_string(),
            column: "id".to_string(),
        })
    );
    assert_eq!(lines.columns[3].references, None);
    assert!(lines.columns[3].foreign_key);

    let parts = document.entity("parts").unwrap();
    let relationship = &parts.relationships[0];
    assert_eq!(relationship.name, "fk_part");
    assert_eq!(relationship.end1.entity, "parts");
    assert_eq!(relationship.end1.columns, vec!["id"]);
    assert_eq!(relationship.end1.cardinality, "1");
    assert_eq!(relationship.end2.entity, "lines");
    assert_eq!(relationship.end2.columns, vec!["part_a_id", "part_b_id"]);
    assert_eq!(relationship.end2.cardinality, "0..*");
    assert_eq!(relationship.end2.label, "part_a_id, part_b_id");
}

#[test]
fn test_json_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("erd.json");
    let graph = sample_graph();

    let mut store = JsonGraphStore::new(&path);
    assert_eq!(store.path(), path.as_path());
    let summary = store.commit(&graph).unwrap();

    assert_eq!(summary.run_id, None);
    assert_eq!(summary.entities, 2);
    assert_eq!(summary.columns, 6);
    assert_eq!(summary.relationships, 1);
    assert_eq!(store.load().unwrap(), GraphDocument::from_graph(&graph));

    // no temp file left behind
    let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("erd.json")]);
}

#[test]
fn test_json_store_failed_commit_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    // a non-empty directory cannot be replaced by a file
    let path = dir.path().join("erd.json");
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("keep"), "x").unwrap();

    let mut store = JsonGraphStore::new(&path);
    let result = store.commit(&sample_graph());
    assert!(matches!(result, Err(StoreError::Io(_))));

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("erd.json")]);
}

#[test]
fn test_json_store_replaces_previous_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("erd.json");
    let mut store = JsonGraphStore::new(&path);

    store.commit(&sample_graph()).unwrap();
    store.commit(&SchemaGraph::new()).unwrap();

    assert_eq!(store.load().unwrap(), GraphDocument::default());
}

#[test]
fn test_sqlite_store_round_trip() {
    let graph = sample_graph();
    let mut store = SqliteGraphStore::open_in_memory().unwrap();

    let summary = store.commit(&graph).unwrap();
    let run_id = summary.run_id.unwrap();

    assert_eq!(store.latest_run().unwrap(), Some(run_id));
    assert_eq!(store.load_document(run_id).unwrap(), GraphDocument::from_graph(&graph));
}

#[test]
fn test_sqlite_store_keeps_run_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("erd.db");

    let first = {
        let mut store = SqliteGraphStore::open(&path).unwrap();
        store.commit(&sample_graph()).unwrap().run_id.unwrap()
    };

    let mut store = SqliteGraphStore::open(&path).unwrap();
    let second = store.commit(&SchemaGraph::new()).unwrap().run_id.unwrap();

    assert_eq!(store.runs().unwrap(), vec![first, second]);
    assert_eq!(store.load_document(first).unwrap().entities.len(), 2);
    assert!(store.load_document(second).unwrap().entities.is_empty());
}

#[test]
fn test_sqlite_store_empty_has_no_runs() {
    let store = SqliteGraphStore::open_in_memory().unwrap();
    assert_eq!(store.latest_run().unwrap(), None);
    assert!(store.runs().unwrap().is_empty());
}

#[test]
fn test_sqlite_store_rejects_unknown_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("erd.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 99").unwrap();
    }

    let result = SqliteGraphStore::open(&path);
    assert!(matches!(
        result,
        Err(StoreError::VersionMismatch {
            found: 99,
            expected: 1
        })
    ));
}

fn graph_with_max_length(max_length: u64) -> SchemaGraph {
    let rows = vec![ColumnRow::new("blobs", "body", "blob").max_length(max_length)];
    let mut processor = SchemaRowProcessor::new(NamingConvention::Preserve);
    processor.ingest_all(&rows).unwrap();
    processor.finalize().unwrap().graph
}

#[test]
fn test_sqlite_store_keeps_largest_length() {
    let mut store = SqliteGraphStore::open_in_memory().unwrap();
    let run_id = store
        .commit(&graph_with_max_length(i64::MAX as u64))
        .unwrap()
        .run_id
        .unwrap();

    let document = store.load_document(run_id).unwrap();
    let body = &document.entity("blobs").unwrap().columns[0];
    assert_eq!(body.max_length, Some(i64::MAX as u64));
}

#[test]
fn test_sqlite_store_rejects_oversized_length() {
    let mut store = SqliteGraphStore::open_in_memory().unwrap();

    let result = store.commit(&graph_with_max_length(u64::MAX));
    match result {
        Err(StoreError::ValueOutOfRange { column, value }) => {
            assert_eq!(column, "blobs.body");
            assert_eq!(value, u64::MAX);
        }
        other => panic!("Expected ValueOutOfRange, got {:?}", other),
    }

    // the whole run is rolled back
    assert!(store.runs().unwrap().is_empty());
}
