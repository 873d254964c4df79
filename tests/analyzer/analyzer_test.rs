use erdm::analyzer::{AnalyzeError, SchemaAnalyzer, UnresolvedReference};
use erdm::metadata::{ColumnRow, JsonRowSource, MemoryRowSource, RowSource};
use erdm::naming::NamingConvention;
use erdm::store::{JsonGraphStore, MemoryGraphStore};

fn shop_rows() -> Vec<ColumnRow> {
    vec![
        ColumnRow::new("order_lines", "order_id", "int")
            .position(1)
            .references("fk_line_order", "orders", "id"),
        ColumnRow::new("order_lines", "sku", "varchar").position(2).max_length(32),
        ColumnRow::new("order_lines", "coupon_id", "int")
            .position(3)
            .references("fk_line_coupon", "coupons", "id"),
        ColumnRow::new("orders", "id", "int").position(1).primary_key(),
        ColumnRow::new("orders", "customer_id", "int")
            .position(2)
            .references("fk_order_customer", "customers", "id"),
        ColumnRow::new("customers", "id", "int").position(1).primary_key(),
    ]
}

#[tokio::test]
async fn test_analyze_commits_graph_and_reports_warnings() {
    let analyzer = SchemaAnalyzer::new(MemoryRowSource::new(shop_rows()));
    let mut store = MemoryGraphStore::default();
    let mut warnings: Vec<UnresolvedReference> = Vec::new();

    let summary = analyzer.analyze(&mut store, &mut warnings).await.unwrap();

    assert_eq!(summary.entities, 3);
    assert_eq!(summary.columns, 6);
    assert_eq!(summary.relationships, 2);
    assert_eq!(summary.warnings, 1);
    assert_eq!(summary.stats.rows, 6);
    assert_eq!(summary.stats.pending_queued, 3);

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].foreign_key_name, "fk_line_coupon");

    // warnings do not block the commit
    assert_eq!(store.documents.len(), 1);
    let commit = summary.commit.unwrap();
    assert_eq!(commit.entities, 3);
    assert_eq!(commit.relationships, 2);

    let document = &store.documents[0];
    let orders = document.entity("orders").unwrap();
    assert_eq!(orders.relationships.len(), 1);
    assert_eq!(orders.relationships[0].end2.entity, "order_lines");
}

#[tokio::test]
async fn test_analyze_only_commits_nothing() {
    let analyzer = SchemaAnalyzer::new(MemoryRowSource::new(shop_rows()));
    assert_eq!(analyzer.source().describe(), "memory (6 rows)");
    let analysis = analyzer.analyze_only().await.unwrap();

    assert_eq!(analysis.graph.entity_count(), 3);
    assert_eq!(analysis.warnings.len(), 1);
}

#[tokio::test]
async fn test_analyze_applies_convention() {
    let rows = vec![
        ColumnRow::new("CUSTOMERS", "ID", "int").primary_key(),
        ColumnRow::new("ORDERS", "CUSTOMER_ID", "int").references("FK_CUST", "customers", "id"),
    ];
    let analyzer =
        SchemaAnalyzer::new(MemoryRowSource::new(rows)).with_convention(NamingConvention::Lower);
    let analysis = analyzer.analyze_only().await.unwrap();

    assert!(analysis.warnings.is_empty());
    assert!(analysis.graph.find_entity("customers").is_some());
    assert_eq!(analysis.graph.relationship_count(), 1);
}

#[tokio::test]
async fn test_analyze_json_source_to_json_store() {
    let dir = tempfile::tempdir().unwrap();
    let rows_path = dir.path().join("rows.json");
    std::fs::write(&rows_path, serde_json::to_string(&shop_rows()).unwrap()).unwrap();

    let analyzer = SchemaAnalyzer::new(JsonRowSource::new(&rows_path));
    let mut store = JsonGraphStore::new(dir.path().join("erd.json"));
    let mut warnings: Vec<UnresolvedReference> = Vec::new();
    let summary = analyzer.analyze(&mut store, &mut warnings).await.unwrap();

    assert!(summary.source.contains("rows.json"));
    let document = store.load().unwrap();
    assert_eq!(document.entities.len(), 3);
    assert_eq!(document.relationship_count(), 2);
}

#[tokio::test]
async fn test_missing_source_fails() {
    let analyzer = SchemaAnalyzer::new(JsonRowSource::new("/nonexistent/rows.json"));
    let mut store = MemoryGraphStore::default();
    let mut warnings: Vec<UnresolvedReference> = Vec::new();

    let err = analyzer.analyze(&mut store, &mut warnings).await.unwrap_err();
    assert!(matches!(err, AnalyzeError::Metadata(_)));
    assert!(store.documents.is_empty());
}
