use erdm::analyzer::{Analysis, SchemaRowProcessor};
use erdm::erd::Cardinality;
use erdm::metadata::{sort_rows, ColumnRow};
use erdm::naming::NamingConvention;
use erdm::store::GraphDocument;

fn run(rows: &[ColumnRow]) -> Analysis {
    let mut processor = SchemaRowProcessor::new(NamingConvention::Preserve);
    processor.ingest_all(rows).unwrap();
    processor.finalize().unwrap()
}

fn orders_rows() -> Vec<ColumnRow> {
    vec![
        ColumnRow::new("orders", "id", "int").position(1).primary_key(),
        ColumnRow::new("orders", "customer_id", "int")
            .position(2)
            .references("fk_cust", "customers", "id"),
    ]
}

fn customers_rows() -> Vec<ColumnRow> {
    vec![ColumnRow::new("customers", "id", "int").position(1).primary_key()]
}

#[test]
fn test_entity_per_contiguous_run() {
    let rows = vec![
        ColumnRow::new("a", "x", "int"),
        ColumnRow::new("a", "y", "int"),
        ColumnRow::new("b", "x", "int"),
        ColumnRow::new("c", "x", "int"),
        ColumnRow::new("c", "y", "int"),
    ];

    let analysis = run(&rows);
    let names: Vec<_> = analysis
        .graph
        .entities()
        .map(|(_, entity)| entity.name.as_str())
        .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(analysis.stats.entities_opened, 3);
}

#[test]
fn test_reopened_table_creates_second_entity() {
    // ungrouped input: "a" shows up again after "b"
    let rows = vec![
        ColumnRow::new("a", "x", "int"),
        ColumnRow::new("b", "x", "int"),
        ColumnRow::new("a", "y", "int"),
    ];

    let analysis = run(&rows);
    assert_eq!(analysis.graph.entity_count(), 3);

    let same_name = analysis.graph.entities_named("a");
    assert_eq!(same_name.len(), 2);
    let first = analysis.graph.entity(same_name[0]).unwrap();
    let second = analysis.graph.entity(same_name[1]).unwrap();
    assert_eq!(first.columns.len(), 1);
    assert_eq!(second.columns.len(), 1);
    assert_eq!(analysis.graph.find_entity("a"), Some(same_name[0]));
}

#[test]
fn test_sorted_rows_merge_reopened_table() {
    let mut rows = vec![
        ColumnRow::new("a", "x", "int").position(1),
        ColumnRow::new("b", "x", "int").position(1),
        ColumnRow::new("a", "y", "int").position(2),
    ];
    sort_rows(&mut rows);

    let analysis = run(&rows);
    assert_eq!(analysis.graph.entity_count(), 2);
}

#[test]
fn test_column_order_follows_arrival() {
    let rows = vec![
        ColumnRow::new("t", "zeta", "int").position(1),
        ColumnRow::new("t", "alpha", "int").position(2),
        ColumnRow::new("t", "mid", "int").position(3),
    ];

    let analysis = run(&rows);
    let t = analysis.graph.find_entity("t").unwrap();
    let names: Vec<_> = analysis
        .graph
        .columns_of(t)
        .map(|(_, column)| column.name.as_str())
        .collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_earlier_target_resolves_during_ingest() {
    let rows: Vec<_> = customers_rows().into_iter().chain(orders_rows()).collect();

    let mut processor = SchemaRowProcessor::new(NamingConvention::Preserve);
    processor.ingest_all(&rows).unwrap();

    // relationship exists before finalize
    assert!(processor.pending().is_empty());
    assert_eq!(processor.graph().relationship_count(), 1);
    assert_eq!(processor.stats().resolved_during_ingest, 1);

    let analysis = processor.finalize().unwrap();
    assert_eq!(analysis.stats.resolved_during_finalize, 0);
    assert!(analysis.warnings.is_empty());
}

#[test]
fn test_later_target_resolves_during_finalize() {
    let rows: Vec<_> = orders_rows().into_iter().chain(customers_rows()).collect();

    let mut processor = SchemaRowProcessor::new(NamingConvention::Preserve);
    processor.ingest_all(&rows).unwrap();
    assert_eq!(processor.pending().len(), 1);
    assert_eq!(processor.graph().relationship_count(), 0);

    let analysis = processor.finalize().unwrap();
    assert_eq!(analysis.stats.resolved_during_finalize, 1);
    assert_eq!(analysis.graph.relationship_count(), 1);
    assert!(analysis.warnings.is_empty());
}

#[test]
fn test_orders_then_customers() {
    let rows: Vec<_> = orders_rows().into_iter().chain(customers_rows()).collect();
    let analysis = run(&rows);
    let graph = &analysis.graph;

    assert_eq!(graph.entity_count(), 2);
    assert!(analysis.warnings.is_empty());

    let customers = graph.find_entity("customers").unwrap();
    let orders = graph.find_entity("orders").unwrap();
    assert!(graph.entity(orders).unwrap().relationships().is_empty());

    let relationship = graph
        .entity(customers)
        .unwrap()
        .find_by_name("fk_cust")
        .unwrap();
    assert_eq!(relationship.end1.entity, customers);
    assert_eq!(relationship.end1.cardinality, Cardinality::One);
    assert_eq!(
        graph.qualified_name(relationship.end1.columns[0]).as_deref(),
        Some("customers.id")
    );
    assert_eq!(relationship.end2.entity, orders);
    assert_eq!(relationship.end2.cardinality, Cardinality::Many);
    assert_eq!(relationship.end2.label, "customer_id");

    let customer_id = graph.find_column(orders, "customer_id").unwrap();
    assert_eq!(
        graph.column(customer_id).unwrap().reference_to,
        graph.find_column(customers, "id")
    );
}

#[test]
fn test_resolution_timing_does_not_change_graph() {
    let late: Vec<_> = orders_rows().into_iter().chain(customers_rows()).collect();
    let early: Vec<_> = customers_rows().into_iter().chain(orders_rows()).collect();

    let late = GraphDocument::from_graph(&run(&late).graph);
    let early = GraphDocument::from_graph(&run(&early).graph);

    // entity registration order differs, contents must not
    for name in ["orders", "customers"] {
        assert_eq!(late.entity(name), early.entity(name), "entity {name}");
    }
    assert_eq!(late.relationship_count(), early.relationship_count());
}

#[test]
fn test_composite_key_merges_into_one_relationship() {
    let rows = vec![
        ColumnRow::new("orders", "id", "int").position(1).primary_key(),
        ColumnRow::new("orders", "part_a_id", "int")
            .position(2)
            .references("fk_composite", "parts", "id"),
        ColumnRow::new("orders", "part_b_id", "int")
            .position(3)
            .references("fk_composite", "parts", "id"),
        ColumnRow::new("parts", "id", "int").position(1).primary_key(),
    ];

    let analysis = run(&rows);
    let graph = &analysis.graph;

    assert_eq!(graph.relationship_count(), 1);
    assert_eq!(analysis.stats.relationships_created, 1);
    assert_eq!(analysis.stats.relationships_merged, 1);

    let parts = graph.find_entity("parts").unwrap();
    let relationship = graph.entity(parts).unwrap().find_by_name("fk_composite").unwrap();
    assert_eq!(relationship.end2.label, "part_a_id, part_b_id");
    assert_eq!(relationship.end2.columns.len(), 2);
    assert_eq!(relationship.end1.columns.len(), 1);
}

#[test]
fn test_same_key_name_on_different_targets_stays_separate() {
    let rows = vec![
        ColumnRow::new("a", "id", "int").primary_key(),
        ColumnRow::new("b", "id", "int").primary_key(),
        ColumnRow::new("c", "a_id", "int").references("fk_parent", "a", "id"),
        ColumnRow::new("c", "b_id", "int").references("fk_parent", "b", "id"),
    ];

    let analysis = run(&rows);
    assert_eq!(analysis.graph.relationship_count(), 2);
    for name in ["a", "b"] {
        let id = analysis.graph.find_entity(name).unwrap();
        let relationship = analysis.graph.entity(id).unwrap().find_by_name("fk_parent");
        assert!(relationship.is_some(), "missing relationship on {name}");
    }
}

#[test]
fn test_missing_table_leaves_dangling_column() {
    let rows = vec![
        ColumnRow::new("orders", "id", "int").primary_key(),
        ColumnRow::new("orders", "ghost_id", "int").references("fk_ghost", "ghosts", "id"),
    ];

    let analysis = run(&rows);
    assert_eq!(analysis.graph.relationship_count(), 0);
    assert_eq!(analysis.warnings.len(), 1);
    assert_eq!(analysis.stats.unresolved, 1);

    let warning = &analysis.warnings[0];
    assert_eq!(warning.column, "orders.ghost_id");
    assert_eq!(warning.referenced_entity, "ghosts");

    let orders = analysis.graph.find_entity("orders").unwrap();
    let ghost_id = analysis.graph.find_column(orders, "ghost_id").unwrap();
    let column = analysis.graph.column(ghost_id).unwrap();
    assert!(column.foreign_key);
    assert_eq!(column.reference_to, None);
    assert_eq!(analysis.graph.dangling_columns(), vec![ghost_id]);
}

#[test]
fn test_self_reference_resolves_during_ingest() {
    let rows = vec![
        ColumnRow::new("employees", "id", "int").position(1).primary_key(),
        ColumnRow::new("employees", "manager_id", "int")
            .position(2)
            .references("fk_manager", "employees", "id"),
    ];

    let analysis = run(&rows);
    assert_eq!(analysis.stats.resolved_during_ingest, 1);

    let employees = analysis.graph.find_entity("employees").unwrap();
    let relationship = analysis
        .graph
        .entity(employees)
        .unwrap()
        .find_by_name("fk_manager")
        .unwrap();
    assert_eq!(relationship.end1.entity, employees);
    assert_eq!(relationship.end2.entity, employees);
}

#[test]
fn test_naming_convention_applies_to_references() {
    let rows = vec![
        ColumnRow::new("Customers", "Id", "int").primary_key(),
        ColumnRow::new("Orders", "CustomerId", "int").references("FK_Cust", "CUSTOMERS", "ID"),
    ];

    let mut processor = SchemaRowProcessor::new(NamingConvention::Lower);
    processor.ingest_all(&rows).unwrap();
    let analysis = processor.finalize().unwrap();

    assert!(analysis.warnings.is_empty());
    let customers = analysis.graph.find_entity("customers").unwrap();
    assert!(analysis
        .graph
        .entity(customers)
        .unwrap()
        .find_by_name("fk_cust")
        .is_some());
}

#[test]
fn test_render_after_both_phases() {
    let rows = vec![
        ColumnRow::new("customers", "id", "int").position(1).primary_key(),
        ColumnRow::new("customers", "name", "varchar").position(2),
        ColumnRow::new("orders", "id", "int").position(1).primary_key(),
        ColumnRow::new("orders", "customer_id", "int")
            .position(2)
            .not_null()
            .references("fk_orders_customer", "customers", "id"),
        ColumnRow::new("orders", "coupon_id", "int")
            .position(3)
            .references("fk_orders_coupon", "coupons", "id"),
    ];

    let analysis = run(&rows);

    insta::assert_snapshot!(analysis.graph.render(), @r"
    customers
      id int [PK, NOT NULL]
      name varchar
      <fk_orders_customer> 0..* orders (customer_id)
    orders
      id int [PK, NOT NULL]
      customer_id int [FK -> customers.id, NOT NULL]
      coupon_id int [FK -> ?]
    ");
}
