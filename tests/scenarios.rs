//! Integration tests covering the concrete scenarios and boundary
//! behaviours: cycle detection, parallel fan-out, hierarchy grouping,
//! the type/name warning, incremental skip, and duplicate-name rejection.

use pretty_assertions::assert_eq;
use scaffoldgraph::discovery::decl::{EntityDecl, OperationDecl};
use scaffoldgraph::graph::builder;
use scaffoldgraph::model::{Cardinality, FieldDescriptor, Severity};
use scaffoldgraph::registry::Registry;
use scaffoldgraph::validator;

#[test]
fn s1_cycle_detection() {
    let registry = Registry::new();
    EntityDecl::new("A").register(&registry).unwrap();
    EntityDecl::new("B").register(&registry).unwrap();
    OperationDecl::new("op1", "In1", "Out1")
        .reads("A")
        .writes("B")
        .register(&registry)
        .unwrap();
    OperationDecl::new("op2", "In2", "Out2")
        .reads("B")
        .writes("A")
        .register(&registry)
        .unwrap();

    let graph = builder::build(&registry);
    let diagnostics = validator::validate(&registry, &graph);

    let cycles: Vec<_> = diagnostics.iter().filter(|d| d.code == "CYCLE").collect();
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].subject.contains("op1"));
    assert!(cycles[0].subject.contains("op2"));
}

#[test]
fn s2_parallel_fan_out() {
    let registry = Registry::new();
    for name in ["Order", "Validation", "Charge", "FraudResult", "Confirmation"] {
        EntityDecl::new(name).register(&registry).unwrap();
    }
    OperationDecl::new("validate", "ValidateIn", "ValidateOut")
        .reads("Order")
        .writes("Validation")
        .register(&registry)
        .unwrap();
    OperationDecl::new("charge", "ChargeIn", "ChargeOut")
        .reads("Validation")
        .writes("Charge")
        .register(&registry)
        .unwrap();
    OperationDecl::new("fraud", "FraudIn", "FraudOut")
        .reads("Validation")
        .writes("FraudResult")
        .register(&registry)
        .unwrap();
    OperationDecl::new("confirm", "ConfirmIn", "ConfirmOut")
        .reads("Charge")
        .reads("FraudResult")
        .writes("Confirmation")
        .register(&registry)
        .unwrap();

    let graph = builder::build(&registry);
    let levels = graph.parallel_levels();
    assert_eq!(levels[0], vec!["validate".to_string()]);
    let mut second = levels[1].clone();
    second.sort();
    assert_eq!(second, vec!["charge".to_string(), "fraud".to_string()]);
    assert_eq!(levels[2], vec!["confirm".to_string()]);
}

#[test]
fn s3_hierarchy_grouping() {
    let registry = Registry::new();
    for name in [
        "payment.validate",
        "payment.charge",
        "payment.checkout.validate_card",
        "payment.checkout.charge",
    ] {
        OperationDecl::new(name, "In", "Out").register(&registry).unwrap();
    }
    // The two `validate`-ish leaves never collide because full dotted
    // names are unique; registering all four must succeed.
    assert_eq!(registry.operation_count(), 4);
}

#[test]
fn s4_type_name_warning() {
    let registry = Registry::new();
    EntityDecl::new("Pokemon")
        .description("A species entry")
        .register(&registry)
        .unwrap();
    EntityDecl::new("Trainer")
        .description("A trainer")
        .field(
            "pokemon_team",
            FieldDescriptor::new("sequence of opaque string", true).with_description("owned team"),
        )
        .register(&registry)
        .unwrap();

    let graph = builder::build(&registry);
    let diagnostics = validator::validate(&registry, &graph);

    let warning = diagnostics
        .iter()
        .find(|d| d.code == "LIST_OF_STRING_SHOULD_BE_LIST_OF_ENTITY")
        .expect("expected a type-naming warning");
    assert_eq!(warning.severity, Severity::Warning);
    assert_eq!(warning.hint.as_deref(), Some("pokemon_team: sequence of Pokemon"));
    assert!(!diagnostics.iter().any(|d| d.severity == Severity::Error));
}

#[test]
fn s5_incremental_skip() {
    use scaffoldgraph::cache;
    use scaffoldgraph::model::ArtifactRecord;
    use tempfile::tempdir;

    let dir = tempdir().unwrap();
    let record = ArtifactRecord {
        relative_path: "generated_api.txt".to_string(),
        content_bytes: b"GET /user".to_vec(),
        content_hash: cache::fingerprint(&[b"GET /user"]),
        generator_id: "http_router".to_string(),
    };

    assert!(cache::store_if_stale(dir.path(), &record).unwrap());
    let hash_path = dir.path().join("generated_api.txt.hash");
    let mtime_before = std::fs::metadata(&hash_path).unwrap().modified().unwrap();

    assert!(!cache::store_if_stale(dir.path(), &record).unwrap());
    let mtime_after = std::fs::metadata(&hash_path).unwrap().modified().unwrap();
    assert_eq!(mtime_before, mtime_after);
}

#[test]
fn s6_duplicate_name_aborts() {
    let registry = Registry::new();
    EntityDecl::new("User").register(&registry).unwrap();
    let err = EntityDecl::new("User").register(&registry).unwrap_err();
    assert!(matches!(
        err,
        scaffoldgraph::errors::EngineError::DuplicateName { kind: "entity", .. }
    ));
    assert_eq!(registry.entity_count(), 1);
}

#[test]
fn boundary_zero_entities_and_operations_is_valid() {
    let registry = Registry::new();
    let graph = builder::build(&registry);
    let diagnostics = validator::validate(&registry, &graph);
    assert!(diagnostics.is_empty());
    assert_eq!(graph.topological_order().len(), 0);
}

#[test]
fn boundary_orphan_operation_single_edge() {
    let registry = Registry::new();
    OperationDecl::new("noop", "NoopIn", "NoopOut")
        .register(&registry)
        .unwrap();
    let graph = builder::build(&registry);
    assert_eq!(graph.operation_multigraph.edge_count(), 1);
    let diagnostics = validator::validate(&registry, &graph);
    assert!(diagnostics.iter().any(|d| d.code == "ORPHAN_OPERATION"));
    assert!(!diagnostics.iter().any(|d| d.severity == Severity::Error));
}

#[test]
fn boundary_two_writers_one_reader_produce_two_depends_on_edges() {
    let registry = Registry::new();
    EntityDecl::new("Shared").register(&registry).unwrap();
    OperationDecl::new("writer_a", "InA", "OutA")
        .writes("Shared")
        .register(&registry)
        .unwrap();
    OperationDecl::new("writer_b", "InB", "OutB")
        .writes("Shared")
        .register(&registry)
        .unwrap();
    OperationDecl::new("reader", "InC", "OutC")
        .reads("Shared")
        .register(&registry)
        .unwrap();

    let graph = builder::build(&registry);
    let reader_node = graph.operation_node("reader").unwrap();
    let incoming = graph
        .operation_dag
        .edges_directed(reader_node, petgraph::Direction::Incoming)
        .count();
    assert_eq!(incoming, 2);
}

#[test]
fn relation_hint_with_unknown_target_is_flagged_not_fatal() {
    let registry = Registry::new();
    EntityDecl::new("Team")
        .relation("lead_id", "Person", Cardinality::One, None)
        .register(&registry)
        .unwrap();

    let graph = builder::build(&registry);
    let diagnostics = validator::validate(&registry, &graph);
    assert!(diagnostics
        .iter()
        .any(|d| d.code == "MISSING_ENTITY" && d.subject == "Team"));
}
