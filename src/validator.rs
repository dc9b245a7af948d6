//! Walks the registry and derived graph, emitting ordered diagnostics.
//! Never raises: every rule accumulates into the returned list so a
//! single run always produces a complete picture instead of stopping at
//! the first problem.

use std::collections::{BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::graph::Graph;
use crate::model::Diagnostic;
use crate::registry::Registry;

static OPERATION_NAME_GRAMMAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*$").unwrap()
});

/// Identifiers that are plural in form but are not collections, so the
/// name-vs-type heuristic should not flag them.
static PLURAL_EXCEPTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["status", "address", "progress", "news", "series", "metadata"]
        .into_iter()
        .collect()
});

pub fn validate(registry: &Registry, graph: &Graph) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let entities = registry.list_entities();
    let operations = registry.list_operations();
    let entity_names: HashSet<&str> = entities.iter().map(|e| e.name.as_str()).collect();

    reference_integrity(&operations, &entities, &entity_names, &mut diagnostics);
    operation_name_grammar(&operations, &mut diagnostics);
    no_cycles(graph, &mut diagnostics);
    no_duplicates(&entities, &operations, &mut diagnostics);
    name_vs_type(&entities, &mut diagnostics);
    documentation_presence(&entities, &operations, &mut diagnostics);
    unused_entities(&entities, &operations, &mut diagnostics);
    orphan_operations(&operations, &mut diagnostics);

    diagnostics.sort();
    diagnostics
}

fn reference_integrity(
    operations: &[crate::model::OperationDescriptor],
    entities: &[crate::model::EntityDescriptor],
    entity_names: &HashSet<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for operation in operations {
        for name in operation.reads.iter().chain(operation.writes.iter()) {
            if !entity_names.contains(name.as_str()) {
                diagnostics.push(Diagnostic::error(
                    "MISSING_ENTITY",
                    operation.name.clone(),
                    format!("operation '{}' references unknown entity '{name}'", operation.name),
                ));
            }
        }
    }
    for entity in entities {
        for relation in &entity.relations {
            if !entity_names.contains(relation.target_entity_name.as_str()) {
                diagnostics.push(Diagnostic::error(
                    "MISSING_ENTITY",
                    entity.name.clone(),
                    format!(
                        "entity '{}' relation '{}' targets unknown entity '{}'",
                        entity.name, relation.field_name, relation.target_entity_name
                    ),
                ));
            }
        }
    }
}

fn operation_name_grammar(
    operations: &[crate::model::OperationDescriptor],
    diagnostics: &mut Vec<Diagnostic>,
) {
    for operation in operations {
        if !OPERATION_NAME_GRAMMAR.is_match(&operation.name) {
            diagnostics.push(Diagnostic::error(
                "BAD_NAME",
                operation.name.clone(),
                format!("operation name '{}' is not a well-formed dotted identifier", operation.name),
            ));
        }
    }
}

fn no_cycles(graph: &Graph, diagnostics: &mut Vec<Diagnostic>) {
    if let Some(cycle) = graph.find_cycle() {
        diagnostics.push(Diagnostic::error(
            "CYCLE",
            cycle.join(","),
            format!("cyclic dependency among operations: {}", cycle.join(" -> ")),
        ));
    }
}

fn no_duplicates(
    entities: &[crate::model::EntityDescriptor],
    operations: &[crate::model::OperationDescriptor],
    diagnostics: &mut Vec<Diagnostic>,
) {
    // The registry already rejects duplicate registration at insert time;
    // this rule re-checks for batched-loading callers that built
    // descriptor lists outside the registry before registering them.
    let mut seen = HashSet::new();
    for entity in entities {
        if !seen.insert(entity.name.as_str()) {
            diagnostics.push(Diagnostic::error(
                "DUPLICATE_NAME",
                entity.name.clone(),
                format!("duplicate entity name '{}'", entity.name),
            ));
        }
    }
    let mut seen = HashSet::new();
    for operation in operations {
        if !seen.insert(operation.name.as_str()) {
            diagnostics.push(Diagnostic::error(
                "DUPLICATE_NAME",
                operation.name.clone(),
                format!("duplicate operation name '{}'", operation.name),
            ));
        }
    }
}

fn name_vs_type(entities: &[crate::model::EntityDescriptor], diagnostics: &mut Vec<Diagnostic>) {
    let known_entities: BTreeSet<&str> = entities.iter().map(|e| e.name.as_str()).collect();
    for entity in entities {
        for (field_name, field) in &entity.attributes {
            let looks_like_collection =
                is_plural(field_name) && !PLURAL_EXCEPTIONS.contains(field_name.as_str());
            let lower_name = field_name.to_lowercase();
            if field.type_name == "sequence of opaque string" {
                if let Some(target) = known_entities.iter().find(|name| {
                    let lower_entity = name.to_lowercase();
                    lower_name == pluralize(&lower_entity) || lower_name.contains(&lower_entity)
                }) {
                    if looks_like_collection || lower_name.contains(&target.to_lowercase()) {
                        diagnostics.push(
                            Diagnostic::warning(
                                "LIST_OF_STRING_SHOULD_BE_LIST_OF_ENTITY",
                                format!("{}.{}", entity.name, field_name),
                                format!(
                                    "field '{field_name}' looks like a collection of opaque strings but an entity '{target}' exists"
                                ),
                            )
                            .with_hint(format!("{field_name}: sequence of {target}")),
                        );
                        continue;
                    }
                }
            }
            if field_name.ends_with("_id") {
                let base = &field_name[..field_name.len() - "_id".len()];
                if let Some(target) = known_entities
                    .iter()
                    .find(|name| name.to_lowercase() == base.to_lowercase())
                {
                    diagnostics.push(
                        Diagnostic::warning(
                            "ID_SUFFIX_SHOULD_BE_DIRECT_REFERENCE",
                            format!("{}.{}", entity.name, field_name),
                            format!(
                                "field '{field_name}' looks like a foreign key but entity '{target}' can be referenced directly"
                            ),
                        )
                        .with_hint(format!("{base}: {target}")),
                    );
                }
            }
        }
    }
}

fn is_plural(word: &str) -> bool {
    word.ends_with('s') && !word.ends_with("ss")
}

fn pluralize(word: &str) -> String {
    if word.ends_with('y') && !word.ends_with("ay") && !word.ends_with("ey") {
        format!("{}ies", &word[..word.len() - 1])
    } else {
        format!("{word}s")
    }
}

fn documentation_presence(
    entities: &[crate::model::EntityDescriptor],
    operations: &[crate::model::OperationDescriptor],
    diagnostics: &mut Vec<Diagnostic>,
) {
    for entity in entities {
        if !entity.has_documentation() {
            diagnostics.push(Diagnostic::warning(
                "MISSING_DOCUMENTATION",
                entity.name.clone(),
                format!("entity '{}' has no description", entity.name),
            ));
        }
        for (field_name, field) in &entity.attributes {
            if !field.has_documentation() {
                diagnostics.push(Diagnostic::warning(
                    "MISSING_DOCUMENTATION",
                    format!("{}.{}", entity.name, field_name),
                    format!("field '{field_name}' on entity '{}' has no description", entity.name),
                ));
            }
        }
    }
    for operation in operations {
        if !operation.has_documentation() {
            diagnostics.push(Diagnostic::warning(
                "MISSING_DOCUMENTATION",
                operation.name.clone(),
                format!("operation '{}' has no description", operation.name),
            ));
        }
    }
}

fn unused_entities(
    entities: &[crate::model::EntityDescriptor],
    operations: &[crate::model::OperationDescriptor],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut used: HashSet<&str> = HashSet::new();
    for operation in operations {
        for name in operation.reads.iter().chain(operation.writes.iter()) {
            used.insert(name.as_str());
        }
    }
    for entity in entities {
        if !used.contains(entity.name.as_str()) {
            diagnostics.push(Diagnostic::info(
                "UNUSED_ENTITY",
                entity.name.clone(),
                format!("entity '{}' is neither read nor written by any operation", entity.name),
            ));
        }
    }
}

fn orphan_operations(
    operations: &[crate::model::OperationDescriptor],
    diagnostics: &mut Vec<Diagnostic>,
) {
    for operation in operations {
        if operation.reads.is_empty() && operation.writes.is_empty() {
            diagnostics.push(Diagnostic::info(
                "ORPHAN_OPERATION",
                operation.name.clone(),
                format!("operation '{}' has empty reads and writes", operation.name),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::decl::{EntityDecl, OperationDecl};
    use crate::graph::builder;
    use crate::model::Severity;

    #[test]
    fn cycle_scenario_emits_single_diagnostic() {
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
        let diagnostics = validate(&registry, &graph);
        let cycle_diagnostics: Vec<_> = diagnostics.iter().filter(|d| d.code == "CYCLE").collect();
        assert_eq!(cycle_diagnostics.len(), 1);
    }

    #[test]
    fn missing_entity_reference_is_flagged() {
        let registry = Registry::new();
        OperationDecl::new("op1", "In1", "Out1")
            .reads("Ghost")
            .register(&registry)
            .unwrap();
        let graph = builder::build(&registry);
        let diagnostics = validate(&registry, &graph);
        assert!(diagnostics.iter().any(|d| d.code == "MISSING_ENTITY" && d.severity == Severity::Error));
    }

    #[test]
    fn orphan_operation_is_informational() {
        let registry = Registry::new();
        OperationDecl::new("noop", "NoopIn", "NoopOut")
            .register(&registry)
            .unwrap();
        let graph = builder::build(&registry);
        let diagnostics = validate(&registry, &graph);
        assert!(diagnostics
            .iter()
            .any(|d| d.code == "ORPHAN_OPERATION" && d.severity == Severity::Info));
    }

    #[test]
    fn bad_name_rejects_malformed_identifier() {
        let registry = Registry::new();
        OperationDecl::new("bad name!", "In", "Out")
            .register(&registry)
            .unwrap();
        let graph = builder::build(&registry);
        let diagnostics = validate(&registry, &graph);
        assert!(diagnostics.iter().any(|d| d.code == "BAD_NAME"));
    }

    use proptest::prelude::*;

    proptest! {
        /// Any name built from the dotted-identifier grammar itself passes
        /// `operation_name_grammar` with no `BAD_NAME` diagnostic.
        #[test]
        fn well_formed_dotted_names_never_trigger_bad_name(
            segments in prop::collection::vec("[a-zA-Z_][a-zA-Z0-9_]{0,8}", 1..4)
        ) {
            let name = segments.join(".");
            let registry = Registry::new();
            OperationDecl::new(name, "In", "Out").register(&registry).unwrap();
            let graph = builder::build(&registry);
            let diagnostics = validate(&registry, &graph);
            prop_assert!(!diagnostics.iter().any(|d| d.code == "BAD_NAME"));
        }

        /// A name containing a disallowed character always triggers
        /// `BAD_NAME`, regardless of which well-formed segments surround it.
        #[test]
        fn names_with_disallowed_characters_always_trigger_bad_name(
            prefix in "[a-zA-Z_][a-zA-Z0-9_]{0,8}",
            bad_char in prop::sample::select(vec![' ', '!', '/', '@', '#']),
        ) {
            let name = format!("{prefix}{bad_char}suffix");
            let registry = Registry::new();
            OperationDecl::new(name, "In", "Out").register(&registry).unwrap();
            let graph = builder::build(&registry);
            let diagnostics = validate(&registry, &graph);
            prop_assert!(diagnostics.iter().any(|d| d.code == "BAD_NAME"));
        }
    }
}
