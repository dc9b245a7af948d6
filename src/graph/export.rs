//! Serialises a `Graph` to the `registry_graph.json` wire shape, and to
//! Mermaid / GraphViz DOT diagram text. Node and edge ordering in the
//! diagram emitters is lexicographic by identifier so diffs stay readable.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use petgraph::visit::EdgeRef;
use serde_json::{json, Value};

use crate::graph::{Graph, OpGraphNode};
use crate::model::Diagnostic;
use crate::registry::Registry;

pub fn to_json(graph: &Graph, registry: &Registry, diagnostics: &[Diagnostic]) -> Value {
    let entities = registry.list_entities();
    let operations = registry.list_operations();

    let mut nodes = serde_json::Map::new();
    for entity in &entities {
        nodes.insert(
            entity.name.clone(),
            json!({ "kind": "entity", "name": entity.name }),
        );
    }
    for operation in &operations {
        nodes.insert(
            operation.name.clone(),
            json!({ "kind": "operation", "name": operation.name, "flow_path": operation.flow_path() }),
        );
    }
    if graph
        .operation_multigraph
        .node_weights()
        .any(|n| matches!(n, OpGraphNode::Empty))
    {
        nodes.insert(
            crate::graph::EMPTY_NODE.to_string(),
            json!({ "kind": "empty" }),
        );
    }

    let mut edges = Vec::new();
    let mut edge_id = 0usize;
    for edge in graph.entity_graph.edge_references() {
        let source = &graph.entity_graph[edge.source()];
        let target = &graph.entity_graph[edge.target()];
        edges.push(json!({
            "id": format!("relation-{edge_id}"),
            "type": "relation",
            "source": source,
            "target": target,
            "properties": {
                "field_name": edge.weight().field_name,
                "cardinality": match edge.weight().cardinality {
                    crate::model::Cardinality::One => "one",
                    crate::model::Cardinality::Many => "many",
                },
            },
        }));
        edge_id += 1;
    }
    for edge in graph.operation_multigraph.edge_references() {
        let source = graph.operation_multigraph[edge.source()].id();
        let target = graph.operation_multigraph[edge.target()].id();
        edges.push(json!({
            "id": format!("operation_flow-{edge_id}"),
            "type": "operation_flow",
            "source": source,
            "target": target,
            "properties": { "operation": edge.weight() },
        }));
        edge_id += 1;
    }
    for edge in graph.operation_dag.edge_references() {
        let source = &graph.operation_dag[edge.source()];
        let target = &graph.operation_dag[edge.target()];
        edges.push(json!({
            "id": format!("depends_on-{edge_id}"),
            "type": "depends_on",
            "source": source,
            "target": target,
            "properties": { "mediating_entities": edge.weight() },
        }));
        edge_id += 1;
    }

    let mut by_kind: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for entity in &entities {
        by_kind.entry("entity").or_default().push(&entity.name);
    }
    for operation in &operations {
        by_kind.entry("operation").or_default().push(&operation.name);
    }

    let mut by_flow_path: IndexMap<String, Vec<&str>> = IndexMap::new();
    for operation in &operations {
        let path = operation.flow_path().join(".");
        by_flow_path.entry(path).or_default().push(&operation.name);
    }

    let mut by_category: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for operation in &operations {
        by_category
            .entry(operation.category.as_str())
            .or_default()
            .push(&operation.name);
    }

    json!({
        "metadata": {
            "entity_count": entities.len(),
            "operation_count": operations.len(),
        },
        "nodes": nodes,
        "edges": edges,
        "indexes": {
            "by_kind": by_kind,
            "by_flow_path": by_flow_path,
            "by_category": by_category,
        },
        "validation": diagnostics,
    })
}

pub fn entity_relationship_mermaid(registry: &Registry, graph: &Graph) -> String {
    let mut entities: Vec<_> = registry.list_entities();
    entities.sort_by(|a, b| a.name.cmp(&b.name));

    let mut lines = vec!["erDiagram".to_string()];
    for entity in &entities {
        let Some(node) = graph.entity_node(&entity.name) else {
            continue;
        };
        let mut edges: Vec<_> = graph
            .entity_graph
            .edges(node)
            .map(|e| {
                let target = &graph.entity_graph[e.target()];
                let rel = match e.weight().cardinality {
                    crate::model::Cardinality::One => "||--||",
                    crate::model::Cardinality::Many => "||--o{",
                };
                format!("    {} {} {} : \"{}\"", entity.name, rel, target, e.weight().field_name)
            })
            .collect();
        edges.sort();
        lines.extend(edges);
    }
    lines.join("\n")
}

pub fn operation_flow_mermaid(registry: &Registry, graph: &Graph) -> String {
    let mut operations: Vec<_> = registry.list_operations();
    operations.sort_by(|a, b| a.name.cmp(&b.name));

    let mut lines = vec!["flowchart LR".to_string()];
    for operation in &operations {
        let reads = if operation.reads.is_empty() {
            vec![crate::graph::EMPTY_NODE.to_string()]
        } else {
            operation.reads.clone()
        };
        let writes = if operation.writes.is_empty() {
            vec![crate::graph::EMPTY_NODE.to_string()]
        } else {
            operation.writes.clone()
        };
        let mut entries = Vec::new();
        for r in &reads {
            for w in &writes {
                entries.push(format!("    {r} -->|{}| {w}", operation.name));
            }
        }
        entries.sort();
        lines.extend(entries);
    }
    lines.join("\n")
}

pub fn registry_graph_dot(registry: &Registry, graph: &Graph) -> String {
    let mut entities: Vec<_> = registry.list_entities();
    entities.sort_by(|a, b| a.name.cmp(&b.name));
    let mut operations: Vec<_> = registry.list_operations();
    operations.sort_by(|a, b| a.name.cmp(&b.name));

    let mut lines = vec!["digraph registry_graph {".to_string()];
    for entity in &entities {
        lines.push(format!("  \"{}\" [shape=box];", entity.name));
    }
    let mut edge_lines = Vec::new();
    for entity in &entities {
        let Some(node) = graph.entity_node(&entity.name) else {
            continue;
        };
        for edge in graph.entity_graph.edges(node) {
            let target = &graph.entity_graph[edge.target()];
            edge_lines.push(format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"];",
                entity.name, target, edge.weight().field_name
            ));
        }
    }
    edge_lines.sort();
    lines.extend(edge_lines);
    lines.push("}".to_string());
    lines.join("\n")
}
