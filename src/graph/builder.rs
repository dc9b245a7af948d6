//! Builds a `Graph` from the current registry contents.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::graph::{Graph, HierarchyForest, OpGraphNode, RelationEdge, EMPTY_NODE};
use crate::registry::Registry;

pub fn build(registry: &Registry) -> Graph {
    let entities = registry.list_entities();
    let operations = registry.list_operations();

    let (entity_graph, entity_index) = build_entity_graph(&entities);
    let (operation_multigraph, multigraph_index) =
        build_operation_multigraph(&entities, &operations);
    let (operation_dag, operation_index) = build_operation_dag(&operations);
    let hierarchy = build_hierarchy(&operations);

    let operation_order: IndexMap<String, usize> = operations
        .iter()
        .enumerate()
        .map(|(i, op)| (op.name.clone(), i))
        .collect();

    Graph {
        entity_graph,
        entity_index,
        operation_multigraph,
        multigraph_index,
        operation_dag,
        operation_index,
        hierarchy,
        operation_order,
    }
}

fn build_entity_graph(
    entities: &[crate::model::EntityDescriptor],
) -> (DiGraph<String, RelationEdge>, IndexMap<String, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut index = IndexMap::new();
    for entity in entities {
        let node = graph.add_node(entity.name.clone());
        index.insert(entity.name.clone(), node);
    }
    for entity in entities {
        let Some(&source) = index.get(&entity.name) else {
            continue;
        };
        for relation in &entity.relations {
            // Only wire the edge when the target actually exists; a
            // dangling reference is a validator concern (MISSING_ENTITY),
            // not a graph-construction failure.
            if let Some(&target) = index.get(&relation.target_entity_name) {
                graph.add_edge(
                    source,
                    target,
                    RelationEdge {
                        field_name: relation.field_name.clone(),
                        cardinality: relation.cardinality,
                    },
                );
            }
        }
    }
    (graph, index)
}

fn build_operation_multigraph(
    entities: &[crate::model::EntityDescriptor],
    operations: &[crate::model::OperationDescriptor],
) -> (DiGraph<OpGraphNode, String>, IndexMap<String, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut index = IndexMap::new();
    for entity in entities {
        let node = graph.add_node(OpGraphNode::Entity(entity.name.clone()));
        index.insert(entity.name.clone(), node);
    }

    let mut empty_node = None;
    let mut node_for = |graph: &mut DiGraph<OpGraphNode, String>,
                         index: &mut IndexMap<String, NodeIndex>,
                         name: &str|
     -> NodeIndex {
        if name == EMPTY_NODE {
            *empty_node.get_or_insert_with(|| graph.add_node(OpGraphNode::Empty))
        } else if let Some(&idx) = index.get(name) {
            idx
        } else {
            // Dangling reference; still give it a node so the multigraph
            // is well-formed. The validator flags the missing entity.
            let idx = graph.add_node(OpGraphNode::Entity(name.to_string()));
            index.insert(name.to_string(), idx);
            idx
        }
    };

    for operation in operations {
        let reads: Vec<&str> = if operation.reads.is_empty() {
            vec![EMPTY_NODE]
        } else {
            operation.reads.iter().map(|s| s.as_str()).collect()
        };
        let writes: Vec<&str> = if operation.writes.is_empty() {
            vec![EMPTY_NODE]
        } else {
            operation.writes.iter().map(|s| s.as_str()).collect()
        };
        for &r in &reads {
            let source = node_for(&mut graph, &mut index, r);
            for &w in &writes {
                let target = node_for(&mut graph, &mut index, w);
                graph.add_edge(source, target, operation.name.clone());
            }
        }
    }

    (graph, index)
}

fn build_operation_dag(
    operations: &[crate::model::OperationDescriptor],
) -> (DiGraph<String, Vec<String>>, IndexMap<String, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut index = IndexMap::new();
    for operation in operations {
        let node = graph.add_node(operation.name.clone());
        index.insert(operation.name.clone(), node);
    }

    for a in operations {
        let writes_a: BTreeSet<&str> = a.writes.iter().map(|s| s.as_str()).collect();
        if writes_a.is_empty() {
            continue;
        }
        for b in operations {
            if a.name == b.name {
                continue;
            }
            let mediating: Vec<String> = b
                .reads
                .iter()
                .filter(|r| writes_a.contains(r.as_str()))
                .cloned()
                .collect();
            if !mediating.is_empty() {
                let source = index[&a.name];
                let target = index[&b.name];
                graph.add_edge(source, target, mediating);
            }
        }
    }

    (graph, index)
}

fn build_hierarchy(operations: &[crate::model::OperationDescriptor]) -> HierarchyForest {
    let mut forest = HierarchyForest::default();
    for operation in operations {
        forest.insert(&operation.name);
    }
    forest
}
