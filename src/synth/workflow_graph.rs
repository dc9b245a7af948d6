//! Workflow Graph Synthesizer: a textual rendering of the hierarchy
//! forest annotated with the OperationDAG. The hierarchical name is
//! organisational only; execution order comes strictly from the
//! OperationDAG's `parallel_levels`, computed per flow.

use crate::graph::{Graph, HierarchyEntry};
use crate::registry::Registry;

use super::{PendingArtifact, Synthesizer, TemplateSources};

pub struct WorkflowGraphSynthesizer;

impl Synthesizer for WorkflowGraphSynthesizer {
    fn generator_id(&self) -> &'static str {
        "workflow_graph"
    }

    fn produce(
        &self,
        registry: &Registry,
        graph: &Graph,
        _templates: &TemplateSources,
    ) -> Vec<PendingArtifact> {
        let operations = registry.list_operations();
        let mut lines = Vec::new();
        let mut fingerprint_inputs = Vec::new();

        let mut root_names: Vec<&String> = graph.hierarchy.roots.keys().collect();
        root_names.sort();
        for root_name in root_names {
            let entry = &graph.hierarchy.roots[root_name];
            render_entry(root_name, entry, 0, graph, &mut lines, &mut fingerprint_inputs);
        }

        for operation in &operations {
            let predecessors: Vec<&str> = graph
                .operation_node(&operation.name)
                .map(|node| {
                    graph
                        .operation_dag
                        .edges_directed(node, petgraph::Direction::Incoming)
                        .map(|edge| {
                            let source = petgraph::visit::EdgeRef::source(&edge);
                            graph.operation_dag[source].as_str()
                        })
                        .collect()
                })
                .unwrap_or_default();
            let mut predecessors = predecessors;
            predecessors.sort();
            fingerprint_inputs.extend_from_slice(operation.name.as_bytes());
            for p in &predecessors {
                fingerprint_inputs.extend_from_slice(p.as_bytes());
            }
            lines.push(format!(
                "entry {}: predecessors=[{}]",
                operation.name,
                predecessors.join(", ")
            ));
        }

        vec![PendingArtifact {
            relative_path: "generated_flows.txt".to_string(),
            content_bytes: lines.join("\n").into_bytes(),
            fingerprint_inputs,
            template_id: None,
        }]
    }
}

fn render_entry(
    name: &str,
    entry: &HierarchyEntry,
    depth: usize,
    graph: &Graph,
    lines: &mut Vec<String>,
    fingerprint_inputs: &mut Vec<u8>,
) {
    let indent = "  ".repeat(depth);
    match entry {
        HierarchyEntry::Leaf(full_name) => {
            lines.push(format!("{indent}- {name} ({full_name})"));
            fingerprint_inputs.extend_from_slice(full_name.as_bytes());
        }
        HierarchyEntry::Flow(node) => {
            lines.push(format!("{indent}flow {name}:"));
            fingerprint_inputs.extend_from_slice(name.as_bytes());

            let leaves: Vec<String> = node
                .children
                .values()
                .filter_map(|child| match child {
                    HierarchyEntry::Leaf(full_name) => Some(full_name.clone()),
                    HierarchyEntry::Flow(_) => None,
                })
                .collect();
            if !leaves.is_empty() {
                let levels = graph.parallel_levels_within(&leaves);
                for (i, level) in levels.iter().enumerate() {
                    let mut level = level.clone();
                    level.sort();
                    lines.push(format!("{indent}  level {i}: [{}]", level.join(", ")));
                    for op in &level {
                        fingerprint_inputs.extend_from_slice(op.as_bytes());
                    }
                }
            }

            let mut child_names: Vec<&String> = node.children.keys().collect();
            child_names.sort();
            for child_name in child_names {
                if let HierarchyEntry::Flow(_) = &node.children[child_name] {
                    render_entry(
                        child_name,
                        &node.children[child_name],
                        depth + 1,
                        graph,
                        lines,
                        fingerprint_inputs,
                    );
                }
            }
        }
    }
}
