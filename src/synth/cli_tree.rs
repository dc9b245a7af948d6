//! CLI Command Tree Synthesizer: mirrors the hierarchy forest as nested
//! command groups, with one leaf command per operation whose arguments
//! are the operation's input fields. Fingerprint sensitivity is limited
//! to operation identities and their input field signatures.

use crate::graph::{Graph, HierarchyEntry};
use crate::model::OperationDescriptor;
use crate::registry::Registry;

use super::{PendingArtifact, Synthesizer, TemplateSources};

pub struct CliCommandTreeSynthesizer;

impl Synthesizer for CliCommandTreeSynthesizer {
    fn generator_id(&self) -> &'static str {
        "cli_command_tree"
    }

    fn produce(
        &self,
        registry: &Registry,
        graph: &Graph,
        _templates: &TemplateSources,
    ) -> Vec<PendingArtifact> {
        let operations = registry.list_operations();
        let operations_by_name: std::collections::HashMap<&str, &OperationDescriptor> =
            operations.iter().map(|op| (op.name.as_str(), op)).collect();

        let mut lines = Vec::new();
        let mut fingerprint_inputs = Vec::new();

        let mut root_names: Vec<&String> = graph.hierarchy.roots.keys().collect();
        root_names.sort();
        for root_name in root_names {
            render_group(
                root_name,
                &graph.hierarchy.roots[root_name],
                0,
                &operations_by_name,
                &mut lines,
                &mut fingerprint_inputs,
            );
        }

        vec![PendingArtifact {
            relative_path: "cli/commands.txt".to_string(),
            content_bytes: lines.join("\n").into_bytes(),
            fingerprint_inputs,
            template_id: None,
        }]
    }
}

fn render_group(
    name: &str,
    entry: &HierarchyEntry,
    depth: usize,
    operations_by_name: &std::collections::HashMap<&str, &OperationDescriptor>,
    lines: &mut Vec<String>,
    fingerprint_inputs: &mut Vec<u8>,
) {
    let indent = "  ".repeat(depth);
    match entry {
        HierarchyEntry::Leaf(full_name) => {
            let args = operations_by_name
                .get(full_name.as_str())
                .map(|op| {
                    op.input_fields
                        .iter()
                        .map(|(name, field)| {
                            fingerprint_inputs.extend_from_slice(name.as_bytes());
                            fingerprint_inputs.extend_from_slice(field.type_name.as_bytes());
                            format!("--{name} <{}>", field.type_name)
                        })
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();
            fingerprint_inputs.extend_from_slice(full_name.as_bytes());
            lines.push(format!("{indent}command {name} {args}").trim_end().to_string());
        }
        HierarchyEntry::Flow(node) => {
            lines.push(format!("{indent}group {name}"));
            let mut child_names: Vec<&String> = node.children.keys().collect();
            child_names.sort();
            for child_name in child_names {
                render_group(
                    child_name,
                    &node.children[child_name],
                    depth + 1,
                    operations_by_name,
                    lines,
                    fingerprint_inputs,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::decl::OperationDecl;
    use crate::graph::builder;
    use crate::model::FieldDescriptor;

    #[test]
    fn leaf_command_carries_input_fields_as_flags() {
        let registry = Registry::new();
        OperationDecl::new("payment.charge", "ChargeIn", "ChargeOut")
            .input_field("amount", FieldDescriptor::new("integer", true))
            .register(&registry)
            .unwrap();
        let graph = builder::build(&registry);
        let pending = CliCommandTreeSynthesizer.produce(&registry, &graph, &TemplateSources::new());
        let text = String::from_utf8(pending[0].content_bytes.clone()).unwrap();
        assert!(text.contains("group payment"));
        assert!(text.contains("--amount <integer>"));
    }
}
