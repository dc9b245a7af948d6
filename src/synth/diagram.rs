//! Diagram Synthesizer: Mermaid and DOT text for both the entity graph
//! and the operation multigraph. Sensitive to the full graph, so its
//! fingerprint covers every node and edge it renders.

use crate::graph::{export, Graph};
use crate::registry::Registry;

use super::{PendingArtifact, Synthesizer, TemplateSources};

pub struct DiagramSynthesizer;

impl Synthesizer for DiagramSynthesizer {
    fn generator_id(&self) -> &'static str {
        "diagram"
    }

    fn produce(
        &self,
        registry: &Registry,
        graph: &Graph,
        _templates: &TemplateSources,
    ) -> Vec<PendingArtifact> {
        let operation_flow = export::operation_flow_mermaid(registry, graph);
        let model_relationships = export::entity_relationship_mermaid(registry, graph);
        let dot = export::registry_graph_dot(registry, graph);

        vec![
            PendingArtifact {
                relative_path: "operation-flow.md".to_string(),
                fingerprint_inputs: operation_flow.clone().into_bytes(),
                content_bytes: operation_flow.into_bytes(),
                template_id: None,
            },
            PendingArtifact {
                relative_path: "model-relationships.md".to_string(),
                fingerprint_inputs: model_relationships.clone().into_bytes(),
                content_bytes: model_relationships.into_bytes(),
                template_id: None,
            },
            PendingArtifact {
                relative_path: "registry_graph.dot".to_string(),
                fingerprint_inputs: dot.clone().into_bytes(),
                content_bytes: dot.into_bytes(),
                template_id: None,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::decl::EntityDecl;
    use crate::graph::builder;
    use crate::model::Cardinality;

    #[test]
    fn emits_three_diagram_artifacts() {
        let registry = Registry::new();
        EntityDecl::new("User").register(&registry).unwrap();
        EntityDecl::new("Team")
            .relation("members", "User", Cardinality::Many, None)
            .register(&registry)
            .unwrap();
        let graph = builder::build(&registry);
        let pending = DiagramSynthesizer.produce(&registry, &graph, &TemplateSources::new());
        let paths: Vec<_> = pending.iter().map(|p| p.relative_path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                "operation-flow.md".to_string(),
                "model-relationships.md".to_string(),
                "registry_graph.dot".to_string(),
            ]
        );
    }
}
