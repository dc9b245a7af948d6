//! HTTP Router Synthesizer: five CRUD routes per entity plus one route per
//! operation. Reads only entity/operation identities and schema
//! references, so its fingerprint is insensitive to everything else about
//! the graph (documentation, tags, presentation hints, ...).

use crate::graph::Graph;
use crate::registry::Registry;

use super::{PendingArtifact, Synthesizer, TemplateSources};

pub struct HttpRouterSynthesizer;

const CRUD_VERBS: [(&str, &str); 5] = [
    ("GET", "list"),
    ("POST", "create"),
    ("GET", "read_one"),
    ("PUT", "update"),
    ("DELETE", "delete"),
];

impl Synthesizer for HttpRouterSynthesizer {
    fn generator_id(&self) -> &'static str {
        "http_router"
    }

    fn produce(
        &self,
        registry: &Registry,
        _graph: &Graph,
        _templates: &TemplateSources,
    ) -> Vec<PendingArtifact> {
        let entities = registry.list_entities();
        let operations = registry.list_operations();

        let mut lines = Vec::new();
        let mut fingerprint_inputs = Vec::new();

        for entity in &entities {
            let path = entity.name.to_lowercase();
            for (verb, action) in CRUD_VERBS {
                let route = if matches!(action, "read_one" | "update" | "delete") {
                    format!("{path}/:id")
                } else {
                    path.clone()
                };
                lines.push(format!("{verb:<6} /{route:<30} -> {action}_{}", entity.name));
                fingerprint_inputs.extend_from_slice(entity.name.as_bytes());
                fingerprint_inputs.extend_from_slice(action.as_bytes());
            }
        }

        for operation in &operations {
            let route = operation.name.replace('.', "/");
            lines.push(format!(
                "POST   /operations/{route:<30} -> {} ({} -> {})",
                operation.name, operation.input_schema_name, operation.output_schema_name
            ));
            fingerprint_inputs.extend_from_slice(operation.name.as_bytes());
            fingerprint_inputs.extend_from_slice(operation.input_schema_name.as_bytes());
            fingerprint_inputs.extend_from_slice(operation.output_schema_name.as_bytes());
        }

        vec![PendingArtifact {
            relative_path: "generated_api.txt".to_string(),
            content_bytes: lines.join("\n").into_bytes(),
            fingerprint_inputs,
            template_id: None,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::decl::EntityDecl;
    use crate::graph::builder;

    #[test]
    fn emits_five_routes_per_entity() {
        let registry = Registry::new();
        EntityDecl::new("User").register(&registry).unwrap();
        let graph = builder::build(&registry);
        let pending = HttpRouterSynthesizer.produce(&registry, &graph, &TemplateSources::new());
        let text = String::from_utf8(pending[0].content_bytes.clone()).unwrap();
        assert_eq!(text.lines().count(), 5);
        assert!(text.contains("/user/:id"));
    }
}
