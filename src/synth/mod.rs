//! Artifact Synthesizers: four pure generators over the frozen registry
//! and graph. Each is a function of its own declared input subset so the
//! incremental cache can fingerprint them independently; none touches the
//! filesystem or the environment — the orchestrator decides whether and
//! where to write what they return.

pub mod cli_tree;
pub mod diagram;
pub mod http_router;
pub mod workflow_graph;

use std::collections::BTreeMap;
use std::path::Path;

use crate::graph::Graph;
use crate::model::ArtifactRecord;
use crate::registry::Registry;

/// Version stamped into every fingerprint so a new engine release forces
/// regeneration even when registry/graph inputs are unchanged.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A named template's raw bytes, read once up front. A flat directory of
/// templates is the contract (`spec.md` §6); the engine does not parse or
/// interpret them beyond exposing their bytes to `render`.
pub type TemplateSources = BTreeMap<String, Vec<u8>>;

pub fn load_templates(dir: &Path) -> std::io::Result<TemplateSources> {
    let mut templates = TemplateSources::new();
    if !dir.exists() {
        return Ok(templates);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            let name = entry.file_name().to_string_lossy().to_string();
            templates.insert(name, std::fs::read(entry.path())?);
        }
    }
    Ok(templates)
}

/// Minimal `{{key}}` substitution renderer. Templates are an external,
/// synthesizer-internal detail (`spec.md` §9); this default keeps the
/// `render(template_id, value_tree) -> bytes` interface usable without
/// committing the core to a specific template language.
pub fn render(templates: &TemplateSources, template_id: &str, value_tree: &serde_json::Value) -> Vec<u8> {
    let Some(template) = templates.get(template_id) else {
        return Vec::new();
    };
    let mut text = String::from_utf8_lossy(template).into_owned();
    if let Some(object) = value_tree.as_object() {
        for (key, value) in object {
            let placeholder = format!("{{{{{key}}}}}");
            let replacement = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            text = text.replace(&placeholder, &replacement);
        }
    }
    text.into_bytes()
}

/// What a synthesizer hands back before the cache layer turns it into an
/// `ArtifactRecord` by hashing `fingerprint_inputs` alongside the
/// generator id, engine version, and any template bytes it used.
pub struct PendingArtifact {
    pub relative_path: String,
    pub content_bytes: Vec<u8>,
    pub fingerprint_inputs: Vec<u8>,
    pub template_id: Option<String>,
}

pub trait Synthesizer: Send + Sync {
    fn generator_id(&self) -> &'static str;
    fn produce(
        &self,
        registry: &Registry,
        graph: &Graph,
        templates: &TemplateSources,
    ) -> Vec<PendingArtifact>;
}

pub fn all_synthesizers() -> Vec<Box<dyn Synthesizer>> {
    vec![
        Box::new(http_router::HttpRouterSynthesizer),
        Box::new(workflow_graph::WorkflowGraphSynthesizer),
        Box::new(cli_tree::CliCommandTreeSynthesizer),
        Box::new(diagram::DiagramSynthesizer),
    ]
}

pub fn finalize(
    generator_id: &str,
    templates: &TemplateSources,
    pending: PendingArtifact,
) -> ArtifactRecord {
    let template_bytes = pending
        .template_id
        .as_deref()
        .and_then(|id| templates.get(id))
        .map(|b| b.as_slice())
        .unwrap_or(&[]);
    let content_hash = crate::cache::fingerprint(&[
        generator_id.as_bytes(),
        ENGINE_VERSION.as_bytes(),
        &pending.fingerprint_inputs,
        template_bytes,
    ]);
    ArtifactRecord {
        relative_path: pending.relative_path,
        content_bytes: pending.content_bytes,
        content_hash,
        generator_id: generator_id.to_string(),
    }
}
