//! Orchestrator: the only component that touches the filesystem. Drives
//! `discovery → registry → graph → validator`, and — if validation raised
//! no errors — runs the synthesizers, asks the cache whether each
//! artifact is stale, and writes the stale ones before emitting
//! `registry.json`.
//!
//! State machine for a single run (forward-only; `Failed` is terminal):
//! `Idle → Discovering → Registered → GraphBuilt → Validated → Generated
//! → WrittenOrSkipped → Done`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use rayon::prelude::*;
use serde_json::json;
use tracing::{info, info_span, warn};

use crate::cache;
use crate::config::ConfigDocument;
use crate::discovery::source_scan;
use crate::errors::Result;
use crate::graph::{self, builder, export};
use crate::model::{Diagnostic, Severity};
use crate::registry::Registry;
use crate::synth;
use crate::validator;

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Discovering,
    Registered,
    GraphBuilt,
    Validated,
    Generated,
    WrittenOrSkipped,
    Done,
    Failed(Vec<Diagnostic>),
}

pub struct RunReport {
    pub state: PipelineState,
    pub diagnostics: Vec<Diagnostic>,
    pub artifacts_written: Vec<String>,
    pub entity_count: usize,
    pub operation_count: usize,
}

impl RunReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

#[derive(Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
}

impl CancellationToken {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

pub struct Orchestrator {
    registry: Registry,
    config: ConfigDocument,
    project_root: PathBuf,
}

impl Orchestrator {
    pub fn new(project_root: impl Into<PathBuf>, config: ConfigDocument) -> Self {
        Self {
            registry: Registry::new(),
            config,
            project_root: project_root.into(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs `discovery → registry` only; used by the `discover` CLI
    /// command, which prints the registry without validating or
    /// generating anything.
    pub fn discover(&self) -> Result<()> {
        let _span = info_span!("discovery").entered();
        for dir in &self.config.discovery.entities_dirs {
            let dir = self.project_root.join(dir);
            for entity in source_scan::scan_entities_dir(&dir)? {
                self.registry.register_entity(entity)?;
            }
        }
        for dir in &self.config.discovery.operations_dirs {
            let dir = self.project_root.join(dir);
            for operation in source_scan::scan_operations_dir(&dir)? {
                self.registry.register_operation(operation)?;
            }
        }
        info!(
            entities = self.registry.entity_count(),
            operations = self.registry.operation_count(),
            "discovery complete"
        );
        Ok(())
    }

    /// Runs `discovery → registry → graph → validator`, returning the
    /// diagnostics without generating or writing anything.
    pub fn validate(&self) -> Result<(graph::Graph, Vec<Diagnostic>)> {
        self.discover()?;
        let _span = info_span!("graph_build").entered();
        let built = builder::build(&self.registry);
        drop(_span);
        let _span = info_span!("validate").entered();
        let diagnostics = validator::validate(&self.registry, &built);
        Ok((built, diagnostics))
    }

    /// Runs the full pipeline: discovery through artifact write.
    pub fn build(&self, cancellation: Option<&CancellationToken>) -> Result<RunReport> {
        let mut state = PipelineState::Idle;

        state = PipelineState::Discovering;
        self.discover()?;
        state = PipelineState::Registered;

        if let Some(token) = cancellation {
            if token.is_cancelled() {
                return Ok(cancelled_report(&self.registry));
            }
        }

        let _span = info_span!("graph_build").entered();
        let built = builder::build(&self.registry);
        drop(_span);
        state = PipelineState::GraphBuilt;

        let _span = info_span!("validate").entered();
        let diagnostics = validator::validate(&self.registry, &built);
        drop(_span);
        state = PipelineState::Validated;

        if diagnostics.iter().any(|d| d.severity == Severity::Error) {
            warn!(count = diagnostics.len(), "validation failed, aborting before synthesis");
            return Ok(RunReport {
                state: PipelineState::Failed(diagnostics.clone()),
                diagnostics,
                artifacts_written: Vec::new(),
                entity_count: self.registry.entity_count(),
                operation_count: self.registry.operation_count(),
            });
        }

        if let Some(token) = cancellation {
            if token.is_cancelled() {
                return Ok(cancelled_report(&self.registry));
            }
        }

        let templates_dir = self.project_root.join("templates");
        let templates = synth::load_templates(&templates_dir)?;

        let _span = info_span!("synthesize").entered();
        let synthesizers = synth::all_synthesizers();
        let records: Vec<_> = synthesizers
            .par_iter()
            .flat_map(|synthesizer| {
                synthesizer
                    .produce(&self.registry, &built, &templates)
                    .into_iter()
                    .map(|pending| synth::finalize(synthesizer.generator_id(), &templates, pending))
                    .collect::<Vec<_>>()
            })
            .collect();
        drop(_span);
        state = PipelineState::Generated;

        let cache_dir = self.project_root.join(&self.config.cache_dir);
        let docs_dir = self.project_root.join(&self.config.docs_dir);

        let _span = info_span!("cache_write").entered();
        let mut artifacts_written = Vec::new();
        for record in &records {
            let target_dir = if record.generator_id == "diagram" {
                &docs_dir
            } else {
                &cache_dir
            };
            if cache::store_if_stale(target_dir, record)? {
                artifacts_written.push(record.relative_path.clone());
            }
        }
        drop(_span);
        state = PipelineState::WrittenOrSkipped;

        write_registry_json(&self.registry, &cache_dir)?;
        write_registry_graph_json(&built, &self.registry, &diagnostics, &cache_dir)?;
        state = PipelineState::Done;

        info!(written = artifacts_written.len(), ?state, "pipeline run complete");

        Ok(RunReport {
            state,
            diagnostics,
            artifacts_written,
            entity_count: self.registry.entity_count(),
            operation_count: self.registry.operation_count(),
        })
    }
}

fn cancelled_report(registry: &Registry) -> RunReport {
    let diagnostic = Diagnostic::error("CANCELLED", "pipeline", "run cancelled between stages");
    RunReport {
        state: PipelineState::Failed(vec![diagnostic.clone()]),
        diagnostics: vec![diagnostic],
        artifacts_written: Vec::new(),
        entity_count: registry.entity_count(),
        operation_count: registry.operation_count(),
    }
}

fn write_registry_json(registry: &Registry, cache_dir: &Path) -> Result<()> {
    let document = json!({
        "generated_at": Utc::now().to_rfc3339(),
        "entities": registry.list_entities(),
        "operations": registry.list_operations(),
    });
    let bytes = serde_json::to_vec_pretty(&document)
        .map_err(|err| crate::errors::EngineError::Internal(err.to_string()))?;
    let record = crate::model::ArtifactRecord {
        relative_path: "registry.json".to_string(),
        content_hash: cache::fingerprint(&[&bytes]),
        content_bytes: bytes,
        generator_id: "orchestrator".to_string(),
    };
    cache::store_if_stale(cache_dir, &record)?;
    Ok(())
}

fn write_registry_graph_json(
    built: &graph::Graph,
    registry: &Registry,
    diagnostics: &[Diagnostic],
    cache_dir: &Path,
) -> Result<()> {
    let document = export::to_json(built, registry, diagnostics);
    let bytes = serde_json::to_vec_pretty(&document)
        .map_err(|err| crate::errors::EngineError::Internal(err.to_string()))?;
    let record = crate::model::ArtifactRecord {
        relative_path: "registry_graph.json".to_string(),
        content_hash: cache::fingerprint(&[&bytes]),
        content_bytes: bytes,
        generator_id: "orchestrator".to_string(),
    };
    cache::store_if_stale(cache_dir, &record)?;
    Ok(())
}
