//! Core domain types: the shapes held by the registry, produced by the
//! graph builder, and emitted by the validator and synthesizers.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which discovery strategy produced a given field. Advisory only — never
/// consulted by the validator or synthesizers, so it cannot cause the two
/// discovery strategies to disagree about registry contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DiscoverySource {
    #[default]
    LoadTime,
    SourceScan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub type_name: String,
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_literal: Option<String>,
    #[serde(default)]
    pub source: DiscoverySource,
}

impl FieldDescriptor {
    pub fn new(type_name: impl Into<String>, is_required: bool) -> Self {
        Self {
            type_name: type_name.into(),
            is_required,
            description: None,
            default_literal: None,
            source: DiscoverySource::LoadTime,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default_literal: impl Into<String>) -> Self {
        self.default_literal = Some(default_literal.into());
        self
    }

    pub fn has_documentation(&self) -> bool {
        self.description
            .as_deref()
            .map(|d| d.trim().len() > 2)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    One,
    Many,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationHint {
    pub field_name: String,
    pub target_entity_name: String,
    pub cardinality: Cardinality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub name: String,
    /// Insertion-ordered; order is preserved for deterministic emission.
    pub attributes: IndexMap<String, FieldDescriptor>,
    #[serde(default)]
    pub presentation: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub relations: Vec<RelationHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EntityDescriptor {
    pub fn has_documentation(&self) -> bool {
        self.description
            .as_deref()
            .map(|d| d.trim().len() > 2)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Dotted identity, grammar `segment(.segment)*`.
    pub name: String,
    pub input_schema_name: String,
    pub output_schema_name: String,
    #[serde(default)]
    pub input_fields: IndexMap<String, FieldDescriptor>,
    #[serde(default)]
    pub output_fields: IndexMap<String, FieldDescriptor>,
    /// Ordered entity names this operation consumes. Sole source of truth
    /// (with `writes`) for inter-operation dependencies.
    #[serde(default)]
    pub reads: Vec<String>,
    #[serde(default)]
    pub writes: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default)]
    pub track: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OperationDescriptor {
    /// Ancestor segments of the dotted name, excluding the leaf.
    pub fn flow_path(&self) -> Vec<&str> {
        let mut segments: Vec<&str> = self.name.split('.').collect();
        segments.pop();
        segments
    }

    pub fn leaf_segment(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn has_documentation(&self) -> bool {
        self.description
            .as_deref()
            .map(|d| d.trim().len() > 2)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub subject: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl Diagnostic {
    pub fn error(code: &str, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.to_string(),
            subject: subject.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn warning(code: &str, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.to_string(),
            subject: subject.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn info(code: &str, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            code: code.to_string(),
            subject: subject.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactRecord {
    pub relative_path: String,
    pub content_bytes: Vec<u8>,
    pub content_hash: String,
    pub generator_id: String,
}
