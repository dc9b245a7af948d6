//! Optional YAML-shaped configuration file at a known project-root path.
//! Unknown keys are preserved (round-tripped) but otherwise unused — the
//! `extra` field holds them rather than rejecting the document outright,
//! since the core is meant to tolerate config files written for a newer
//! or differently-configured build of the same tool.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoveryPaths {
    #[serde(default)]
    pub entities_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub operations_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub discovery: DiscoveryPaths,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".run_cache")
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            project_name: None,
            discovery: DiscoveryPaths::default(),
            cache_dir: default_cache_dir(),
            docs_dir: default_docs_dir(),
            extra: serde_yaml::Mapping::new(),
        }
    }
}

impl ConfigDocument {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&text)
            .map_err(|err| EngineError::Config(format!("{}: {err}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = ConfigDocument::load(Path::new("/nonexistent/scaffoldgraph.yaml")).unwrap();
        assert_eq!(config.cache_dir, PathBuf::from(".run_cache"));
        assert_eq!(config.docs_dir, PathBuf::from("docs"));
    }

    #[test]
    fn unknown_keys_are_preserved() {
        let yaml = "project_name: demo\nunknown_key: 42\n";
        let config: ConfigDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.project_name.as_deref(), Some("demo"));
        assert!(config.extra.contains_key(serde_yaml::Value::from("unknown_key")));
    }

    #[test]
    fn recognises_discovery_dirs() {
        let yaml = "discovery:\n  entities_dirs: [src/entities]\n  operations_dirs: [src/ops]\n";
        let config: ConfigDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.discovery.entities_dirs, vec![PathBuf::from("src/entities")]);
    }
}
