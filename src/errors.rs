//! Error taxonomy for the engine.
//!
//! Only two classes of failure unwind as a Rust `Result::Err`: duplicate
//! registration during discovery and I/O failure during the atomic cache
//! write. Everything else the validator finds (missing references, cycles,
//! malformed names, documentation gaps) is accumulated as a `Diagnostic`
//! (see `model.rs`) rather than raised here, so that a single run always
//! produces a complete diagnostics list instead of stopping at the first
//! problem.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },

    #[error("cache I/O failure writing {path}: {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pipeline cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
