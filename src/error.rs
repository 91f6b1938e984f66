//! Error taxonomy for schema loading, parsing, and generation runs.
//!
//! Parse-time problems are collected into validation reports instead of
//! aborting the run; only missing/corrupt inputs are fatal.
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised before any generation or manifest mutation.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema file not found: {}", .0.display())]
    SchemaNotFound(PathBuf),

    #[error("invalid schema JSON in {}: {source}", .path.display())]
    InvalidSchemaJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// DSL grammar violation in a single field or relation string.
///
/// These are recoverable: the validator reports them alongside structural
/// errors so one bad field does not hide other problems.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DslError {
    #[error("malformed field spec `{definition}`: {reason}")]
    MalformedFieldSpec { definition: String, reason: String },

    #[error("malformed relation spec `{definition}`: {reason}")]
    MalformedRelationSpec { definition: String, reason: String },
}

/// Errors raised while loading or persisting the manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file exists but is not valid JSON. Discarding it
    /// silently would defeat the cleanup/diff safety guarantee, so the
    /// run fails instead.
    #[error("corrupt manifest at {}: {source}", .path.display())]
    CorruptManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest I/O at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single filesystem failure during generation or cleanup.
///
/// Per-file failures are accumulated into the run report rather than
/// aborting mid-loop, so one locked file does not prevent the rest of the
/// run from completing.
#[derive(Debug, Error)]
#[error("{action} {}: {source}", .path.display())]
pub struct IoFailure {
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl IoFailure {
    pub fn new(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            action,
            path: path.into(),
            source,
        }
    }
}
