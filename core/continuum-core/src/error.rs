//! Error types for continuum-core operations.
//!
//! Most failure modes in this crate degrade to defaults instead of surfacing
//! here (see [`crate::storage::LoadOutcome`]). What remains are writes and
//! configuration problems the caller has to know about.

use std::path::PathBuf;

/// All errors that can occur in continuum-core operations.
#[derive(Debug, thiserror::Error)]
pub enum ContinuumError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Project root not found: {0}")]
    ProjectRootNotFound(PathBuf),

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using ContinuumError.
pub type Result<T> = std::result::Result<T, ContinuumError>;

impl From<ContinuumError> for String {
    fn from(err: ContinuumError) -> String {
        err.to_string()
    }
}
