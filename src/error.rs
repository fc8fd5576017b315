//! Error taxonomy for the scan pipeline
//!
//! Configuration, storage and process errors abort a run. I/O and parse errors
//! are scoped to a single job or row and are recorded in the run summary
//! instead of propagating.

use std::path::PathBuf;

/// Errors produced by the pipeline and the domain store
#[derive(Debug, thiserror::Error)]
pub enum TkoError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error during {op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Stored metadata for {domain} is not valid JSON: {source}")]
    Metadata {
        domain: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unparseable result row '{line}': {reason}")]
    Parse { line: String, reason: String },

    #[error("Failed to run {program}: {source}")]
    Process {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl TkoError {
    pub fn config(msg: impl Into<String>) -> Self {
        TkoError::Configuration(msg.into())
    }

    pub(crate) fn storage(op: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| TkoError::Storage { op, source }
    }

    /// Whether the run can continue past this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TkoError::Io { .. } | TkoError::Parse { .. })
    }
}

pub type Result<T, E = TkoError> = std::result::Result<T, E>;
