//! Error types for the herald-state crate.
//!
//! Reads of state files deliberately do not surface here — a failed read is
//! handled closed (empty state plus a warning) at the call site. Writes are
//! different: silently losing rate-limit state risks violating sending
//! policy, so a write that still fails after a retry is a fatal error for
//! the run.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Top-level state persistence error.
#[derive(Debug, Error)]
pub enum StateError {
    /// I/O error outside the retried write path.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serializing a state unit failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A state file could not be written, even after one retry.
    #[error("failed to write state file {path} after retry: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A consumed recipient source could not be moved into the archive.
    #[error("failed to archive {path}: {detail}")]
    Archive { path: PathBuf, detail: String },
}

/// Specialized `Result` type for state operations.
pub type Result<T> = std::result::Result<T, StateError>;
