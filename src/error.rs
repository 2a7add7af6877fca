//! Unified error types for deepcrate
//!
//! Error strategy: the analysis core prefers degraded output over failure.
//! Signal degeneracies (silence, short buffers, non-finite math) never surface
//! as errors; they map to neutral outputs (0 BPM, empty key, 0 energy). The
//! only hard failures are I/O while hashing input content and structurally
//! invalid inputs handed in by the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for deepcrate operations
#[derive(Debug, Error)]
pub enum DeepcrateError {
    #[error("Failed to read '{path}': {source}\n  Tip: Check the path exists and is accessible")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Analysis failed for '{path}': {reason}")]
    AnalysisError { path: PathBuf, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for deepcrate operations
pub type Result<T> = std::result::Result<T, DeepcrateError>;

impl DeepcrateError {
    /// Returns true if this error affects a single file only (skip and continue)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DeepcrateError::ReadError { .. } | DeepcrateError::AnalysisError { .. }
        )
    }

    /// Create a read error with the failing path attached
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeepcrateError::ReadError {
            path: path.into(),
            source,
        }
    }
}
