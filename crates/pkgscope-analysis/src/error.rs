//! Analysis and query error types.

use std::path::PathBuf;
use std::time::Duration;

use pkgscope_core::{ArtifactIdentity, ArtifactKey, ErrorKind};
use pkgscope_registry::RegistryError;

/// Errors raised while resolving, analyzing, or querying artifacts.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A required argument was missing or malformed.
    #[error("invalid argument '{name}': {detail}")]
    InvalidArgument { name: &'static str, detail: String },

    /// The file exists but the analyzer does not recognize it.
    #[error("'{}' is not a managed artifact", .path.display())]
    NotAnalyzable { path: PathBuf },

    /// The analyzer recognized the file but could not read it.
    #[error("failed to analyze '{}': {detail}", .path.display())]
    AnalyzerFailed { path: PathBuf, detail: String },

    #[error("type '{name}' not found in {artifact}")]
    TypeNotFound { name: String, artifact: String },

    #[error("invalid pattern '{pattern}': {detail}")]
    InvalidPattern { pattern: String, detail: String },

    /// Nothing cached under `key`. `cached` lists what is cached for the package.
    #[error("{key} has not been analyzed, or its cached analysis expired")]
    CacheMiss {
        key: ArtifactKey,
        cached: Vec<ArtifactIdentity>,
    },

    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },

    #[error("{operation} timed out after {}s", .after.as_secs())]
    TimedOut {
        operation: &'static str,
        after: Duration,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::Registry(e) => e.kind(),
            AnalysisError::InvalidArgument { .. } | AnalysisError::InvalidPattern { .. } => {
                ErrorKind::InvalidInput
            }
            AnalysisError::NotAnalyzable { .. } => ErrorKind::NotAnalyzable,
            AnalysisError::TypeNotFound { .. } => ErrorKind::NotFound,
            AnalysisError::CacheMiss { .. } => ErrorKind::CacheMiss,
            AnalysisError::Cancelled { .. } | AnalysisError::TimedOut { .. } => {
                ErrorKind::Cancelled
            }
            AnalysisError::AnalyzerFailed { .. }
            | AnalysisError::Io(_)
            | AnalysisError::Json(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
