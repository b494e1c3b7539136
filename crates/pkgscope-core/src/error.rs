//! Error categories shared by every layer.

use std::fmt;

/// Broad category of a failure, used to pick the remedy shown to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Package, version, artifact or type does not exist.
    NotFound,
    /// Malformed version literal, pattern or argument.
    InvalidInput,
    /// Registry or download failure.
    UpstreamUnavailable,
    /// The binary exists but is not a managed artifact.
    NotAnalyzable,
    /// The artifact was never analyzed in this process, or its entry expired.
    CacheMiss,
    /// The caller cancelled the request or it timed out.
    Cancelled,
    /// Anything else.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::UpstreamUnavailable => "upstream unavailable",
            ErrorKind::NotAnalyzable => "not analyzable",
            ErrorKind::CacheMiss => "cache miss",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal error",
        };
        f.write_str(label)
    }
}
