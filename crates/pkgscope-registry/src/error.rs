//! Registry error types.

use std::path::PathBuf;

use pkgscope_core::ErrorKind;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The registry has no versions for the package.
    #[error("package not found: {id}")]
    PackageNotFound { id: String },

    /// Requested version not published.
    #[error("version {version} not found for package '{id}'")]
    VersionNotFound { id: String, version: String },

    /// Version literal could not be parsed.
    #[error("invalid version '{version}': {detail}")]
    InvalidVersion { version: String, detail: String },

    /// The package ships no lib, ref or legacy-framework groups.
    #[error("package '{id}@{version}' has no platform groups containing binaries")]
    NoPlatformGroups { id: String, version: String },

    /// No platform group contains the requested artifact.
    #[error("artifact '{artifact}' not found in '{id}@{version}'{}", platform_suffix(.platform))]
    NoArtifactFound {
        id: String,
        version: String,
        artifact: String,
        platform: Option<String>,
    },

    /// The download collaborator did not report an available package.
    #[error("download of '{id}@{version}' unavailable: {status}")]
    DownloadUnavailable {
        id: String,
        version: String,
        status: String,
    },

    /// The registry could not be reached or answered with a failure.
    #[error("registry unavailable: {detail}")]
    Upstream { detail: String },

    /// Package store I/O error.
    #[error("package store error at {path}: {detail}")]
    Store { path: PathBuf, detail: String },

    /// Invalid package manifest in a local registry.
    #[error("invalid package manifest at {path}: {detail}")]
    InvalidManifest { path: PathBuf, detail: String },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn platform_suffix(platform: &Option<String>) -> String {
    platform
        .as_deref()
        .map(|p| format!(" for platform '{p}'"))
        .unwrap_or_default()
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::PackageNotFound { .. }
            | RegistryError::VersionNotFound { .. }
            | RegistryError::NoPlatformGroups { .. }
            | RegistryError::NoArtifactFound { .. } => ErrorKind::NotFound,
            RegistryError::InvalidVersion { .. } => ErrorKind::InvalidInput,
            RegistryError::DownloadUnavailable { .. } | RegistryError::Upstream { .. } => {
                ErrorKind::UpstreamUnavailable
            }
            RegistryError::Store { .. }
            | RegistryError::InvalidManifest { .. }
            | RegistryError::Toml(_)
            | RegistryError::Json(_)
            | RegistryError::Io(_) => ErrorKind::Internal,
        }
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_message_mentions_platform() {
        let err = RegistryError::NoArtifactFound {
            id: "Pkg".into(),
            version: "1.0.0".into(),
            artifact: "Pkg.dll".into(),
            platform: Some("net8.0".into()),
        };
        assert_eq!(
            err.to_string(),
            "artifact 'Pkg.dll' not found in 'Pkg@1.0.0' for platform 'net8.0'"
        );
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn invalid_version_is_input_error() {
        let err = RegistryError::InvalidVersion {
            version: "abc".into(),
            detail: "not a number".into(),
        };
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
