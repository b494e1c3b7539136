//! Artifact name normalization and the composite analysis cache key.

use std::fmt;

/// Version token used for "whatever is newest" requests and aliases.
pub const LATEST: &str = "latest";

const DLL_EXTENSION: &str = ".dll";
const EXE_EXTENSION: &str = ".exe";

fn has_extension(name: &str, ext: &str) -> bool {
    name.len() >= ext.len()
        && name
            .get(name.len() - ext.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(ext))
}

/// Resolve the artifact file name for a request.
///
/// Defaults to the package id and appends `.dll` unless the name already
/// carries it. With `accept_exe`, an existing `.exe` extension is kept too.
pub fn normalize_artifact_name(package_id: &str, requested: Option<&str>, accept_exe: bool) -> String {
    let name = requested
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(package_id);
    if has_extension(name, DLL_EXTENSION) || (accept_exe && has_extension(name, EXE_EXTENSION)) {
        name.to_string()
    } else {
        format!("{name}{DLL_EXTENSION}")
    }
}

/// True when `file_name` is a binary the analyzer may accept.
pub fn is_binary_file(file_name: &str, accept_exe: bool) -> bool {
    has_extension(file_name, DLL_EXTENSION) || (accept_exe && has_extension(file_name, EXE_EXTENSION))
}

/// Identity of one analysis cache slot.
///
/// All components are stored lower-cased so that differently phrased
/// requests for the same artifact share a slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    package_id: String,
    version: String,
    artifact_name: String,
    platform: Option<String>,
}

impl ArtifactKey {
    /// Build a key. `version` is a concrete version or [`LATEST`];
    /// `artifact_name` is normalized with [`normalize_artifact_name`].
    pub fn new(package_id: &str, version: &str, artifact_name: Option<&str>, platform: Option<&str>) -> Self {
        let artifact_name = normalize_artifact_name(package_id, artifact_name, true);
        ArtifactKey {
            package_id: package_id.trim().to_lowercase(),
            version: version.trim().to_lowercase(),
            artifact_name: artifact_name.to_lowercase(),
            platform: platform
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_lowercase),
        }
    }

    pub fn package_id(&self) -> &str {
        &self.package_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn artifact_name(&self) -> &str {
        &self.artifact_name
    }

    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    pub fn is_latest(&self) -> bool {
        self.version == LATEST
    }

    /// The same key with a different version component.
    pub fn with_version(&self, version: &str) -> Self {
        ArtifactKey {
            version: version.trim().to_lowercase(),
            ..self.clone()
        }
    }

    /// The same key addressed through the latest alias.
    pub fn latest_alias(&self) -> Self {
        self.with_version(LATEST)
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}/{}",
            self.package_id, self.version, self.artifact_name
        )?;
        if let Some(p) = &self.platform {
            write!(f, " [{p}]")?;
        }
        Ok(())
    }
}
