//! A local filesystem registry for development and testing.
//!
//! Layout:
//! ```text
//! <root>/
//!   <package-id>/
//!     <version>/
//!       package.toml
//!       lib/<tfm>/*.dll
//!       ...
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::{
    DependencyGroup, DownloadResult, DownloadStatus, DownloadedPackage, PackageIdentity,
    PackageSummary, PackageVersionCandidate, RegistryClient,
};
use crate::error::{RegistryError, Result};
use crate::store::{group_files, PackageStore};
use crate::version;

const MANIFEST_FILE: &str = "package.toml";

/// `package.toml` contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageManifest {
    pub package: PackageMetadata,
    #[serde(default, rename = "dependency-groups")]
    pub dependency_groups: Vec<ManifestDependencyGroup>,
}

/// Core package metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub published: Option<String>,
}

/// Dependencies for one target framework.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestDependencyGroup {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl PackageManifest {
    pub fn parse(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| RegistryError::InvalidManifest {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    fn into_candidate(self) -> PackageVersionCandidate {
        let PackageManifest {
            package,
            dependency_groups,
        } = self;
        PackageVersionCandidate {
            identity: PackageIdentity::new(package.id, package.version),
            authors: package.authors,
            description: package.description,
            tags: package.tags,
            download_count: Some(package.downloads),
            published: package.published,
            dependency_groups: dependency_groups
                .into_iter()
                .map(|g| DependencyGroup {
                    platform: g.platform,
                    dependencies: g.dependencies.into_iter().collect(),
                })
                .collect(),
        }
    }
}

/// A registry that reads packages from a directory tree and materializes
/// downloads into a [`PackageStore`].
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    root: PathBuf,
    store: PackageStore,
}

impl LocalRegistry {
    /// Create a local registry rooted at the given directory.
    pub fn new(root: PathBuf, store: PackageStore) -> Self {
        LocalRegistry { root, store }
    }

    /// Package directory, matched case-insensitively.
    fn package_dir(&self, id: &str) -> Result<Option<PathBuf>> {
        if !self.root.is_dir() {
            return Ok(None);
        }
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.path().is_dir() && entry.file_name().to_string_lossy().eq_ignore_ascii_case(id) {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }

    fn read_versions(&self, id: &str) -> Result<Vec<PackageVersionCandidate>> {
        let Some(dir) = self.package_dir(id)? else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let manifest = entry.path().join(MANIFEST_FILE);
            if manifest.is_file() {
                out.push(PackageManifest::load(&manifest)?.into_candidate());
            }
        }
        out.sort_by(|a, b| {
            let va = version::parse_version(&a.identity.version).ok();
            let vb = version::parse_version(&b.identity.version).ok();
            va.cmp(&vb)
        });
        Ok(out)
    }

    fn search_blocking(&self, text: &str, max_results: usize) -> Result<Vec<PackageSummary>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let needle = text.trim().to_lowercase();
        let mut results = Vec::new();

        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let versions = self.read_versions(&name)?;
            let Ok(latest) = version::select(&name, &versions, None) else {
                continue;
            };

            let matches = needle.is_empty()
                || latest.identity.id.to_lowercase().contains(&needle)
                || latest
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || latest.tags.iter().any(|t| t.to_lowercase().contains(&needle));
            if !matches {
                continue;
            }

            results.push(PackageSummary {
                id: latest.identity.id.clone(),
                latest_version: latest.identity.version.clone(),
                description: latest.description.clone(),
                authors: latest.authors.clone(),
                total_downloads: versions.iter().filter_map(|v| v.download_count).sum(),
            });
        }

        results.sort_by(|a, b| b.total_downloads.cmp(&a.total_downloads).then_with(|| a.id.cmp(&b.id)));
        results.truncate(max_results);
        Ok(results)
    }

    fn download_blocking(&self, identity: &PackageIdentity) -> Result<DownloadResult> {
        let Some(dir) = self.package_dir(&identity.id)? else {
            return Ok(DownloadResult::unavailable(DownloadStatus::NotFound));
        };
        let source = dir.join(&identity.version);
        if !source.join(MANIFEST_FILE).is_file() {
            return Ok(DownloadResult::unavailable(DownloadStatus::NotFound));
        }

        if self.store.contains(&identity.id, &identity.version) {
            debug!(package = %identity, "package already in store");
        } else {
            info!(package = %identity, "materializing package");
        }
        let install_dir = self.store.materialize(&identity.id, &identity.version, &source)?;
        let files = self.store.list_files(&identity.id, &identity.version)?;

        Ok(DownloadResult::available(DownloadedPackage {
            identity: identity.clone(),
            install_dir,
            groups: group_files(&files),
        }))
    }
}

async fn blocking<T, F>(operation: &str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RegistryError::Upstream {
            detail: format!("{operation} task failed: {e}"),
        })?
}

#[async_trait]
impl RegistryClient for LocalRegistry {
    async fn search(&self, text: &str, max_results: usize) -> Result<Vec<PackageSummary>> {
        let this = self.clone();
        let text = text.to_string();
        blocking("search", move || this.search_blocking(&text, max_results)).await
    }

    async fn get_metadata(
        &self,
        id: &str,
        include_prerelease: bool,
    ) -> Result<Vec<PackageVersionCandidate>> {
        let this = self.clone();
        let id = id.to_string();
        let mut versions = blocking("metadata", move || this.read_versions(&id)).await?;
        if !include_prerelease {
            versions.retain(|c| {
                version::parse_version(&c.identity.version).is_ok_and(|v| !v.is_prerelease())
            });
        }
        Ok(versions)
    }

    async fn download(&self, identity: &PackageIdentity) -> Result<DownloadResult> {
        let this = self.clone();
        let identity = identity.clone();
        blocking("download", move || this.download_blocking(&identity)).await
    }
}
