//! Registry client trait and the records it exchanges.
//!
//! The `RegistryClient` trait abstracts over registry implementations (local
//! filesystem, remote feeds). Every call is async and may be long-running;
//! callers wrap them in timeouts and cancellation.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Package id plus one concrete version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageIdentity {
    pub id: String,
    pub version: String,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        PackageIdentity {
            id: id.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

/// Dependencies declared for one target framework.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGroup {
    /// Target framework; `None` applies to every framework.
    #[serde(default)]
    pub platform: Option<String>,
    /// `(package id, version range)` pairs.
    #[serde(default)]
    pub dependencies: Vec<(String, String)>,
}

/// One published version of a package as reported by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageVersionCandidate {
    pub identity: PackageIdentity,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub download_count: Option<u64>,
    /// Publish date as reported by the registry (ISO 8601).
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub dependency_groups: Vec<DependencyGroup>,
}

impl PackageVersionCandidate {
    pub fn new(identity: PackageIdentity) -> Self {
        PackageVersionCandidate {
            identity,
            authors: Vec::new(),
            description: None,
            tags: Vec::new(),
            download_count: None,
            published: None,
            dependency_groups: Vec::new(),
        }
    }
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSummary {
    pub id: String,
    pub latest_version: String,
    pub description: Option<String>,
    pub authors: Vec<String>,
    pub total_downloads: u64,
}

/// How a platform group's binaries are meant to be consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    /// Runtime binaries (`lib/<tfm>/`).
    Normal,
    /// Compile-time reference stubs (`ref/<tfm>/`).
    ReferenceOnly,
    /// Framework reference packages laid out under `build/.NETFramework/<v>/`.
    LegacyFramework,
}

impl Provenance {
    pub fn label(self) -> &'static str {
        match self {
            Provenance::Normal => "lib",
            Provenance::ReferenceOnly => "ref",
            Provenance::LegacyFramework => "legacy framework",
        }
    }
}

/// Artifact files published for one platform tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformGroup {
    /// Platform tag, e.g. `netstandard2.0` or `v4.8`.
    pub platform: String,
    /// File paths relative to the package root, `/`-separated.
    pub files: Vec<String>,
}

impl PlatformGroup {
    pub fn new(platform: impl Into<String>, files: Vec<String>) -> Self {
        PlatformGroup {
            platform: platform.into(),
            files,
        }
    }
}

/// Platform groups of a package, split by provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageGroups {
    pub lib: Vec<PlatformGroup>,
    pub reference: Vec<PlatformGroup>,
    pub legacy: Vec<PlatformGroup>,
}

impl PackageGroups {
    pub fn of(&self, provenance: Provenance) -> &[PlatformGroup] {
        match provenance {
            Provenance::Normal => &self.lib,
            Provenance::ReferenceOnly => &self.reference,
            Provenance::LegacyFramework => &self.legacy,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lib.is_empty() && self.reference.is_empty() && self.legacy.is_empty()
    }
}

/// Outcome of a download request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadStatus {
    Available,
    NotFound,
    Failed,
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DownloadStatus::Available => "available",
            DownloadStatus::NotFound => "not found",
            DownloadStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// A package materialized in the package store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedPackage {
    pub identity: PackageIdentity,
    /// `<store root>/<lower id>/<version>`.
    pub install_dir: PathBuf,
    pub groups: PackageGroups,
}

/// Result of [`RegistryClient::download`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub status: DownloadStatus,
    /// Present when `status` is [`DownloadStatus::Available`].
    pub package: Option<DownloadedPackage>,
}

impl DownloadResult {
    pub fn available(package: DownloadedPackage) -> Self {
        DownloadResult {
            status: DownloadStatus::Available,
            package: Some(package),
        }
    }

    pub fn unavailable(status: DownloadStatus) -> Self {
        DownloadResult {
            status,
            package: None,
        }
    }
}

/// Abstract package registry.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Search packages by free text.
    async fn search(&self, text: &str, max_results: usize) -> Result<Vec<PackageSummary>>;

    /// All published versions of a package, in registry order.
    async fn get_metadata(
        &self,
        id: &str,
        include_prerelease: bool,
    ) -> Result<Vec<PackageVersionCandidate>>;

    /// Materialize one package version in the package store.
    async fn download(&self, identity: &PackageIdentity) -> Result<DownloadResult>;
}
