//! Artifact resolution inside a downloaded package.
//!
//! Picks the provenance tier (runtime binaries, then reference stubs, then
//! legacy framework layouts), walks that tier's platform groups in order,
//! and returns the first file whose name matches the requested artifact.

use std::path::PathBuf;

use pkgscope_core::{is_binary_file, normalize_artifact_name};
use tracing::{debug, warn};

use crate::client::{PackageGroups, PackageIdentity, PlatformGroup, Provenance};
use crate::error::{RegistryError, Result};
use crate::store::PackageStore;

const TIER_ORDER: [Provenance; 3] = [
    Provenance::Normal,
    Provenance::ReferenceOnly,
    Provenance::LegacyFramework,
];

/// Decides which packages ship a fixed, non platform-partitioned build set.
/// For those, a requested platform tag does not filter groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyFrameworkPolicy {
    package_prefixes: Vec<String>,
}

impl LegacyFrameworkPolicy {
    pub fn new(package_prefixes: Vec<String>) -> Self {
        LegacyFrameworkPolicy { package_prefixes }
    }

    pub fn applies_to(&self, package_id: &str) -> bool {
        let id = package_id.to_lowercase();
        self.package_prefixes
            .iter()
            .any(|prefix| id.starts_with(&prefix.to_lowercase()))
    }
}

impl Default for LegacyFrameworkPolicy {
    fn default() -> Self {
        LegacyFrameworkPolicy::new(vec!["Microsoft.NETFramework.ReferenceAssemblies".to_string()])
    }
}

/// A resolved artifact file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedArtifact {
    /// Absolute path inside the package store.
    pub path: PathBuf,
    /// Path relative to the package root.
    pub relative_path: String,
    /// File name as published, e.g. `Newtonsoft.Json.dll`.
    pub file_name: String,
    /// Platform tag of the group the file was found in.
    pub platform: String,
    pub provenance: Provenance,
}

impl LocatedArtifact {
    pub fn is_reference_only(&self) -> bool {
        self.provenance != Provenance::Normal
    }
}

/// The first non-empty provenance tier.
pub fn select_tier(groups: &PackageGroups) -> Option<(Provenance, &[PlatformGroup])> {
    TIER_ORDER
        .iter()
        .map(|p| (*p, groups.of(*p)))
        .find(|(_, g)| !g.is_empty())
}

/// Final path segment of a `/`-separated relative path.
pub fn file_name(relative: &str) -> &str {
    relative.rsplit('/').next().unwrap_or(relative)
}

fn platform_matches(group: &PlatformGroup, platform: Option<&str>, bypass: bool) -> bool {
    bypass || platform.map_or(true, |p| group.platform.eq_ignore_ascii_case(p))
}

/// Locate one artifact in a downloaded package.
pub fn locate(
    store: &PackageStore,
    identity: &PackageIdentity,
    groups: &PackageGroups,
    artifact_name: Option<&str>,
    platform: Option<&str>,
    policy: &LegacyFrameworkPolicy,
) -> Result<LocatedArtifact> {
    let wanted = normalize_artifact_name(&identity.id, artifact_name, false);
    let platform = platform.map(str::trim).filter(|p| !p.is_empty());

    let (provenance, tier) = select_tier(groups).ok_or_else(|| RegistryError::NoPlatformGroups {
        id: identity.id.clone(),
        version: identity.version.clone(),
    })?;
    if provenance != Provenance::Normal {
        warn!(package = %identity, tier = provenance.label(), "no runtime binaries, falling back");
    }

    let bypass = policy.applies_to(&identity.id);
    for group in tier.iter().filter(|g| platform_matches(g, platform, bypass)) {
        if let Some(relative) = group
            .files
            .iter()
            .find(|f| file_name(f).eq_ignore_ascii_case(&wanted))
        {
            debug!(package = %identity, platform = %group.platform, file = %relative, "located artifact");
            return Ok(LocatedArtifact {
                path: store.artifact_path(&identity.id, &identity.version, relative),
                relative_path: relative.clone(),
                file_name: file_name(relative).to_string(),
                platform: group.platform.clone(),
                provenance,
            });
        }
    }

    Err(RegistryError::NoArtifactFound {
        id: identity.id.clone(),
        version: identity.version.clone(),
        artifact: wanted,
        platform: platform.map(String::from),
    })
}

/// The platform group analyze-all works on: the first group of the selected
/// tier that matches `platform` (or simply the first group).
pub fn select_group<'a>(
    identity: &PackageIdentity,
    groups: &'a PackageGroups,
    platform: Option<&str>,
    policy: &LegacyFrameworkPolicy,
) -> Result<(Provenance, &'a PlatformGroup)> {
    let platform = platform.map(str::trim).filter(|p| !p.is_empty());
    let (provenance, tier) = select_tier(groups).ok_or_else(|| RegistryError::NoPlatformGroups {
        id: identity.id.clone(),
        version: identity.version.clone(),
    })?;
    let bypass = policy.applies_to(&identity.id);
    tier.iter()
        .find(|g| platform_matches(g, platform, bypass))
        .map(|g| (provenance, g))
        .ok_or_else(|| RegistryError::NoArtifactFound {
            id: identity.id.clone(),
            version: identity.version.clone(),
            artifact: "*".to_string(),
            platform: platform.map(String::from),
        })
}

/// Binary files (`.dll`, `.exe`) of a group, in group order.
pub fn binaries(group: &PlatformGroup) -> impl Iterator<Item = &str> + '_ {
    group
        .files
        .iter()
        .map(String::as_str)
        .filter(|f| is_binary_file(f, true))
}
