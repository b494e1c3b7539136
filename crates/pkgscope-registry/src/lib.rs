//! Package registry access and artifact resolution for pkgscope.
//!
//! Covers everything between a loosely specified package request and one
//! concrete artifact file on disk:
//!
//! - **Registry clients**: the [`RegistryClient`] trait, a filesystem
//!   [`LocalRegistry`], and the [`CachingRegistry`] metadata decorator
//! - **Version selection**: latest or exact match over published versions
//! - **Package store**: the `root/<id>/<version>/…` layout downloads land in
//! - **Artifact location**: provenance tiers and platform-group matching

pub mod client;
pub mod error;
pub mod local;
pub mod locator;
pub mod metadata_cache;
pub mod store;
pub mod version;

// Re-exports for convenience.
pub use client::{
    DependencyGroup, DownloadResult, DownloadStatus, DownloadedPackage, PackageGroups,
    PackageIdentity, PackageSummary, PackageVersionCandidate, PlatformGroup, Provenance,
    RegistryClient,
};
pub use error::{RegistryError, Result};
pub use local::{LocalRegistry, PackageManifest};
pub use locator::{
    binaries, file_name, locate, select_group, select_tier, LegacyFrameworkPolicy, LocatedArtifact,
};
pub use metadata_cache::CachingRegistry;
pub use store::{group_files, PackageStore};
pub use version::{parse_version, select as select_version, sort_descending, PackageVersion};
