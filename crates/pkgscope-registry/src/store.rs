//! Local package store.
//!
//! Holds downloaded package contents in a fixed layout that artifact
//! resolution relies on:
//!
//! Layout:
//! ```text
//! <store_root>/
//!   <package-id, lower-cased>/
//!     <version>/
//!       .pkgscope-complete   (written last, marks a finished copy)
//!       lib/<tfm>/*.dll
//!       ref/<tfm>/*.dll
//!       build/.NETFramework/<v>/*.dll
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::client::{PackageGroups, PlatformGroup};
use crate::error::{RegistryError, Result};

const COMPLETE_MARKER: &str = ".pkgscope-complete";
const STAGING_PREFIX: &str = ".staging-";

/// A package store backed by the filesystem.
#[derive(Debug, Clone)]
pub struct PackageStore {
    /// Root directory for the store.
    root: PathBuf,
}

impl PackageStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: PathBuf) -> Self {
        PackageStore { root }
    }

    /// Create a store at the default location (`~/.pkgscope/packages`).
    pub fn default_location() -> Option<Self> {
        home_dir().map(|home| PackageStore::new(home.join(".pkgscope").join("packages")))
    }

    /// `<root>/<lower id>/<version>`.
    pub fn package_dir(&self, id: &str, version: &str) -> PathBuf {
        self.root.join(id.to_lowercase()).join(version)
    }

    /// Absolute path of a file inside a stored package.
    pub fn artifact_path(&self, id: &str, version: &str, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.package_dir(id, version), |path, segment| path.join(segment))
    }

    /// Check if a package version has been fully materialized.
    pub fn contains(&self, id: &str, version: &str) -> bool {
        self.package_dir(id, version).join(COMPLETE_MARKER).is_file()
    }

    /// Copy every file under `source` into the store.
    ///
    /// Existing complete copies are left untouched. Files are copied into a
    /// staging directory next to the destination, the completion marker is
    /// written last, and the finished copy is renamed into place. Concurrent
    /// callers for the same package race on the rename; losers discard their
    /// staging copy and return the winner's directory.
    pub fn materialize(&self, id: &str, version: &str, source: &Path) -> Result<PathBuf> {
        let dest = self.package_dir(id, version);
        if self.contains(id, version) {
            return Ok(dest);
        }
        let parent = dest.parent().unwrap_or(self.root.as_path());
        std::fs::create_dir_all(parent).map_err(|e| store_err(parent, "creating dir", e))?;
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| store_err(parent, "creating staging dir", e))?;

        copy_tree(source, staging.path())?;
        let marker = staging.path().join(COMPLETE_MARKER);
        std::fs::write(&marker, b"").map_err(|e| store_err(&marker, "writing marker", e))?;

        if std::fs::rename(staging.path(), &dest).is_ok() || self.contains(id, version) {
            return Ok(dest);
        }
        // An interrupted copy without a marker is in the way.
        if dest.is_dir() {
            debug!(path = %dest.display(), "replacing incomplete package copy");
            std::fs::remove_dir_all(&dest).map_err(|e| store_err(&dest, "removing incomplete copy", e))?;
        }
        match std::fs::rename(staging.path(), &dest) {
            Ok(()) => Ok(dest),
            Err(_) if self.contains(id, version) => Ok(dest),
            Err(e) => Err(store_err(&dest, "moving staged copy", e)),
        }
    }

    /// All files of a stored package, relative and `/`-separated, sorted.
    pub fn list_files(&self, id: &str, version: &str) -> Result<Vec<String>> {
        let dir = self.package_dir(id, version);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1) {
            let entry = entry.map_err(|e| RegistryError::Store {
                path: dir.clone(),
                detail: format!("listing files: {e}"),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&dir) else {
                continue;
            };
            let joined = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if joined != COMPLETE_MARKER {
                files.push(joined);
            }
        }
        files.sort();
        Ok(files)
    }

}

/// Recursively copy the contents of `source` into the existing `dest`.
fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|e| RegistryError::Store {
            path: source.to_path_buf(),
            detail: format!("walking package source: {e}"),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| RegistryError::Store {
                path: entry.path().to_path_buf(),
                detail: e.to_string(),
            })?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| store_err(&target, "creating dir", e))?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| store_err(parent, "creating dir", e))?;
            }
            std::fs::copy(entry.path(), &target).map_err(|e| store_err(&target, "copying file", e))?;
        }
    }
    Ok(())
}

fn store_err(path: &Path, action: &str, e: std::io::Error) -> RegistryError {
    RegistryError::Store {
        path: path.to_path_buf(),
        detail: format!("{action}: {e}"),
    }
}

/// Split a package's file list into platform groups by folder convention.
///
/// `lib/<tfm>/…` and `ref/<tfm>/…` become normal and reference groups;
/// `build/.NETFramework/<v>/…` becomes a legacy-framework group. Placeholder
/// `_._` files are skipped, and groups are ordered by platform tag.
pub fn group_files(files: &[String]) -> PackageGroups {
    let mut lib: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut reference: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut legacy: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for file in files {
        let segments: Vec<&str> = file.split('/').collect();
        if segments.last() == Some(&"_._") {
            continue;
        }
        let (bucket, platform) = match segments.as_slice() {
            [top, tfm, _, ..] if top.eq_ignore_ascii_case("lib") => (&mut lib, *tfm),
            [top, tfm, _, ..] if top.eq_ignore_ascii_case("ref") => (&mut reference, *tfm),
            [top, fx, v, _, ..]
                if top.eq_ignore_ascii_case("build") && fx.eq_ignore_ascii_case(".NETFramework") =>
            {
                (&mut legacy, *v)
            }
            _ => continue,
        };
        bucket.entry(platform.to_string()).or_default().push(file.clone());
    }

    let into_groups = |map: BTreeMap<String, Vec<String>>| {
        map.into_iter()
            .map(|(platform, mut files)| {
                files.sort();
                PlatformGroup::new(platform, files)
            })
            .collect()
    };

    PackageGroups {
        lib: into_groups(lib),
        reference: into_groups(reference),
        legacy: into_groups(legacy),
    }
}

/// Get the user's home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}
