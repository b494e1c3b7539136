//! `pkgscope.toml` configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use pkgscope_analysis::{CacheTtl, Timeouts};
use pkgscope_registry::{LegacyFrameworkPolicy, PackageStore};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "pkgscope.toml";

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub registry: RegistrySection,
    pub store: StoreSection,
    pub cache: CacheSection,
    pub timeouts: TimeoutSection,
    pub legacy: LegacySection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    /// Local registry directory. Relative paths are resolved against the
    /// directory the config file was found in.
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Package store root (default `~/.pkgscope/packages`).
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub analysis_ttl_secs: u64,
    pub latest_alias_ttl_secs: u64,
    pub metadata_ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        CacheSection {
            analysis_ttl_secs: 6 * 60 * 60,
            latest_alias_ttl_secs: 30 * 60,
            metadata_ttl_secs: 10 * 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSection {
    pub registry_secs: u64,
    pub download_secs: u64,
    pub analysis_secs: u64,
}

impl Default for TimeoutSection {
    fn default() -> Self {
        TimeoutSection {
            registry_secs: 30,
            download_secs: 120,
            analysis_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacySection {
    /// Package id prefixes whose platform groups ignore the platform filter.
    /// Empty means the built-in default.
    pub package_prefixes: Vec<String>,
}

impl Config {
    /// Search upward from `start_dir` for `pkgscope.toml`, parse it and
    /// return it with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let config = Config::parse(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((config.relative_to(&dir), dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    pub fn parse(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    fn relative_to(mut self, base: &Path) -> Self {
        let anchor = |p: Option<PathBuf>| p.map(|p| if p.is_relative() { base.join(p) } else { p });
        self.registry.root = anchor(self.registry.root.take());
        self.store.root = anchor(self.store.root.take());
        self
    }

    pub fn package_store(&self) -> Result<PackageStore> {
        match &self.store.root {
            Some(root) => Ok(PackageStore::new(root.clone())),
            None => PackageStore::default_location()
                .context("no package store configured and HOME is not set; pass --store"),
        }
    }

    pub fn cache_ttl(&self) -> CacheTtl {
        CacheTtl {
            analysis: Duration::from_secs(self.cache.analysis_ttl_secs),
            latest_alias: Duration::from_secs(self.cache.latest_alias_ttl_secs),
        }
    }

    pub fn metadata_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.metadata_ttl_secs)
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            registry: Duration::from_secs(self.timeouts.registry_secs),
            download: Duration::from_secs(self.timeouts.download_secs),
            analysis: Duration::from_secs(self.timeouts.analysis_secs),
        }
    }

    pub fn legacy_policy(&self) -> LegacyFrameworkPolicy {
        if self.legacy.package_prefixes.is_empty() {
            LegacyFrameworkPolicy::default()
        } else {
            LegacyFrameworkPolicy::new(self.legacy.package_prefixes.clone())
        }
    }
}
