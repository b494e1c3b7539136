//! Process-wide cache of analysis results.
//!
//! Entries are keyed by [`ArtifactKey`]. A result resolved through "latest"
//! is stored twice: under its concrete version with the long TTL, and under
//! the `latest` alias with a short TTL so newly published versions are picked
//! up reasonably soon. A per-package index lists what has been analyzed; it
//! is rewritten as a fresh snapshot on every put, so readers never observe a
//! partially updated list.

use std::sync::Arc;
use std::time::Duration;

use pkgscope_core::{AnalysisResult, ArtifactKey, Clock, ExpiringMap, SystemClock};
use tracing::debug;

/// Time-to-live settings for the analysis cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    /// Concrete-version entries and the package index.
    pub analysis: Duration,
    /// `latest` alias entries.
    pub latest_alias: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        CacheTtl {
            analysis: Duration::from_secs(6 * 60 * 60),
            latest_alias: Duration::from_secs(30 * 60),
        }
    }
}

pub struct AnalysisCache {
    entries: ExpiringMap<ArtifactKey, Arc<AnalysisResult>>,
    by_package: ExpiringMap<String, Arc<Vec<Arc<AnalysisResult>>>>,
    ttl: CacheTtl,
}

impl AnalysisCache {
    pub fn new(ttl: CacheTtl, clock: Arc<dyn Clock>) -> Self {
        AnalysisCache {
            entries: ExpiringMap::new(clock.clone()),
            by_package: ExpiringMap::new(clock),
            ttl,
        }
    }

    pub fn ttl(&self) -> CacheTtl {
        self.ttl
    }

    pub fn get(&self, key: &ArtifactKey) -> Option<Arc<AnalysisResult>> {
        self.entries.get(key)
    }

    /// Store `result` under its concrete-version `key`, and under the latest
    /// alias as well when `via_latest` is set. Updates the package index.
    pub fn put(&self, key: &ArtifactKey, result: Arc<AnalysisResult>, via_latest: bool) {
        self.entries.insert(key.clone(), result.clone(), self.ttl.analysis);
        if via_latest {
            self.alias_latest(key, result.clone());
        }

        self.by_package.upsert(key.package_id().to_string(), self.ttl.analysis, |current| {
            let mut snapshot: Vec<Arc<AnalysisResult>> = current
                .map(|list| {
                    list.iter()
                        .filter(|r| !r.identity.same_artifact(&result.identity))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            snapshot.push(result.clone());
            Arc::new(snapshot)
        });
        debug!(key = %key, via_latest, "cached analysis");
    }

    /// Point the latest alias of `key` at `result` without touching the
    /// concrete entry.
    pub fn alias_latest(&self, key: &ArtifactKey, result: Arc<AnalysisResult>) {
        self.entries
            .insert(key.latest_alias(), result, self.ttl.latest_alias);
    }

    /// Everything analyzed for `package_id` (case-insensitive), oldest first.
    pub fn list_by_package(&self, package_id: &str) -> Vec<Arc<AnalysisResult>> {
        self.by_package
            .get(&package_id.trim().to_lowercase())
            .map(|list| list.as_ref().clone())
            .unwrap_or_default()
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        AnalysisCache::new(CacheTtl::default(), Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for AnalysisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCache")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgscope_core::{ArtifactIdentity, ManualClock, SymbolGraph};

    fn result(version: &str, file: &str, platform: &str) -> Arc<AnalysisResult> {
        let identity = ArtifactIdentity {
            package_id: "Newtonsoft.Json".into(),
            package_version: version.into(),
            platform: Some(platform.into()),
            file_name: file.into(),
            binary_version: None,
        };
        Arc::new(AnalysisResult::new(identity, false, SymbolGraph::default(), Vec::new()))
    }

    fn key(version: &str) -> ArtifactKey {
        ArtifactKey::new("Newtonsoft.Json", version, None, None)
    }

    #[test]
    fn latest_alias_expires_before_concrete_entry() {
        let clock = Arc::new(ManualClock::new());
        let cache = AnalysisCache::new(CacheTtl::default(), clock.clone());
        let r = result("13.0.3", "Newtonsoft.Json.dll", "netstandard2.0");
        cache.put(&key("13.0.3"), r.clone(), true);

        assert!(Arc::ptr_eq(&cache.get(&key("latest")).unwrap(), &r));
        assert!(Arc::ptr_eq(&cache.get(&key("13.0.3")).unwrap(), &r));

        clock.advance(Duration::from_secs(31 * 60));
        assert!(cache.get(&key("latest")).is_none());
        assert!(cache.get(&key("13.0.3")).is_some());

        clock.advance(Duration::from_secs(6 * 60 * 60));
        assert!(cache.get(&key("13.0.3")).is_none());
    }

    #[test]
    fn explicit_put_does_not_alias() {
        let cache = AnalysisCache::new(CacheTtl::default(), Arc::new(ManualClock::new()));
        cache.put(&key("12.0.1"), result("12.0.1", "Newtonsoft.Json.dll", "net45"), false);
        assert!(cache.get(&key("latest")).is_none());
    }

    #[test]
    fn index_replaces_same_artifact() {
        let cache = AnalysisCache::new(CacheTtl::default(), Arc::new(ManualClock::new()));
        cache.put(&key("13.0.3"), result("13.0.3", "Newtonsoft.Json.dll", "net45"), false);
        cache.put(&key("12.0.1"), result("12.0.1", "Newtonsoft.Json.dll", "net45"), false);
        let again = result("13.0.3", "NEWTONSOFT.JSON.DLL", "NET45");
        cache.put(&key("13.0.3"), again.clone(), true);

        let listed = cache.list_by_package("newtonsoft.json");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].identity.package_version, "12.0.1");
        assert!(Arc::ptr_eq(&listed[1], &again));
        assert!(cache.list_by_package("Other").is_empty());
    }

    #[test]
    fn unbounded_ttl_from_config_is_accepted() {
        let ttl = CacheTtl {
            analysis: Duration::from_secs(u64::MAX),
            latest_alias: Duration::from_secs(u64::MAX),
        };
        let clock = Arc::new(ManualClock::new());
        let cache = AnalysisCache::new(ttl, clock.clone());
        cache.put(&key("13.0.3"), result("13.0.3", "Newtonsoft.Json.dll", "net45"), true);

        clock.advance(Duration::from_secs(10 * 365 * 24 * 60 * 60));
        assert!(cache.get(&key("13.0.3")).is_some());
        assert!(cache.get(&key("latest")).is_some());
    }

    #[test]
    fn concurrent_puts_keep_every_artifact() {
        let cache = Arc::new(AnalysisCache::new(CacheTtl::default(), Arc::new(ManualClock::new())));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let file = format!("Part{i}.dll");
                    let k = ArtifactKey::new("Newtonsoft.Json", "13.0.3", Some(&file), None);
                    cache.put(&k, result("13.0.3", &file, "net45"), false);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.list_by_package("Newtonsoft.Json").len(), 8);
    }
}
