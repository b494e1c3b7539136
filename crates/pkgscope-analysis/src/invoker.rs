//! Resolve a loose artifact request to one analysis result.
//!
//! [`AnalysisService`] owns the collaborators (registry, analyzer, package
//! store) and the process-wide [`AnalysisCache`]. Every external call is
//! bounded by a timeout and aborts when the caller's cancellation token
//! fires; nothing is written to the cache on either path.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pkgscope_core::{normalize_artifact_name, AnalysisResult, ArtifactIdentity, ArtifactKey, LATEST};
use pkgscope_registry::{
    binaries, file_name, locate, parse_version, select_group, select_version, DownloadStatus,
    DownloadedPackage, LegacyFrameworkPolicy, LocatedArtifact, PackageIdentity, PackageStore,
    PackageSummary, PackageVersionCandidate, PlatformGroup, Provenance, RegistryClient,
    RegistryError,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analyzer::{doc_comments_path, BinaryAnalyzer};
use crate::cache::AnalysisCache;
use crate::error::{AnalysisError, Result};

/// Time budget for each kind of external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub registry: Duration,
    pub download: Duration,
    pub analysis: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            registry: Duration::from_secs(30),
            download: Duration::from_secs(120),
            analysis: Duration::from_secs(120),
        }
    }
}

/// A loosely specified artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactRequest {
    pub package_id: String,
    pub artifact_name: Option<String>,
    pub version: Option<String>,
    pub platform: Option<String>,
}

impl ArtifactRequest {
    pub fn new(package_id: impl Into<String>) -> Self {
        ArtifactRequest {
            package_id: package_id.into(),
            ..Default::default()
        }
    }

    pub fn artifact(mut self, name: impl Into<String>) -> Self {
        self.artifact_name = Some(name.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }
}

/// Outcome for one file of an analyze-all run.
#[derive(Debug)]
pub struct ArtifactOutcome {
    pub file_name: String,
    pub result: Result<Arc<AnalysisResult>>,
}

/// Every binary of one platform group, analyzed.
#[derive(Debug)]
pub struct BatchAnalysis {
    pub identity: PackageIdentity,
    pub platform: String,
    pub provenance: Provenance,
    pub artifacts: Vec<ArtifactOutcome>,
}

/// A resolved version together with its downloaded payload.
#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    pub candidate: PackageVersionCandidate,
    pub package: DownloadedPackage,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Canonical text of a version, used as the key's version component.
fn normalized_version(version: &str) -> Result<String> {
    Ok(parse_version(version)?.to_string())
}

fn require_package_id(package_id: &str) -> Result<&str> {
    let id = package_id.trim();
    if id.is_empty() {
        return Err(AnalysisError::InvalidArgument {
            name: "package_id",
            detail: "must not be empty".to_string(),
        });
    }
    Ok(id)
}

pub struct AnalysisService {
    registry: Arc<dyn RegistryClient>,
    analyzer: Arc<dyn BinaryAnalyzer>,
    store: PackageStore,
    cache: Arc<AnalysisCache>,
    policy: LegacyFrameworkPolicy,
    timeouts: Timeouts,
}

impl AnalysisService {
    pub fn new(
        registry: Arc<dyn RegistryClient>,
        analyzer: Arc<dyn BinaryAnalyzer>,
        store: PackageStore,
        cache: Arc<AnalysisCache>,
    ) -> Self {
        AnalysisService {
            registry,
            analyzer,
            store,
            cache,
            policy: LegacyFrameworkPolicy::default(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_policy(mut self, policy: LegacyFrameworkPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Run `fut` under `limit`, giving up early if `cancel` fires.
    async fn guarded<T, E, F>(
        &self,
        operation: &'static str,
        limit: Duration,
        cancel: &CancellationToken,
        fut: F,
    ) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: Into<AnalysisError>,
    {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(operation, "cancelled by caller");
                Err(AnalysisError::Cancelled { operation })
            }
            outcome = tokio::time::timeout(limit, fut) => match outcome {
                Ok(result) => result.map_err(Into::into),
                Err(_) => {
                    warn!(operation, limit_secs = limit.as_secs(), "timed out");
                    Err(AnalysisError::TimedOut { operation, after: limit })
                }
            },
        }
    }

    pub async fn search(
        &self,
        text: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<PackageSummary>> {
        self.guarded(
            "search",
            self.timeouts.registry,
            cancel,
            self.registry.search(text, max_results),
        )
        .await
    }

    /// Every published version, prereleases included. Never empty.
    pub async fn versions(
        &self,
        package_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<PackageVersionCandidate>> {
        let id = require_package_id(package_id)?;
        let candidates = self
            .guarded(
                "metadata",
                self.timeouts.registry,
                cancel,
                self.registry.get_metadata(id, true),
            )
            .await?;
        if candidates.is_empty() {
            return Err(RegistryError::PackageNotFound { id: id.to_string() }.into());
        }
        Ok(candidates)
    }

    async fn download(
        &self,
        identity: &PackageIdentity,
        cancel: &CancellationToken,
    ) -> Result<DownloadedPackage> {
        let result = self
            .guarded(
                "download",
                self.timeouts.download,
                cancel,
                self.registry.download(identity),
            )
            .await?;
        match (result.status, result.package) {
            (DownloadStatus::Available, Some(package)) => Ok(package),
            (status, _) => Err(RegistryError::DownloadUnavailable {
                id: identity.id.clone(),
                version: identity.version.clone(),
                status: status.to_string(),
            }
            .into()),
        }
    }

    /// Select a version and make sure its payload is in the package store.
    pub async fn resolve_package(
        &self,
        package_id: &str,
        version: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ResolvedPackage> {
        let candidates = self.versions(package_id, cancel).await?;
        let candidate = select_version(package_id.trim(), &candidates, version)?.clone();
        let package = self.download(&candidate.identity, cancel).await?;
        Ok(ResolvedPackage { candidate, package })
    }

    async fn analyze_located(
        &self,
        identity: &PackageIdentity,
        located: &LocatedArtifact,
        cancel: &CancellationToken,
    ) -> Result<Arc<AnalysisResult>> {
        let docs = doc_comments_path(&located.path).await;
        let analyzed = self
            .guarded(
                "analysis",
                self.timeouts.analysis,
                cancel,
                self.analyzer.analyze(&located.path, docs.as_deref()),
            )
            .await?
            .ok_or_else(|| AnalysisError::NotAnalyzable {
                path: located.path.clone(),
            })?;

        info!(
            package = %identity,
            artifact = %located.file_name,
            platform = %located.platform,
            types = analyzed.graph.type_count(),
            "analyzed artifact"
        );
        let artifact = ArtifactIdentity {
            package_id: identity.id.clone(),
            package_version: identity.version.clone(),
            platform: Some(located.platform.clone()),
            file_name: located.file_name.clone(),
            binary_version: analyzed.binary_version,
        };
        Ok(Arc::new(AnalysisResult::new(
            artifact,
            located.is_reference_only(),
            analyzed.graph,
            analyzed.referenced_artifacts,
        )))
    }

    /// Look `key` up, falling back from the latest alias to the concrete
    /// entry (and refreshing the alias) when only the latter is live.
    fn cached(&self, lookup: &ArtifactKey, concrete: &ArtifactKey) -> Option<Arc<AnalysisResult>> {
        if let Some(hit) = self.cache.get(lookup) {
            debug!(key = %lookup, "analysis cache hit");
            return Some(hit);
        }
        if lookup != concrete {
            if let Some(hit) = self.cache.get(concrete) {
                debug!(key = %concrete, "analysis cache hit behind expired alias");
                self.cache.alias_latest(concrete, hit.clone());
                return Some(hit);
            }
        }
        None
    }

    /// Resolve, download, locate and analyze one artifact, or serve it from
    /// the cache. The analyzer runs at most once per live cache key.
    pub async fn resolve_and_analyze(
        &self,
        request: &ArtifactRequest,
        cancel: &CancellationToken,
    ) -> Result<Arc<AnalysisResult>> {
        let id = require_package_id(&request.package_id)?;
        let artifact = normalize_artifact_name(id, request.artifact_name.as_deref(), false);
        let platform = non_empty(request.platform.as_deref());
        let explicit = non_empty(request.version.as_deref());
        // Reject malformed versions before any registry traffic.
        if let Some(v) = explicit {
            parse_version(v)?;
        }

        let candidates = self.versions(id, cancel).await?;
        let candidate = select_version(id, &candidates, explicit)?;
        let resolved = normalized_version(&candidate.identity.version)?;

        let version_token = if explicit.is_some() { resolved.as_str() } else { LATEST };
        let lookup = ArtifactKey::new(id, version_token, Some(&artifact), platform);
        let concrete = lookup.with_version(&resolved);
        if let Some(hit) = self.cached(&lookup, &concrete) {
            return Ok(hit);
        }
        debug!(key = %lookup, "analysis cache miss");

        let package = self.download(&candidate.identity, cancel).await?;
        let located = locate(
            &self.store,
            &package.identity,
            &package.groups,
            Some(&artifact),
            platform,
            &self.policy,
        )?;
        let result = self.analyze_located(&package.identity, &located, cancel).await?;
        self.cache.put(&concrete, result.clone(), explicit.is_none());
        Ok(result)
    }

    /// Analyze every binary in the selected platform group. Per-file failures
    /// are reported, not propagated; cancellation stops the whole batch.
    pub async fn analyze_all(
        &self,
        package_id: &str,
        version: Option<&str>,
        platform: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<BatchAnalysis> {
        let explicit = non_empty(version);
        let platform = non_empty(platform);
        let resolved = self.resolve_package(package_id, explicit, cancel).await?;
        let identity = resolved.package.identity.clone();
        let (provenance, group) = select_group(&identity, &resolved.package.groups, platform, &self.policy)?;
        if provenance != Provenance::Normal {
            warn!(package = %identity, tier = provenance.label(), "analyzing non-runtime binaries");
        }

        let concrete_version = normalized_version(&identity.version)?;
        let mut artifacts = Vec::new();
        for relative in binaries(group) {
            let name = file_name(relative).to_string();
            let version_token = if explicit.is_some() { concrete_version.as_str() } else { LATEST };
            let lookup = ArtifactKey::new(&identity.id, version_token, Some(&name), platform);
            let concrete = lookup.with_version(&concrete_version);

            let result = match self.cached(&lookup, &concrete) {
                Some(hit) => Ok(hit),
                None => {
                    let located = self.located_in_group(&identity, group, provenance, relative);
                    match self.analyze_located(&identity, &located, cancel).await {
                        Ok(result) => {
                            self.cache.put(&concrete, result.clone(), explicit.is_none());
                            Ok(result)
                        }
                        Err(e @ (AnalysisError::Cancelled { .. } | AnalysisError::TimedOut { .. }))
                            if cancel.is_cancelled() =>
                        {
                            return Err(e)
                        }
                        Err(e) => {
                            debug!(artifact = %name, error = %e, "artifact skipped");
                            Err(e)
                        }
                    }
                }
            };
            artifacts.push(ArtifactOutcome { file_name: name, result });
        }

        Ok(BatchAnalysis {
            identity,
            platform: group.platform.clone(),
            provenance,
            artifacts,
        })
    }

    fn located_in_group(
        &self,
        identity: &PackageIdentity,
        group: &PlatformGroup,
        provenance: Provenance,
        relative: &str,
    ) -> LocatedArtifact {
        LocatedArtifact {
            path: self.store.artifact_path(&identity.id, &identity.version, relative),
            relative_path: relative.to_string(),
            file_name: file_name(relative).to_string(),
            platform: group.platform.clone(),
            provenance,
        }
    }

    /// A previously analyzed artifact, without touching the registry.
    ///
    /// On a miss the error lists what is cached for the package.
    pub fn cached_analysis(
        &self,
        package_id: &str,
        artifact_name: Option<&str>,
        version: Option<&str>,
        platform: Option<&str>,
    ) -> Result<Arc<AnalysisResult>> {
        let id = require_package_id(package_id)?;
        let version_token = match non_empty(version) {
            Some(v) => normalized_version(v)?,
            None => LATEST.to_string(),
        };
        let key = ArtifactKey::new(id, &version_token, artifact_name, non_empty(platform));
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        Err(AnalysisError::CacheMiss {
            cached: self
                .cache
                .list_by_package(id)
                .iter()
                .map(|r| r.identity.clone())
                .collect(),
            key,
        })
    }
}

impl std::fmt::Debug for AnalysisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisService")
            .field("store", &self.store)
            .field("cache", &self.cache)
            .field("policy", &self.policy)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use pkgscope_core::{ErrorKind, ManualClock, SymbolGraphBuilder, TypeKind, TypeNode};
    use pkgscope_registry::{DownloadResult, PackageGroups};

    use crate::analyzer::AnalyzedArtifact;
    use crate::cache::CacheTtl;

    struct FakeRegistry {
        versions: Vec<&'static str>,
        groups: PackageGroups,
        downloads: AtomicUsize,
    }

    impl FakeRegistry {
        fn new(versions: Vec<&'static str>, groups: PackageGroups) -> Arc<Self> {
            Arc::new(FakeRegistry {
                versions,
                groups,
                downloads: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl RegistryClient for FakeRegistry {
        async fn search(&self, _text: &str, _max: usize) -> pkgscope_registry::Result<Vec<PackageSummary>> {
            Ok(Vec::new())
        }

        async fn get_metadata(
            &self,
            id: &str,
            _pre: bool,
        ) -> pkgscope_registry::Result<Vec<PackageVersionCandidate>> {
            if !id.eq_ignore_ascii_case("Demo.Lib") {
                return Ok(Vec::new());
            }
            Ok(self
                .versions
                .iter()
                .map(|v| PackageVersionCandidate::new(PackageIdentity::new("Demo.Lib", *v)))
                .collect())
        }

        async fn download(&self, identity: &PackageIdentity) -> pkgscope_registry::Result<DownloadResult> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            Ok(DownloadResult::available(DownloadedPackage {
                identity: identity.clone(),
                install_dir: PathBuf::from("/store"),
                groups: self.groups.clone(),
            }))
        }
    }

    #[derive(Default)]
    struct CountingAnalyzer {
        calls: AtomicUsize,
        stall: bool,
    }

    #[async_trait]
    impl BinaryAnalyzer for CountingAnalyzer {
        async fn analyze(&self, path: &Path, _docs: Option<&Path>) -> Result<Option<AnalyzedArtifact>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.stall {
                std::future::pending::<()>().await;
            }
            if path.to_string_lossy().contains("Native") {
                return Ok(None);
            }
            let mut b = SymbolGraphBuilder::new();
            b.add_type(TypeNode::new("Demo", "Widget", TypeKind::Class));
            Ok(Some(AnalyzedArtifact {
                graph: b.build(),
                binary_version: Some("2.0.0.0".into()),
                referenced_artifacts: Vec::new(),
            }))
        }
    }

    fn lib_groups() -> PackageGroups {
        PackageGroups {
            lib: vec![
                PlatformGroup::new("net45", vec!["lib/net45/Demo.Lib.dll".into()]),
                PlatformGroup::new(
                    "net8.0",
                    vec![
                        "lib/net8.0/Demo.Lib.dll".into(),
                        "lib/net8.0/Demo.Native.dll".into(),
                        "lib/net8.0/Demo.Lib.xml".into(),
                    ],
                ),
            ],
            ..Default::default()
        }
    }

    fn service(
        registry: Arc<FakeRegistry>,
        analyzer: Arc<CountingAnalyzer>,
        clock: Arc<ManualClock>,
    ) -> AnalysisService {
        let cache = Arc::new(AnalysisCache::new(CacheTtl::default(), clock));
        AnalysisService::new(registry, analyzer, PackageStore::new(PathBuf::from("/store")), cache)
    }

    #[tokio::test]
    async fn analyzer_runs_once_per_key() {
        let registry = FakeRegistry::new(vec!["1.0.0", "2.0.0", "2.1.0-beta"], lib_groups());
        let analyzer = Arc::new(CountingAnalyzer::default());
        let svc = service(registry.clone(), analyzer.clone(), Arc::new(ManualClock::new()));
        let cancel = CancellationToken::new();

        let first = svc.resolve_and_analyze(&ArtifactRequest::new("Demo.Lib"), &cancel).await.unwrap();
        assert_eq!(first.identity.package_version, "2.1.0-beta");
        assert_eq!(first.identity.platform.as_deref(), Some("net45"));

        let again = svc
            .resolve_and_analyze(&ArtifactRequest::new("demo.lib").artifact("DEMO.LIB.DLL"), &cancel)
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let pinned = svc
            .resolve_and_analyze(&ArtifactRequest::new("Demo.Lib").version("2.1.0-beta"), &cancel)
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &pinned));
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.downloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_identical_misses_converge() {
        let registry = FakeRegistry::new(vec!["1.0.0"], lib_groups());
        let analyzer = Arc::new(CountingAnalyzer::default());
        let svc = Arc::new(service(registry, analyzer.clone(), Arc::new(ManualClock::new())));

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let svc = svc.clone();
            tasks.spawn(async move {
                let req = ArtifactRequest::new("Demo.Lib").version("1.0.0");
                svc.resolve_and_analyze(&req, &CancellationToken::new()).await
            });
        }
        let mut identities = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            identities.push(joined.unwrap().unwrap().identity.clone());
        }
        assert_eq!(identities.len(), 8);
        assert!(identities.iter().all(|i| *i == identities[0]));

        let calls = analyzer.calls.load(Ordering::SeqCst);
        assert!((1..=8).contains(&calls));
        let cached = svc.cache().list_by_package("Demo.Lib");
        assert_eq!(cached.len(), 1);
        let hit = svc.cached_analysis("Demo.Lib", None, Some("1.0.0"), None).unwrap();
        assert_eq!(hit.identity, cached[0].identity);
        assert_eq!(hit.identity, identities[0]);

        svc.resolve_and_analyze(&ArtifactRequest::new("Demo.Lib").version("1.0.0"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), calls);
    }

    #[tokio::test]
    async fn expired_alias_falls_back_to_concrete_entry() {
        let registry = FakeRegistry::new(vec!["1.0.0"], lib_groups());
        let analyzer = Arc::new(CountingAnalyzer::default());
        let clock = Arc::new(ManualClock::new());
        let svc = service(registry, analyzer.clone(), clock.clone());
        let cancel = CancellationToken::new();
        let req = ArtifactRequest::new("Demo.Lib");

        svc.resolve_and_analyze(&req, &cancel).await.unwrap();
        clock.advance(Duration::from_secs(45 * 60));
        assert!(svc.cached_analysis("Demo.Lib", None, None, None).is_err());

        svc.resolve_and_analyze(&req, &cancel).await.unwrap();
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 1);
        assert!(svc.cached_analysis("Demo.Lib", None, None, None).is_ok());
    }

    #[tokio::test]
    async fn invalid_or_unknown_versions_fail_without_analysis() {
        let registry = FakeRegistry::new(vec!["1.0.0"], lib_groups());
        let analyzer = Arc::new(CountingAnalyzer::default());
        let svc = service(registry.clone(), analyzer.clone(), Arc::new(ManualClock::new()));
        let cancel = CancellationToken::new();

        let err = svc
            .resolve_and_analyze(&ArtifactRequest::new("Demo.Lib").version("one.two"), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = svc
            .resolve_and_analyze(&ArtifactRequest::new("Demo.Lib").version("9.0.0"), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = svc.resolve_and_analyze(&ArtifactRequest::new("Nope"), &cancel).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Registry(RegistryError::PackageNotFound { .. })));

        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(registry.downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unmanaged_binary_is_not_analyzable() {
        let registry = FakeRegistry::new(vec!["1.0.0"], lib_groups());
        let svc = service(registry, Arc::new(CountingAnalyzer::default()), Arc::new(ManualClock::new()));
        let err = svc
            .resolve_and_analyze(
                &ArtifactRequest::new("Demo.Lib").artifact("Demo.Native").platform("net8.0"),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAnalyzable);
        assert!(svc.cache().list_by_package("Demo.Lib").is_empty());
    }

    #[tokio::test]
    async fn cancellation_leaves_cache_untouched() {
        let registry = FakeRegistry::new(vec!["1.0.0"], lib_groups());
        let analyzer = Arc::new(CountingAnalyzer {
            stall: true,
            ..Default::default()
        });
        let svc = Arc::new(service(registry, analyzer.clone(), Arc::new(ManualClock::new())));
        let cancel = CancellationToken::new();

        let task = {
            let svc = svc.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                svc.resolve_and_analyze(&ArtifactRequest::new("Demo.Lib"), &cancel).await
            })
        };
        while analyzer.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        cancel.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, AnalysisError::Cancelled { operation: "analysis" }));
        assert!(svc.cache().list_by_package("Demo.Lib").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_analysis_times_out() {
        let registry = FakeRegistry::new(vec!["1.0.0"], lib_groups());
        let analyzer = Arc::new(CountingAnalyzer {
            stall: true,
            ..Default::default()
        });
        let svc = service(registry, analyzer, Arc::new(ManualClock::new())).with_timeouts(Timeouts {
            analysis: Duration::from_secs(5),
            ..Default::default()
        });
        let err = svc
            .resolve_and_analyze(&ArtifactRequest::new("Demo.Lib"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::TimedOut { operation: "analysis", .. }));
    }

    #[tokio::test]
    async fn analyze_all_reports_each_binary() {
        let registry = FakeRegistry::new(vec!["1.0.0"], lib_groups());
        let analyzer = Arc::new(CountingAnalyzer::default());
        let svc = service(registry, analyzer.clone(), Arc::new(ManualClock::new()));
        let cancel = CancellationToken::new();

        let batch = svc.analyze_all("Demo.Lib", None, Some("net8.0"), &cancel).await.unwrap();
        assert_eq!(batch.platform, "net8.0");
        assert_eq!(batch.provenance, Provenance::Normal);
        let names: Vec<_> = batch.artifacts.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(names, vec!["Demo.Lib.dll", "Demo.Native.dll"]);
        assert!(batch.artifacts[0].result.is_ok());
        assert_eq!(
            batch.artifacts[1].result.as_ref().unwrap_err().kind(),
            ErrorKind::NotAnalyzable
        );

        let hit = svc.cached_analysis("Demo.Lib", Some("Demo.Lib"), None, Some("net8.0")).unwrap();
        assert_eq!(hit.identity.platform.as_deref(), Some("net8.0"));

        svc.analyze_all("Demo.Lib", None, Some("net8.0"), &cancel).await.unwrap();
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cache_miss_lists_cached_artifacts() {
        let registry = FakeRegistry::new(vec!["1.0.0"], lib_groups());
        let svc = service(registry, Arc::new(CountingAnalyzer::default()), Arc::new(ManualClock::new()));
        svc.resolve_and_analyze(&ArtifactRequest::new("Demo.Lib").version("1.0"), &CancellationToken::new())
            .await
            .unwrap();

        assert!(svc.cached_analysis("demo.lib", None, Some("1.0.0"), None).is_ok());
        match svc.cached_analysis("Demo.Lib", None, Some("2.0.0"), None) {
            Err(AnalysisError::CacheMiss { key, cached }) => {
                assert_eq!(key.version(), "2.0.0");
                assert_eq!(cached.len(), 1);
                assert_eq!(cached[0].package_version, "1.0.0");
            }
            other => panic!("expected cache miss, got {other:?}"),
        }
    }
}
