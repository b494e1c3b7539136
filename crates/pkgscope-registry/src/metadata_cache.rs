//! Short-lived cache of registry version listings.
//!
//! Version lists change rarely and tolerate some staleness, so a decorator
//! keeps each `(package id, include prerelease)` answer for a fixed window.
//! Search and download always go to the wrapped client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pkgscope_core::{Clock, ExpiringMap};
use tracing::debug;

use crate::client::{
    DownloadResult, PackageIdentity, PackageSummary, PackageVersionCandidate, RegistryClient,
};
use crate::error::Result;

/// Registry client that memoizes [`RegistryClient::get_metadata`].
pub struct CachingRegistry {
    inner: Arc<dyn RegistryClient>,
    metadata: ExpiringMap<(String, bool), Arc<Vec<PackageVersionCandidate>>>,
    ttl: Duration,
}

impl CachingRegistry {
    pub fn new(inner: Arc<dyn RegistryClient>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        CachingRegistry {
            inner,
            metadata: ExpiringMap::new(clock),
            ttl,
        }
    }
}

#[async_trait]
impl RegistryClient for CachingRegistry {
    async fn search(&self, text: &str, max_results: usize) -> Result<Vec<PackageSummary>> {
        self.inner.search(text, max_results).await
    }

    async fn get_metadata(
        &self,
        id: &str,
        include_prerelease: bool,
    ) -> Result<Vec<PackageVersionCandidate>> {
        let key = (id.to_lowercase(), include_prerelease);
        if let Some(hit) = self.metadata.get(&key) {
            debug!(package = id, "metadata cache hit");
            return Ok(hit.as_ref().clone());
        }

        let fresh = self.inner.get_metadata(id, include_prerelease).await?;
        // Empty answers are not cached so a newly published package shows up at once.
        if !fresh.is_empty() {
            self.metadata.insert(key, Arc::new(fresh.clone()), self.ttl);
        }
        Ok(fresh)
    }

    async fn download(&self, identity: &PackageIdentity) -> Result<DownloadResult> {
        self.inner.download(identity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pkgscope_core::ManualClock;

    use crate::client::DownloadStatus;

    #[derive(Default)]
    struct CountingRegistry {
        metadata_calls: AtomicUsize,
    }

    #[async_trait]
    impl RegistryClient for CountingRegistry {
        async fn search(&self, _text: &str, _max: usize) -> Result<Vec<PackageSummary>> {
            Ok(Vec::new())
        }

        async fn get_metadata(&self, id: &str, _pre: bool) -> Result<Vec<PackageVersionCandidate>> {
            self.metadata_calls.fetch_add(1, Ordering::SeqCst);
            if id == "missing" {
                return Ok(Vec::new());
            }
            Ok(vec![PackageVersionCandidate::new(PackageIdentity::new(id, "1.0.0"))])
        }

        async fn download(&self, _identity: &PackageIdentity) -> Result<DownloadResult> {
            Ok(DownloadResult::unavailable(DownloadStatus::NotFound))
        }
    }

    #[tokio::test]
    async fn metadata_served_from_cache_until_expiry() {
        let inner = Arc::new(CountingRegistry::default());
        let clock = Arc::new(ManualClock::new());
        let reg = CachingRegistry::new(inner.clone(), Duration::from_secs(60), clock.clone());

        reg.get_metadata("Foo", true).await.unwrap();
        reg.get_metadata("foo", true).await.unwrap();
        assert_eq!(inner.metadata_calls.load(Ordering::SeqCst), 1);

        reg.get_metadata("Foo", false).await.unwrap();
        assert_eq!(inner.metadata_calls.load(Ordering::SeqCst), 2);

        clock.advance(Duration::from_secs(61));
        reg.get_metadata("Foo", true).await.unwrap();
        assert_eq!(inner.metadata_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_listing_not_cached() {
        let inner = Arc::new(CountingRegistry::default());
        let reg = CachingRegistry::new(inner.clone(), Duration::from_secs(60), Arc::new(ManualClock::new()));
        reg.get_metadata("missing", true).await.unwrap();
        reg.get_metadata("missing", true).await.unwrap();
        assert_eq!(inner.metadata_calls.load(Ordering::SeqCst), 2);
    }
}
