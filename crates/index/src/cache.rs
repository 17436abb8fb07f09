//! Single-flight index cache.
//!
//! Index construction is expensive (one embedding call per batch plus PDF
//! parsing), so built indices are memoized per collection and credential.
//! Concurrent requests for the same key share one in-flight build instead
//! of racing.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use paperchat_core::AppResult;
use tokio::sync::{Mutex, OnceCell};

/// Key for one cached index build.
///
/// The credential is folded into the key as a fingerprint so a credential
/// change produces a fresh build without storing the secret itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    collection: String,
    credential_fingerprint: u64,
}

impl CacheKey {
    /// Build a key from the collection name and the active credential.
    pub fn new(collection: &str, credential: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        credential.hash(&mut hasher);
        Self {
            collection: collection.to_string(),
            credential_fingerprint: hasher.finish(),
        }
    }

    /// Collection this key belongs to.
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

/// Memoizing cache with single-flight build semantics.
///
/// Each key owns a `OnceCell`; the first caller runs the build closure and
/// every concurrent caller awaits the same cell. A failed build leaves the
/// cell empty, so the next call retries instead of caching the error.
pub struct IndexCache<T> {
    cells: Mutex<HashMap<CacheKey, Arc<OnceCell<Arc<T>>>>>,
}

impl<T> IndexCache<T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key`, building it if absent.
    pub async fn get_or_build<F, Fut>(&self, key: &CacheKey, build: F) -> AppResult<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Arc<T>>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let value = cell.get_or_try_init(build).await?;
        Ok(Arc::clone(value))
    }

    /// Drop the cached entry for `key`, forcing the next call to rebuild.
    pub async fn invalidate(&self, key: &CacheKey) {
        let mut cells = self.cells.lock().await;
        if cells.remove(key).is_some() {
            tracing::info!(collection = %key.collection, "Invalidated cached index");
        }
    }

    /// Drop every cached entry.
    pub async fn clear(&self) {
        let mut cells = self.cells.lock().await;
        cells.clear();
    }
}

impl<T> Default for IndexCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperchat_core::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_cache_key_fingerprints_credential() {
        let a = CacheKey::new("doc", "sk-one");
        let b = CacheKey::new("doc", "sk-two");
        let c = CacheKey::new("doc", "sk-one");

        assert_ne!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.collection(), "doc");
    }

    #[tokio::test]
    async fn test_build_runs_once_per_key() {
        let cache = IndexCache::<String>::new();
        let key = CacheKey::new("doc", "sk-test");
        let builds = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_build(&key, || async {
                    builds.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new("built".to_string()))
                })
                .await
                .unwrap();
            assert_eq!(*value, "built");
        }

        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_build() {
        let cache = Arc::new(IndexCache::<String>::new());
        let key = CacheKey::new("doc", "sk-test");
        let builds = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let key = key.clone();
                let builds = Arc::clone(&builds);
                tokio::spawn(async move {
                    cache
                        .get_or_build(&key, || async move {
                            builds.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(Arc::new("shared".to_string()))
                        })
                        .await
                        .unwrap()
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(*task.await.unwrap(), "shared");
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_rebuild() {
        let cache = IndexCache::<String>::new();
        let key = CacheKey::new("doc", "sk-test");
        let builds = AtomicUsize::new(0);

        let build = || {
            builds.fetch_add(1, Ordering::SeqCst);
            async { Ok(Arc::new("v".to_string())) }
        };

        cache.get_or_build(&key, build).await.unwrap();
        cache.invalidate(&key).await;
        cache.get_or_build(&key, build).await.unwrap();

        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_build_is_not_cached() {
        let cache = IndexCache::<String>::new();
        let key = CacheKey::new("doc", "sk-test");
        let attempts = AtomicUsize::new(0);

        let first = cache
            .get_or_build(&key, || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<Arc<String>, _>(AppError::IndexBuild("boom".to_string()))
            })
            .await;
        assert!(first.is_err());

        let second = cache
            .get_or_build(&key, || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new("recovered".to_string()))
            })
            .await
            .unwrap();

        assert_eq!(*second, "recovered");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_distinct_credentials_build_separately() {
        let cache = IndexCache::<String>::new();
        let builds = AtomicUsize::new(0);

        for credential in ["sk-a", "sk-b"] {
            let key = CacheKey::new("doc", credential);
            cache
                .get_or_build(&key, || async {
                    builds.fetch_add(1, Ordering::SeqCst);
                    Ok(Arc::new(credential.to_string()))
                })
                .await
                .unwrap();
        }

        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }
}
