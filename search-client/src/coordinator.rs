use crate::cache::{InsertionStatus, SearchCache, SharedSearchCache};
use crate::deduplication::{DeduplicationConfig, RequestDeduplicator};
use crate::error::{Error, ErrorKind, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Serves results from the cache and falls back to a fetch on a miss.
pub struct Coordinator<T> {
    cache: SharedSearchCache<T>,
    deduplicator: RequestDeduplicator<T>,
    fetch_timeout: Option<Duration>,
}

impl<T> Coordinator<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(
        cache: SharedSearchCache<T>,
        deduplication: DeduplicationConfig,
        fetch_timeout: Option<Duration>,
    ) -> Self {
        let deduplication = DeduplicationConfig {
            request_timeout: waiter_timeout(deduplication.request_timeout, fetch_timeout),
            ..deduplication
        };

        Self {
            cache,
            deduplicator: RequestDeduplicator::new(deduplication),
            fetch_timeout,
        }
    }

    pub fn cache(&self) -> &SearchCache<T> {
        &self.cache
    }

    pub fn shared_cache(&self) -> SharedSearchCache<T> {
        self.cache.clone()
    }

    pub fn deduplicator(&self) -> &RequestDeduplicator<T> {
        &self.deduplicator
    }

    /// Return the cached items for `key`, or run `fetch` and cache what it returns.
    ///
    /// Concurrent misses for the same key share one `fetch`. Nothing is cached
    /// when `fetch` fails or runs past the fetch timeout.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<Vec<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        if let Some(cached) = self.cache.lookup(key) {
            log::info!("Returning cached result for query: {}", key);
            return Ok(cached);
        }

        self.deduplicator
            .execute(key, || async {
                // Another request may have filled the entry while we queued up.
                if let Some(cached) = self.cache.lookup(key) {
                    return Ok(cached);
                }

                let items = self.fetch_with_timeout(key, fetch).await?;
                if self.cache.upsert(key, items.clone()) != InsertionStatus::Unchanged {
                    log::info!("Cached {} results for query: {}", items.len(), key);
                }
                Ok(items)
            })
            .await
    }

    async fn fetch_with_timeout<F, Fut>(&self, key: &str, fetch: F) -> Result<Vec<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch()).await.map_err(|_| {
                log::warn!("Fetch for query {:?} exceeded {:?}", key, limit);
                Error::new(
                    ErrorKind::Timeout,
                    format!("fetching {:?} took longer than {:?}", key, limit),
                )
            })?,
            None => fetch().await,
        }
    }
}

/// How long a caller may wait on another caller's fetch.
///
/// Without a fetch timeout the leader's fetch is unbounded, so waiters wait for
/// it too. With one, a configured wait is never shorter than the fetch it waits on.
fn waiter_timeout(
    configured: Option<chrono::Duration>,
    fetch_timeout: Option<Duration>,
) -> Option<chrono::Duration> {
    let fetch_limit = chrono::Duration::from_std(fetch_timeout?).ok()?;
    configured.map(|wait| wait.max(fetch_limit))
}

/// Thread-safe wrapper for a coordinator
pub type SharedCoordinator<T> = Arc<Coordinator<T>>;
