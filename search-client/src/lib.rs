pub mod aggregator;
pub mod cache;
pub mod client;
pub mod coordinator;
pub mod deduplication;
mod error;
pub mod record;
pub mod sweep;

#[cfg(test)]
mod tests;

use aggregator::Aggregator;
use cache::{CacheConfig, SearchCache, Sweep};
use client::surf_transport::SurfTransport;
use client::{FetchConfig, PageFetcher, Transport};
use coordinator::{Coordinator, SharedCoordinator};
use deduplication::{DeduplicationConfig, DeduplicationStats};
use std::sync::Arc;
use std::time::Duration;
use sweep::SweepHandle;

pub use cache::{CacheStats, CachedResult, InsertionStatus};
pub use error::{Error, ErrorKind, Result};
pub use record::album::Album;
pub use record::artist::Artist;
pub use record::track::Track;
pub use record::{SearchKind, Searchable};

/// Everything needed to build a [`SearchClient`].
#[derive(Clone, Debug, Default)]
pub struct SearchConfig {
    pub cache: CacheConfig,
    pub fetch: FetchConfig,
    pub deduplication: DeduplicationConfig,
    /// Upper bound on how long a cache miss waits for the upstream
    pub fetch_timeout: Option<Duration>,
}

/// Cached, paginated search over the upstream API.
#[derive(Clone)]
pub struct SearchClient {
    aggregator: Aggregator,
    tracks: SharedCoordinator<Track>,
    albums: SharedCoordinator<Album>,
    sweep_interval: chrono::Duration,
}

/// Picks the coordinator responsible for a record type.
pub trait Routed: Searchable {
    fn coordinator(client: &SearchClient) -> &Coordinator<Self>;
}

impl Routed for Track {
    fn coordinator(client: &SearchClient) -> &Coordinator<Self> {
        &client.tracks
    }
}

impl Routed for Album {
    fn coordinator(client: &SearchClient) -> &Coordinator<Self> {
        &client.albums
    }
}

fn coordinator<T>(config: &SearchConfig) -> Coordinator<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    Coordinator::new(
        Arc::new(SearchCache::new(config.cache.clone())),
        config.deduplication.clone(),
        config.fetch_timeout,
    )
}

impl SearchClient {
    /// Create a client that talks to the upstream over surf with `access_token`
    pub fn new(access_token: &str, config: SearchConfig) -> Result<Self> {
        Self::with_transport(Arc::new(SurfTransport::new(access_token)), config)
    }

    /// Create a client on top of any transport
    pub fn with_transport(transport: Arc<dyn Transport>, config: SearchConfig) -> Result<Self> {
        let fetcher = PageFetcher::new(transport, config.fetch.clone())?;

        Ok(Self {
            aggregator: Aggregator::new(fetcher),
            tracks: Arc::new(coordinator(&config)),
            albums: Arc::new(coordinator(&config)),
            sweep_interval: config.cache.sweep_interval,
        })
    }

    /// Search for records of type `T`, serving from cache when possible
    pub async fn search<T: Routed>(&self, query: &str) -> Result<Vec<T>> {
        if query.trim().is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidQuery,
                "query must not be empty",
            ));
        }

        T::coordinator(self)
            .get_or_fetch(query, || self.aggregator.fetch_all::<T>(query))
            .await
    }

    pub async fn search_tracks(&self, query: &str) -> Result<Vec<Track>> {
        self.search::<Track>(query).await
    }

    pub async fn search_albums(&self, query: &str) -> Result<Vec<Album>> {
        self.search::<Album>(query).await
    }

    /// Start the background sweep over every cache this client owns
    pub fn start_sweep(&self) -> SweepHandle {
        let interval = self
            .sweep_interval
            .to_std()
            .unwrap_or(Duration::from_secs(1));
        let caches = vec![
            self.tracks.shared_cache() as Arc<dyn Sweep>,
            self.albums.shared_cache() as Arc<dyn Sweep>,
        ];
        SweepHandle::spawn(caches, interval)
    }

    /// Evict expired cache entries now, returning how many were removed
    pub fn evict_expired_cache(&self) -> usize {
        self.tracks.cache().sweep() + self.albums.cache().sweep()
    }

    /// Drop a cached query for record type `T`
    pub fn invalidate<T: Routed>(&self, query: &str) -> bool {
        T::coordinator(self).cache().remove(query)
    }

    /// Clear every cache
    pub fn clear_cache(&self) {
        self.tracks.cache().clear();
        self.albums.cache().clear();
    }

    /// Combined statistics over every cache
    pub fn cache_stats(&self) -> CacheStats {
        self.tracks.cache().stats() + self.albums.cache().stats()
    }

    pub fn deduplication_stats(&self) -> DeduplicationStats {
        let tracks = self.tracks.deduplicator().stats();
        let albums = self.albums.deduplicator().stats();
        DeduplicationStats {
            pending_requests: tracks.pending_requests + albums.pending_requests,
            total_waiters: tracks.total_waiters + albums.total_waiters,
        }
    }
}
