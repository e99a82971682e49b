use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for the cache system
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// How long an entry stays eligible for lookup before the sweep drops it
    pub ttl: Duration,
    /// How often the background sweep scans for expired entries
    pub sweep_interval: Duration,
    /// Maximum number of cached entries
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(90),
            sweep_interval: Duration::minutes(10),
            max_entries: 1000,
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration
    pub fn new(ttl: Duration, max_entries: usize, sweep_interval: Duration) -> Self {
        Self {
            ttl,
            sweep_interval,
            max_entries,
        }
    }
}

/// Cached search result with metadata
#[derive(Clone, Debug)]
pub struct CachedResult<T> {
    pub data: Vec<T>,
    pub created_at: DateTime<Utc>,
}

impl<T> CachedResult<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            data,
            created_at: Utc::now(),
        }
    }

    /// Check if the cached result is older than `ttl` at `now`
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.created_at < now - ttl
    }
}

/// Outcome of [`SearchCache::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum InsertionStatus {
    Inserted,
    Updated,
    Unchanged,
}

/// In-memory cache implementation using DashMap for thread safety
///
/// Every operation locks at most one shard for the duration of a single
/// entry, so lookups and upserts never wait on a full scan.
pub struct SearchCache<T> {
    cache: DashMap<String, CachedResult<T>>,
    pub config: CacheConfig,
}

impl<T> SearchCache<T>
where
    T: Clone + PartialEq,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            cache: DashMap::new(),
            config,
        }
    }

    /// Get the cached items for `key`.
    ///
    /// Expiry is left to the sweep, so an entry past its TTL is still
    /// returned until the next sweep removes it.
    pub fn lookup(&self, key: &str) -> Option<Vec<T>> {
        match self.cache.get(key) {
            Some(cached) => {
                log::debug!("Cache hit for key: {:?}", key);
                Some(cached.data.clone())
            }
            None => {
                log::debug!("Cache miss for key: {:?}", key);
                None
            }
        }
    }

    /// Store `data` under `key`, replacing any previous entry wholesale.
    ///
    /// An existing entry with element-wise equal items is left untouched,
    /// keeping its original timestamp.
    pub fn upsert(&self, key: &str, data: Vec<T>) -> InsertionStatus {
        // Make room before taking the entry lock: eviction touches other shards.
        if !self.cache.contains_key(key) && self.cache.len() >= self.config.max_entries {
            self.evict_expired();

            if self.cache.len() >= self.config.max_entries {
                self.evict_oldest();
            }
        }

        match self.cache.entry(key.to_owned()) {
            Entry::Occupied(mut entry) => {
                if entry.get().data == data {
                    log::debug!("No changes for cached key: {:?}", key);
                    InsertionStatus::Unchanged
                } else {
                    entry.insert(CachedResult::new(data));
                    log::debug!("Updated cache entry for key: {:?}", key);
                    InsertionStatus::Updated
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(CachedResult::new(data));
                log::debug!("Stored in cache with key: {:?}", key);
                InsertionStatus::Inserted
            }
        }
    }

    /// Remove the entry for `key`, returning whether one existed
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.cache.remove(key).is_some();
        if removed {
            log::debug!("Removed cache entry for key: {:?}", key);
        }
        removed
    }

    /// Remove expired entries from cache, returning how many were dropped
    pub fn evict_expired(&self) -> usize {
        let ttl = self.config.ttl;
        let now = Utc::now();
        let expired_keys: Vec<_> = self
            .cache
            .iter()
            .filter(|entry| entry.value().is_expired(ttl, now))
            .map(|entry| entry.key().clone())
            .collect();

        // Re-check under the entry lock: the key may have been refreshed since the scan.
        let expired_count = expired_keys
            .into_iter()
            .filter(|key| {
                self.cache
                    .remove_if(key, |_, cached| cached.is_expired(ttl, now))
                    .is_some()
            })
            .count();

        log::debug!("Evicted {} expired cache entries", expired_count);
        expired_count
    }

    /// Remove oldest entries when at capacity
    fn evict_oldest(&self) {
        let mut entries: Vec<_> = self
            .cache
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().created_at))
            .collect();

        // Sort by creation time (oldest first)
        entries.sort_by_key(|(_, created_at)| *created_at);

        // Remove oldest 25% of entries
        let to_remove = (self.config.max_entries / 4).max(1);
        for (key, _) in entries.into_iter().take(to_remove) {
            self.cache.remove(&key);
        }

        log::debug!("Evicted {} oldest cache entries", to_remove);
    }

    /// Clear all cache entries
    pub fn clear(&self) {
        self.cache.clear();
        log::info!("Cache cleared");
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let ttl = self.config.ttl;
        let now = Utc::now();
        let total_entries = self.cache.len();
        let expired_entries = self
            .cache
            .iter()
            .filter(|entry| entry.value().is_expired(ttl, now))
            .count();

        CacheStats {
            total_entries,
            valid_entries: total_entries.saturating_sub(expired_entries),
            expired_entries,
            max_entries: self.config.max_entries,
        }
    }
}

/// Anything the background sweep can scan.
pub trait Sweep: Send + Sync {
    /// Drop expired entries, returning how many were removed
    fn sweep(&self) -> usize;
}

impl<T> Sweep for SearchCache<T>
where
    T: Clone + PartialEq + Send + Sync,
{
    fn sweep(&self) -> usize {
        self.evict_expired()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub max_entries: usize,
}

impl std::ops::Add for CacheStats {
    type Output = CacheStats;

    fn add(self, other: CacheStats) -> CacheStats {
        CacheStats {
            total_entries: self.total_entries + other.total_entries,
            valid_entries: self.valid_entries + other.valid_entries,
            expired_entries: self.expired_entries + other.expired_entries,
            max_entries: self.max_entries + other.max_entries,
        }
    }
}

/// Thread-safe wrapper for the cache
pub type SharedSearchCache<T> = Arc<SearchCache<T>>;
