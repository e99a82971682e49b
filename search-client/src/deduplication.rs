use crate::error::{Error, ErrorKind, Result};
use chrono::Duration;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Configuration for request deduplication
#[derive(Clone, Debug)]
pub struct DeduplicationConfig {
    /// How long a caller waits on someone else's request before giving up.
    /// `None` waits until that request finishes.
    pub request_timeout: Option<Duration>,
    /// Whether deduplication is enabled
    pub enabled: bool,
}

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self {
            request_timeout: None,
            enabled: true,
        }
    }
}

type Flight<T> = broadcast::Sender<Result<Vec<T>>>;

/// Request deduplication system
/// When multiple identical requests come in, only the first one is executed
/// and the results are shared with all waiting requests
pub struct RequestDeduplicator<T> {
    /// Map of keys to the channel their result will be published on
    pending: DashMap<String, Flight<T>>,
    config: DeduplicationConfig,
}

/// Removes the pending entry when the executing request finishes or is dropped.
/// Dropping the last sender wakes every waiter with a closed channel.
struct FlightGuard<'a, T> {
    pending: &'a DashMap<String, Flight<T>>,
    key: &'a str,
    sender: Flight<T>,
}

impl<T> FlightGuard<'_, T> {
    /// Remove the entry only if it is still this flight's; after `clear` the
    /// key may belong to a newer request.
    fn release(&self) -> bool {
        self.pending
            .remove_if(self.key, |_, sender| sender.same_channel(&self.sender))
            .is_some()
    }

    fn complete(self, result: &Result<Vec<T>>)
    where
        T: Clone,
    {
        self.release();
        let waiters = self.sender.receiver_count();
        if waiters > 0 {
            log::debug!("Notifying {} waiters for key: {:?}", waiters, self.key);
            let _ = self.sender.send(result.clone());
        }
    }
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        if self.release() {
            log::warn!("Request for key {:?} was dropped before finishing", self.key);
        }
    }
}

impl<T> RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(config: DeduplicationConfig) -> Self {
        Self {
            pending: DashMap::new(),
            config,
        }
    }

    /// Execute a search operation with deduplication
    /// If the same search is already in progress, wait for its result
    /// Otherwise, execute the search and notify all waiting requests
    pub async fn execute<F, Fut>(&self, key: &str, search_fn: F) -> Result<Vec<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        if !self.config.enabled {
            return search_fn().await;
        }

        // Registering and subscribing both happen under the entry's shard lock,
        // so a waiter can never miss the result.
        let sender = match self.pending.entry(key.to_owned()) {
            Entry::Occupied(entry) => {
                let receiver = entry.get().subscribe();
                drop(entry);
                log::debug!("Request already pending for key: {:?}", key);
                return self.wait(key, receiver).await;
            }
            Entry::Vacant(entry) => {
                let (sender, _) = broadcast::channel(1);
                entry.insert(sender.clone());
                sender
            }
        };

        log::debug!("Executing new request for key: {:?}", key);
        let guard = FlightGuard {
            pending: &self.pending,
            key,
            sender,
        };
        let result = search_fn().await;
        guard.complete(&result);

        result
    }

    async fn wait(
        &self,
        key: &str,
        mut receiver: broadcast::Receiver<Result<Vec<T>>>,
    ) -> Result<Vec<T>> {
        let received = match self.config.request_timeout {
            Some(limit) => {
                let limit = limit.to_std().unwrap_or(std::time::Duration::ZERO);
                tokio::time::timeout(limit, receiver.recv())
                    .await
                    .map_err(|_| {
                        log::warn!("Request timeout for key: {:?}", key);
                        Error::new(
                            ErrorKind::Timeout,
                            format!("timed out waiting for pending request for {:?}", key),
                        )
                    })?
            }
            None => receiver.recv().await,
        };

        match received {
            Ok(result) => {
                log::debug!("Received deduplicated result for key: {:?}", key);
                result
            }
            Err(_) => {
                log::warn!("Pending request for key {:?} went away", key);
                Err(Error::new(
                    ErrorKind::Abandoned,
                    format!("pending request for {:?} was abandoned", key),
                ))
            }
        }
    }

    /// Get statistics about pending requests
    pub fn stats(&self) -> DeduplicationStats {
        let pending_requests = self.pending.len();
        let total_waiters = self
            .pending
            .iter()
            .map(|entry| entry.value().receiver_count())
            .sum();

        DeduplicationStats {
            pending_requests,
            total_waiters,
        }
    }

    /// Forget all pending requests. Running requests still answer their own
    /// waiters; new callers start fresh requests.
    pub fn clear(&self) {
        self.pending.clear();
        log::info!("Request deduplicator cleared");
    }
}

/// Statistics for request deduplication
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeduplicationStats {
    pub pending_requests: usize,
    pub total_waiters: usize,
}

/// Thread-safe wrapper for the deduplicator
pub type SharedRequestDeduplicator<T> = Arc<RequestDeduplicator<T>>;
