//! Fan-out over result pages
//!
//! The first page tells us how many results exist; every remaining page is
//! fetched by its own tokio task, with a semaphore capping how many are in
//! flight at once. Each task hands back its page through its join handle, so
//! merging needs no shared buffer.

use crate::client::{Page, PageFetcher};
use crate::error::{Error, ErrorKind, Result};
use crate::record::Searchable;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Offsets of the pages still needed after the first one.
pub fn remaining_offsets(total: usize, page_size: usize) -> Vec<usize> {
    if total <= page_size {
        return vec![];
    }
    let extra_pages = (total - page_size).div_ceil(page_size);
    (1..=extra_pages).map(|page| page * page_size).collect()
}

#[derive(Clone)]
pub struct Aggregator {
    fetcher: PageFetcher,
}

impl Aggregator {
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }

    /// Fetch every result for `query`.
    ///
    /// The total is read once, from the first page. If any later page fails
    /// the whole call fails with the first error seen, but only after all
    /// dispatched pages have finished.
    pub async fn fetch_all<T: Searchable>(&self, query: &str) -> Result<Vec<T>> {
        let first = self.fetcher.fetch_page::<T>(query, 0).await?;
        let offsets = remaining_offsets(first.total(), self.fetcher.page_size());
        if offsets.is_empty() {
            return Ok(first.into_items());
        }

        log::debug!(
            "{:?} has {} {} results, fetching {} more pages",
            query,
            first.total(),
            T::KIND,
            offsets.len()
        );

        let limit = Arc::new(Semaphore::new(self.fetcher.max_concurrent_pages()));
        let query: Arc<str> = Arc::from(query);
        let jobs = offsets.into_iter().map(|offset| {
            let fetcher = self.fetcher.clone();
            let limit = limit.clone();
            let query = query.clone();
            tokio::spawn(async move {
                let _permit = limit
                    .acquire_owned()
                    .await
                    .map_err(|err| Error::new(ErrorKind::Task, err.to_string()))?;
                fetcher.fetch_page::<T>(&query, offset).await
            })
        });
        let finished = join_all(jobs).await;

        let mut items = first.into_items();
        let mut first_error = None;
        for outcome in finished {
            match outcome {
                Ok(Ok(page)) => items.extend(Page::into_items(page)),
                Ok(Err(err)) => {
                    log::warn!("Page fetch for {:?} failed: {}", query, err);
                    first_error.get_or_insert(err);
                }
                Err(join_err) => {
                    log::warn!("Page task for {:?} did not finish: {}", query, join_err);
                    first_error.get_or_insert(Error::new(ErrorKind::Task, join_err.to_string()));
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(items),
        }
    }
}
