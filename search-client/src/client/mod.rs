pub mod surf_transport;

use crate::error::{Error, ErrorKind, Result};
use crate::record::Searchable;
use async_trait::async_trait;
use getset::{CopyGetters, Getters};
use serde::Deserialize;
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "https://api.spotify.com/v1/search";
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_MAX_CONCURRENT_PAGES: usize = 4;

/// Raw answer to a GET request.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct TransportResponse {
    #[getset(get_copy = "pub")]
    status: u16,
    #[getset(get = "pub")]
    body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// An already-authenticated way to issue GET requests upstream.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<TransportResponse>;
}

/// Where and how pages are requested.
#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub base_url: String,
    /// Items per upstream page, sent as `limit`
    pub page_size: usize,
    /// Upper bound on page requests in flight for one query
    pub max_concurrent_pages: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            max_concurrent_pages: DEFAULT_MAX_CONCURRENT_PAGES,
        }
    }
}

impl FetchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                "page_size must be at least 1",
            ));
        }
        if self.max_concurrent_pages == 0 {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                "max_concurrent_pages must be at least 1",
            ));
        }
        Ok(())
    }
}

/// One page of search results.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct Page<T> {
    #[getset(get = "pub")]
    items: Vec<T>,
    /// Total number of results the upstream reports for the query
    #[getset(get_copy = "pub")]
    total: usize,
    #[getset(get_copy = "pub")]
    offset: usize,
}

impl<T> Page<T> {
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

#[derive(Deserialize)]
struct PageBody<T> {
    total: usize,
    items: Vec<T>,
}

/// Fetches single pages of search results.
#[derive(Clone)]
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    config: FetchConfig,
}

impl PageFetcher {
    pub fn new(transport: Arc<dyn Transport>, config: FetchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    pub fn max_concurrent_pages(&self) -> usize {
        self.config.max_concurrent_pages
    }

    pub fn page_url<T: Searchable>(&self, query: &str, offset: usize) -> String {
        format!(
            "{}?q={}&type={}&limit={}&offset={}",
            self.config.base_url,
            urlencoding::encode(query),
            T::KIND,
            self.config.page_size,
            offset
        )
    }

    /// Fetch the page of `T` results for `query` starting at `offset`.
    pub async fn fetch_page<T: Searchable>(&self, query: &str, offset: usize) -> Result<Page<T>> {
        if query.trim().is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidQuery,
                "query must not be empty",
            ));
        }

        log::debug!(
            "Fetching {} page for {:?} at offset {}",
            T::KIND,
            query,
            offset
        );
        let response = self.transport.get(&self.page_url::<T>(query, offset)).await?;
        if !response.is_success() {
            return Err(Error::bad_status(response.status(), response.body()));
        }

        let page = decode_page::<T>(response.body())?;
        Ok(Page {
            items: page.items,
            total: page.total,
            offset,
        })
    }
}

fn decode_page<T: Searchable>(body: &[u8]) -> Result<PageBody<T>> {
    let mut root: serde_json::Value = serde_json::from_slice(body).map_err(Error::decode)?;
    let collection = T::KIND.collection();
    let wrapped = root
        .get_mut(collection.as_str())
        .map(serde_json::Value::take)
        .ok_or_else(|| Error::decode(format!("response has no {:?} object", collection)))?;

    serde_json::from_value(wrapped).map_err(Error::decode)
}
