use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use getset::{CopyGetters, Getters};
use search_client::cache::CacheConfig;
use search_client::client::{FetchConfig, DEFAULT_BASE_URL};
use search_client::deduplication::DeduplicationConfig;
use search_client::SearchConfig;
use serde::Deserialize;
use serde_inline_default::serde_inline_default;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[serde_inline_default]
#[derive(Debug, Clone, Deserialize, Getters, CopyGetters)]
pub struct Config {
    /// Bearer token for the upstream API, acquired out of band
    #[getset(get = "pub")]
    #[serde(default)]
    access_token: String,
    #[getset(get = "pub")]
    #[serde_inline_default(DEFAULT_BASE_URL.to_string())]
    base_url: String,
    #[getset(get_copy = "pub")]
    #[serde_inline_default(50)]
    page_size: usize,
    #[getset(get_copy = "pub")]
    #[serde_inline_default(4)]
    max_concurrent_pages: usize,
    #[getset(get_copy = "pub")]
    #[serde_inline_default(5400)]
    cache_ttl_secs: u64,
    #[getset(get_copy = "pub")]
    #[serde_inline_default(600)]
    sweep_interval_secs: u64,
    #[getset(get_copy = "pub")]
    #[serde_inline_default(1000)]
    max_cache_entries: usize,
    #[getset(get_copy = "pub")]
    #[serde(default)]
    fetch_timeout_secs: Option<u64>,
    #[getset(get_copy = "pub")]
    #[serde_inline_default(true)]
    deduplication: bool,
    /// How long a duplicate search waits on the one already running.
    /// Unset waits for it to finish; never shorter than `fetch_timeout_secs`.
    #[getset(get_copy = "pub")]
    #[serde(default)]
    dedup_wait_timeout_secs: Option<u64>,
    #[getset(get_copy = "pub")]
    #[serde_inline_default(LogLevel::Info)]
    log_level: LogLevel,
}

impl Config {
    /// Read `path` (if it exists) and overlay `SEARCH_*` environment variables.
    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(path).merge(Env::prefixed("SEARCH_")).extract()?;
        config.search_config()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new().merge(Yaml::file(path))
    }

    pub fn search_config(&self) -> Result<SearchConfig, figment::Error> {
        let request_timeout = self
            .dedup_wait_timeout_secs
            .map(|secs| positive_seconds("dedup_wait_timeout_secs", secs))
            .transpose()?;

        Ok(SearchConfig {
            cache: CacheConfig::new(
                positive_seconds("cache_ttl_secs", self.cache_ttl_secs)?,
                self.max_cache_entries,
                positive_seconds("sweep_interval_secs", self.sweep_interval_secs)?,
            ),
            fetch: FetchConfig {
                base_url: self.base_url.clone(),
                page_size: self.page_size,
                max_concurrent_pages: self.max_concurrent_pages,
            },
            deduplication: DeduplicationConfig {
                request_timeout,
                enabled: self.deduplication,
            },
            fetch_timeout: self.fetch_timeout_secs.map(Duration::from_secs),
        })
    }
}

fn positive_seconds(name: &str, secs: u64) -> Result<chrono::Duration, figment::Error> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .filter(|duration| *duration > chrono::Duration::zero())
        .ok_or_else(|| {
            figment::Error::from(format!(
                "{} must be between 1 and {} seconds, got {}",
                name,
                chrono::Duration::MAX.num_seconds(),
                secs
            ))
        })
}
