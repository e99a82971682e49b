use crate::config::Config;
use crate::error::ServiceError;
use getset::Getters;
use log::info;
use search_client::sweep::SweepHandle;
use search_client::{Album, SearchClient, SearchKind, Track};
use std::sync::Arc;

#[derive(Getters)]
#[get = "pub"]
pub struct Context {
    search_client: SearchClient,
    config: Config,
}

impl Context {
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        let search_client = SearchClient::new(config.access_token(), config.search_config()?)?;

        info!(
            "Initialized SearchClient with caching (TTL: {}s, sweep every {}s, max entries: {}, page size: {})",
            config.cache_ttl_secs(),
            config.sweep_interval_secs(),
            config.max_cache_entries(),
            config.page_size()
        );

        Ok(Self {
            search_client,
            config,
        })
    }

    pub fn start_sweep(&self) -> SweepHandle {
        self.search_client.start_sweep()
    }

    /// Run one query and encode the results as JSON
    pub async fn search_json(&self, kind: SearchKind, query: &str) -> Result<String, ServiceError> {
        let json = match kind {
            SearchKind::Track => {
                let tracks: Vec<Track> = self.search_client.search(query).await?;
                info!("{:?}: {} tracks", query, tracks.len());
                serde_json::to_string_pretty(&tracks)?
            }
            SearchKind::Album => {
                let albums: Vec<Album> = self.search_client.search(query).await?;
                info!("{:?}: {} albums", query, albums.len());
                serde_json::to_string_pretty(&albums)?
            }
        };
        Ok(json)
    }

    /// Stop the sweep and release every cached entry
    pub async fn shutdown(&self, sweep: SweepHandle) {
        sweep.stop().await;
        self.search_client.clear_cache();
        info!("Search service stopped");
    }
}

pub type ContextPointer = Arc<Context>;
