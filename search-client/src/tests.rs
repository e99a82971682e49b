use crate::cache::CacheConfig;
use crate::client::{FetchConfig, Transport, TransportResponse};
use crate::{Album, Error, ErrorKind, Result, SearchClient, SearchConfig, Track};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory upstream serving `total` generated results per query.
pub(crate) struct FakeTransport {
    total: usize,
    failing: HashSet<usize>,
    raw_body: Option<Vec<u8>>,
    collection: Option<String>,
    latency: Duration,
    reverse_latency: bool,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    offsets: Mutex<HashSet<usize>>,
}

impl FakeTransport {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            total,
            failing: HashSet::new(),
            raw_body: None,
            collection: None,
            latency: Duration::ZERO,
            reverse_latency: false,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            offsets: Mutex::new(HashSet::new()),
        }
    }

    /// Answer 502 for the page at `offset`
    pub(crate) fn failing_at(mut self, offset: usize) -> Self {
        self.failing.insert(offset);
        self
    }

    pub(crate) fn with_raw_body(mut self, body: Vec<u8>) -> Self {
        self.raw_body = Some(body);
        self
    }

    /// Wrap pages in `name` instead of the collection matching the requested type
    pub(crate) fn with_collection(mut self, name: &str) -> Self {
        self.collection = Some(name.to_string());
        self
    }

    pub(crate) fn with_latency_ms(mut self, millis: u64) -> Self {
        self.latency = Duration::from_millis(millis);
        self
    }

    /// Make later pages answer faster than earlier ones
    pub(crate) fn with_reverse_latency(mut self) -> Self {
        self.reverse_latency = true;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn offsets(&self) -> HashSet<usize> {
        self.offsets.lock().unwrap().clone()
    }

    fn delay_for(&self, offset: usize) -> Duration {
        if self.reverse_latency {
            Duration::from_millis((self.total.saturating_sub(offset) / 5) as u64)
        } else {
            self.latency
        }
    }

    fn page_body(&self, kind: &str, offset: usize, limit: usize) -> Vec<u8> {
        let end = self.total.min(offset + limit);
        let items: Vec<Value> = (offset..end)
            .map(|i| match kind {
                "album" => album_json(i),
                _ => track_json(i),
            })
            .collect();
        let collection = self
            .collection
            .clone()
            .unwrap_or_else(|| format!("{}s", kind));

        let mut body = serde_json::Map::new();
        body.insert(
            collection,
            json!({ "total": self.total, "items": items }),
        );
        Value::Object(body).to_string().into_bytes()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse> {
        let url = url::Url::parse(url).map_err(Error::transport)?;
        let param = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };
        let offset: usize = param("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
        let limit: usize = param("limit").and_then(|v| v.parse().ok()).unwrap_or(50);
        let kind = param("type").unwrap_or_default();

        self.calls.fetch_add(1, Ordering::SeqCst);
        self.offsets.lock().unwrap().insert(offset);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay_for(offset)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&offset) {
            return Ok(TransportResponse::new(502, b"bad gateway".to_vec()));
        }
        if let Some(raw) = &self.raw_body {
            return Ok(TransportResponse::new(200, raw.clone()));
        }
        Ok(TransportResponse::new(
            200,
            self.page_body(&kind, offset, limit),
        ))
    }
}

fn artist_json(i: usize) -> Value {
    json!({
        "href": format!("https://api.example.com/v1/artists/artist-{}", i),
        "id": format!("artist-{}", i),
        "name": format!("Artist {}", i),
        "type": "artist",
        "uri": format!("spotify:artist:artist-{}", i)
    })
}

fn album_json(i: usize) -> Value {
    json!({
        "album_type": "album",
        "total_tracks": 10,
        "available_markets": ["US", "RS"],
        "href": format!("https://api.example.com/v1/albums/album-{}", i),
        "id": format!("album-{}", i),
        "name": format!("Album {}", i),
        "release_date": "1959-08-17",
        "release_date_precision": "day",
        "type": "album",
        "uri": format!("spotify:album:album-{}", i),
        "artists": [artist_json(i % 7)]
    })
}

fn track_json(i: usize) -> Value {
    json!({
        "album": album_json(i / 10),
        "artists": [artist_json(i % 7)],
        "disc_number": 1,
        "duration_ms": 180000 + i,
        "explicit": false,
        "href": format!("https://api.example.com/v1/tracks/track-{}", i),
        "id": format!("track-{}", i),
        "is_playable": true,
        "name": format!("Track {}", i),
        "popularity": i % 100,
        "preview_url": null,
        "track_number": i % 10 + 1,
        "type": "track",
        "uri": format!("spotify:track:track-{}", i),
        "is_local": false
    })
}

fn client(transport: Arc<FakeTransport>) -> SearchClient {
    SearchClient::with_transport(transport, SearchConfig::default()).unwrap()
}

#[tokio::test]
async fn test_caching_basic() {
    let transport = Arc::new(FakeTransport::new(120));
    let client = client(transport.clone());

    let first = client.search_tracks("jazz").await.unwrap();
    assert_eq!(first.len(), 120);
    assert_eq!(transport.calls(), 3);

    let second = client.search_tracks("jazz").await.unwrap();
    assert_eq!(second, first);
    assert_eq!(transport.calls(), 3);

    let stats = client.cache_stats();
    assert_eq!(stats.total_entries, 1);
    assert_eq!(stats.valid_entries, 1);
}

#[tokio::test]
async fn test_kinds_are_cached_separately() {
    let transport = Arc::new(FakeTransport::new(40));
    let client = client(transport.clone());

    let tracks = client.search_tracks("jazz").await.unwrap();
    let albums: Vec<Album> = client.search("jazz").await.unwrap();

    assert_eq!(tracks.len(), 40);
    assert_eq!(albums.len(), 40);
    assert_eq!(albums[3].id(), "album-3");
    assert_eq!(transport.calls(), 2);
    assert_eq!(client.cache_stats().total_entries, 2);
}

#[tokio::test]
async fn test_failed_page_leaves_cache_empty() {
    let transport = Arc::new(FakeTransport::new(120).failing_at(100));
    let client = client(transport.clone());

    let err = client.search_tracks("jazz").await.unwrap_err();
    assert!(err.is_upstream());
    assert_eq!(*err.status(), Some(502));
    assert_eq!(client.cache_stats().total_entries, 0);

    // Nothing was cached, so the next search goes upstream again.
    assert!(client.search_tracks("jazz").await.is_err());
    assert_eq!(transport.calls(), 6);
}

#[tokio::test]
async fn test_empty_query_never_reaches_upstream() {
    let transport = Arc::new(FakeTransport::new(10));
    let client = client(transport.clone());

    let err = client.search_albums("").await.unwrap_err();

    assert_eq!(*err.kind(), ErrorKind::InvalidQuery);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_clear_and_invalidate_force_refetch() {
    let transport = Arc::new(FakeTransport::new(10));
    let client = client(transport.clone());

    client.search_tracks("jazz").await.unwrap();
    client.clear_cache();
    client.search_tracks("jazz").await.unwrap();
    assert_eq!(transport.calls(), 2);

    assert!(client.invalidate::<Track>("jazz"));
    assert!(!client.invalidate::<Album>("jazz"));
    client.search_tracks("jazz").await.unwrap();
    assert_eq!(transport.calls(), 3);
}

#[tokio::test]
async fn test_custom_page_size() {
    let transport = Arc::new(FakeTransport::new(60));
    let config = SearchConfig {
        fetch: FetchConfig {
            page_size: 25,
            ..Default::default()
        },
        ..Default::default()
    };
    let client = SearchClient::with_transport(transport.clone(), config).unwrap();

    let tracks = client.search_tracks("jazz").await.unwrap();

    assert_eq!(tracks.len(), 60);
    assert_eq!(transport.offsets(), HashSet::from([0, 25, 50]));
}

#[tokio::test]
async fn test_concurrent_searches_share_one_fetch() {
    let transport = Arc::new(FakeTransport::new(120).with_latency_ms(30));
    let client = client(transport.clone());

    let searches: Vec<_> = (0..6)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.search_tracks("jazz").await })
        })
        .collect();

    for search in searches {
        assert_eq!(search.await.unwrap().unwrap().len(), 120);
    }
    assert_eq!(transport.calls(), 3);
    assert_eq!(client.deduplication_stats().pending_requests, 0);
}

#[tokio::test]
async fn test_sweep_expires_entries() {
    let transport = Arc::new(FakeTransport::new(10));
    let config = SearchConfig {
        cache: CacheConfig::new(
            chrono::Duration::milliseconds(40),
            100,
            chrono::Duration::milliseconds(10),
        ),
        ..Default::default()
    };
    let client = SearchClient::with_transport(transport.clone(), config).unwrap();
    let sweep = client.start_sweep();

    client.search_tracks("jazz").await.unwrap();
    assert_eq!(client.cache_stats().total_entries, 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(client.cache_stats().total_entries, 0);

    client.search_tracks("jazz").await.unwrap();
    assert_eq!(transport.calls(), 2);
    sweep.stop().await;
}

#[tokio::test]
async fn test_fetch_timeout() {
    let transport = Arc::new(FakeTransport::new(10).with_latency_ms(200));
    let config = SearchConfig {
        fetch_timeout: Some(Duration::from_millis(20)),
        ..Default::default()
    };
    let client = SearchClient::with_transport(transport, config).unwrap();

    let err = client.search_tracks("jazz").await.unwrap_err();

    assert_eq!(*err.kind(), ErrorKind::Timeout);
    assert_eq!(client.cache_stats().total_entries, 0);
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let config = SearchConfig {
        fetch: FetchConfig {
            max_concurrent_pages: 0,
            ..Default::default()
        },
        ..Default::default()
    };

    let result = SearchClient::with_transport(Arc::new(FakeTransport::new(0)), config);

    assert!(matches!(result, Err(err) if *err.kind() == ErrorKind::InvalidConfig));
}
