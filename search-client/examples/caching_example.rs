use chrono::Duration;
use search_client::{cache::CacheConfig, SearchClient, SearchConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let token = std::env::var("SEARCH_ACCESS_TOKEN")?;
    let query = std::env::args().nth(1).unwrap_or_else(|| "kind of blue".to_string());

    let config = SearchConfig {
        cache: CacheConfig::new(Duration::minutes(10), 500, Duration::minutes(1)),
        ..Default::default()
    };
    let client = SearchClient::new(&token, config)?;
    let sweep = client.start_sweep();

    // First search goes upstream and fills the cache
    let start = std::time::Instant::now();
    let tracks = client.search_tracks(&query).await?;
    let duration1 = start.elapsed();
    println!("First search took: {:?} ({} tracks)", duration1, tracks.len());

    // Second search should be served from cache
    let start = std::time::Instant::now();
    let cached = client.search_tracks(&query).await?;
    let duration2 = start.elapsed();
    println!("Cached search took: {:?} ({} tracks)", duration2, cached.len());

    if duration2.as_millis() > 0 {
        println!(
            "Cache speedup: {:.2}x",
            duration1.as_millis() as f64 / duration2.as_millis() as f64
        );
    } else {
        println!("Cache speedup: Very fast (cached result)");
    }

    for track in tracks.iter().take(5) {
        println!("  {} - {}", track.name(), track.album().name());
    }

    println!("Cache stats: {:?}", client.cache_stats());

    sweep.stop().await;
    client.clear_cache();
    Ok(())
}
