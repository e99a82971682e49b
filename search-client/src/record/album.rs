use super::artist::Artist;
use super::{SearchKind, Searchable};
use chrono::{DateTime, Utc};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Getters, CopyGetters)]
pub struct Album {
    #[getset(get = "pub")]
    album_type: String,
    #[getset(get_copy = "pub")]
    #[serde(default)]
    total_tracks: u32,
    #[getset(get = "pub")]
    #[serde(default)]
    available_markets: Vec<String>,
    #[getset(get = "pub")]
    href: String,
    #[getset(get = "pub")]
    id: String,
    #[getset(get = "pub")]
    name: String,
    #[getset(get = "pub")]
    #[serde(default)]
    release_date: String,
    #[getset(get = "pub")]
    #[serde(default)]
    release_date_precision: String,
    #[getset(get = "pub")]
    #[serde(rename = "type")]
    kind: String,
    #[getset(get = "pub")]
    uri: String,
    #[getset(get = "pub")]
    #[serde(default)]
    artists: Vec<Artist>,
    /// When this record was decoded from an upstream response.
    #[getset(get_copy = "pub")]
    #[serde(default = "Utc::now")]
    fetched_at: DateTime<Utc>,
}

// `fetched_at` is bookkeeping and does not take part in equality.
impl PartialEq for Album {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.album_type == other.album_type
            && self.total_tracks == other.total_tracks
            && self.available_markets == other.available_markets
            && self.href == other.href
            && self.name == other.name
            && self.release_date == other.release_date
            && self.release_date_precision == other.release_date_precision
            && self.kind == other.kind
            && self.uri == other.uri
            && self.artists == other.artists
    }
}

impl Searchable for Album {
    const KIND: SearchKind = SearchKind::Album;
}
