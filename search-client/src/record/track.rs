use super::album::Album;
use super::artist::Artist;
use super::{SearchKind, Searchable};
use chrono::{DateTime, Utc};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Getters, CopyGetters)]
pub struct Track {
    #[getset(get = "pub")]
    album: Album,
    #[getset(get = "pub")]
    #[serde(default)]
    artists: Vec<Artist>,
    #[getset(get_copy = "pub")]
    #[serde(default)]
    disc_number: u32,
    #[getset(get_copy = "pub")]
    duration_ms: u64,
    #[getset(get_copy = "pub")]
    #[serde(default)]
    explicit: bool,
    #[getset(get = "pub")]
    href: String,
    #[getset(get = "pub")]
    id: String,
    #[getset(get_copy = "pub")]
    #[serde(default)]
    is_playable: bool,
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    #[serde(default)]
    popularity: u32,
    #[getset(get = "pub")]
    #[serde(default)]
    preview_url: Option<String>,
    #[getset(get_copy = "pub")]
    #[serde(default)]
    track_number: u32,
    #[getset(get = "pub")]
    #[serde(rename = "type")]
    kind: String,
    #[getset(get = "pub")]
    uri: String,
    #[getset(get_copy = "pub")]
    #[serde(default)]
    is_local: bool,
    /// When this record was decoded from an upstream response.
    #[getset(get_copy = "pub")]
    #[serde(default = "Utc::now")]
    fetched_at: DateTime<Utc>,
}

// `fetched_at` is bookkeeping and does not take part in equality.
impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.album == other.album
            && self.artists == other.artists
            && self.disc_number == other.disc_number
            && self.duration_ms == other.duration_ms
            && self.explicit == other.explicit
            && self.href == other.href
            && self.is_playable == other.is_playable
            && self.name == other.name
            && self.popularity == other.popularity
            && self.preview_url == other.preview_url
            && self.track_number == other.track_number
            && self.kind == other.kind
            && self.uri == other.uri
            && self.is_local == other.is_local
    }
}

impl Searchable for Track {
    const KIND: SearchKind = SearchKind::Track;
}
