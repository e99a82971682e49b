pub mod album;
pub mod artist;
pub mod track;

use serde::de::DeserializeOwned;

/// The `type` values the upstream search endpoint understands.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum SearchKind {
    Track,
    Album,
}

impl SearchKind {
    /// Name of the object wrapping a page of this kind in the response body.
    pub fn collection(&self) -> String {
        format!("{}s", self)
    }
}

/// A record that can be searched for and cached.
///
/// Equality must ignore fetch bookkeeping so that re-fetching identical
/// upstream data is recognised as unchanged.
pub trait Searchable: DeserializeOwned + Clone + PartialEq + Send + Sync + 'static {
    const KIND: SearchKind;
}
