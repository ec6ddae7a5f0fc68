//! Catalog search.
//!
//! Raw upstream track objects are decoded into [`CandidateTrack`] right at
//! this boundary; anything without an id and a name never enters the
//! pipeline.

pub mod spotify;

pub use spotify::SpotifyCatalog;

use async_trait::async_trait;
use serde_json::Value;
use std::hash::{Hash, Hasher};
use thiserror::Error;
use tracing::debug;

use crate::mood::Keyed;

/// Fallback artist name for tracks that list none
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// A search hit under consideration.
///
/// Identity is the upstream id alone: two candidates with the same id are
/// equal whatever their other fields say.
#[derive(Debug, Clone)]
pub struct CandidateTrack {
    pub id: String,
    pub name: String,
    pub primary_artist: String,
    /// Untouched upstream object, kept for final mapping
    pub raw: Value,
}

impl PartialEq for CandidateTrack {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CandidateTrack {}

impl Hash for CandidateTrack {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Keyed for CandidateTrack {
    type Key = str;

    fn key(&self) -> &str {
        &self.id
    }
}

impl CandidateTrack {
    /// Decode one upstream track object, or `None` when id or name is missing.
    pub fn from_item(item: Value) -> Option<Self> {
        let id = non_empty(item.get("id"))?;
        let name = non_empty(item.get("name"))?;
        let primary_artist = item
            .get("artists")
            .and_then(Value::as_array)
            .and_then(|artists| artists.first())
            .and_then(|artist| non_empty(artist.get("name")))
            .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());

        Some(Self {
            id,
            name,
            primary_artist,
            raw: item,
        })
    }
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Decode a list of upstream items, logging and dropping malformed ones.
pub fn decode_items(items: Vec<Value>) -> Vec<CandidateTrack> {
    let total = items.len();
    let tracks: Vec<CandidateTrack> = items.into_iter().filter_map(CandidateTrack::from_item).collect();

    if tracks.len() < total {
        debug!(dropped = total - tracks.len(), kept = tracks.len(), "Dropped malformed catalog items");
    }
    tracks
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog not configured: {0}")]
    NotConfigured(String),

    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog returned status {0}")]
    Status(u16),

    #[error("undecodable catalog response: {0}")]
    Decode(String),
}

/// Upstream catalog text search
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Run one bounded text query
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CandidateTrack>, CatalogError>;
}
