//! Final assembly: shuffle, dedup across scenes, truncate, map.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::dedup::DedupTracker;
use crate::catalog::{CandidateTrack, UNKNOWN_ARTIST};

pub const UNKNOWN_ALBUM: &str = "Unknown Album";

const TRACK_URL_PREFIX: &str = "https://open.spotify.com/track/";

/// A track as handed to callers and the persistence sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedTrack {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    pub external_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// 1-based position within its list
    pub position: u32,
}

impl RecommendedTrack {
    /// Map a candidate's raw payload; `None` if id or name is missing.
    pub fn from_candidate(candidate: &CandidateTrack, position: u32) -> Option<Self> {
        let raw = &candidate.raw;
        let id = candidate.id.trim();
        let name = candidate.name.trim();
        if id.is_empty() || name.is_empty() {
            return None;
        }

        let artist = if candidate.primary_artist.trim().is_empty() {
            UNKNOWN_ARTIST.to_string()
        } else {
            candidate.primary_artist.clone()
        };

        Some(Self {
            id: id.to_string(),
            name: name.to_string(),
            artist,
            album: text_at(raw, "/album/name").unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
            image_url: text_at(raw, "/album/images/0/url"),
            preview_url: text_at(raw, "/preview_url"),
            external_url: text_at(raw, "/external_urls/spotify")
                .unwrap_or_else(|| format!("{TRACK_URL_PREFIX}{id}")),
            duration_ms: raw.get("duration_ms").and_then(duration),
            position,
        })
    }
}

fn text_at(raw: &Value, pointer: &str) -> Option<String> {
    let s = raw.pointer(pointer)?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn duration(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Assemble with a thread-local rng
pub fn assemble(candidates: Vec<CandidateTrack>, limit: usize, tracker: &mut DedupTracker) -> Vec<RecommendedTrack> {
    assemble_with_rng(candidates, limit, tracker, &mut rand::rng())
}

/// Shuffle, then emit up to `limit` tracks the tracker has not seen.
///
/// Skipped duplicates do not count toward the limit, and only emitted
/// ids are recorded.
pub fn assemble_with_rng<R: Rng + ?Sized>(
    mut candidates: Vec<CandidateTrack>,
    limit: usize,
    tracker: &mut DedupTracker,
    rng: &mut R,
) -> Vec<RecommendedTrack> {
    candidates.shuffle(rng);

    let mut tracks = Vec::with_capacity(limit.min(candidates.len()));
    let mut skipped = 0usize;
    let mut malformed = 0usize;

    for candidate in &candidates {
        if tracks.len() >= limit {
            break;
        }
        if tracker.contains(&candidate.id) {
            skipped += 1;
            continue;
        }
        let position = tracks.len() as u32 + 1;
        let Some(track) = RecommendedTrack::from_candidate(candidate, position) else {
            malformed += 1;
            continue;
        };
        tracker.admit(&track.id);
        tracks.push(track);
    }

    debug!(emitted = tracks.len(), skipped, malformed, "Assembled tracks");
    tracks
}
