//! Generic/spam filtering.
//!
//! Catalog search is noisy: sleep-noise channels, "type beat" uploads and
//! placeholder titles rank well for almost any mood keyword. This stage
//! removes them by name heuristics alone.

use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::catalog::CandidateTrack;
use crate::config::QualityConfig;

/// Substrings that mark a track or artist as filler
pub const DEFAULT_GENERIC_TERMS: &[&str] = &[
    "relaxing music",
    "sleep music",
    "study music",
    "meditation music",
    "background music",
    "spa music",
    "yoga music",
    "white noise",
    "brown noise",
    "pink noise",
    "rain sounds",
    "nature sounds",
    "ocean waves",
    "binaural",
    "lofi beats",
    "lo-fi beats",
    "instrumental",
    "karaoke",
    "loop",
    "type beat",
    "asmr",
];

/// Artist names rejected on exact match
pub const DEFAULT_BLOCKED_ARTISTS: &[&str] = &[
    "various artists",
    "white noise baby sleep",
    "sleep sounds",
    "rain sounds",
    "relaxing music therapy",
    "study music academy",
    "deep sleep music collective",
    "lofi fruits music",
    "karaoke hits",
];

/// A title that is nothing but a (possibly bracketed) year
const YEAR_ONLY_PATTERN: &str = r"^\s*[(\[]?\s*\d{4}\s*[)\]]?\s*$";

/// "track 07", "untitled #3"
const PLACEHOLDER_PATTERN: &str = r"^\s*(track|untitled)\s*#?\s*\d{1,3}\s*$";

/// Why a candidate was flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericReason {
    Term,
    BlockedArtist,
    YearOnlyTitle,
    PlaceholderTitle,
}

/// Survivors of one filter pass
#[derive(Debug, Clone)]
pub struct QualityOutcome {
    pub candidates: Vec<CandidateTrack>,
    pub removed: usize,
    /// True when filtering removed everything and the input was kept instead
    pub fell_back: bool,
}

#[derive(Debug, Clone)]
pub struct QualityFilter {
    generic_terms: Vec<String>,
    blocked_artists: HashSet<String>,
    year_only: Regex,
    placeholder: Regex,
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self::new(&QualityConfig::default())
    }
}

impl QualityFilter {
    pub fn new(config: &QualityConfig) -> Self {
        Self {
            generic_terms: config
                .generic_terms
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            blocked_artists: config
                .blocked_artists
                .iter()
                .map(|a| a.trim().to_lowercase())
                .filter(|a| !a.is_empty())
                .collect(),
            year_only: Regex::new(YEAR_ONLY_PATTERN).expect("compile year-only pattern"),
            placeholder: Regex::new(PLACEHOLDER_PATTERN).expect("compile placeholder pattern"),
        }
    }

    /// First rule the candidate trips, if any
    pub fn classify(&self, track: &CandidateTrack) -> Option<GenericReason> {
        let name = track.name.to_lowercase();
        let artist = track.primary_artist.trim().to_lowercase();

        if self.blocked_artists.contains(&artist) {
            return Some(GenericReason::BlockedArtist);
        }
        if self
            .generic_terms
            .iter()
            .any(|term| name.contains(term.as_str()) || artist.contains(term.as_str()))
        {
            return Some(GenericReason::Term);
        }
        if self.year_only.is_match(&name) {
            return Some(GenericReason::YearOnlyTitle);
        }
        if self.placeholder.is_match(&name) {
            return Some(GenericReason::PlaceholderTitle);
        }
        None
    }

    pub fn is_generic(&self, track: &CandidateTrack) -> bool {
        self.classify(track).is_some()
    }

    /// Drop generic candidates. If nothing survives, the input pool is
    /// returned untouched so filtering alone never empties the result.
    pub fn apply(&self, pool: Vec<CandidateTrack>) -> QualityOutcome {
        let total = pool.len();
        let kept: Vec<CandidateTrack> = pool.iter().filter(|t| !self.is_generic(t)).cloned().collect();
        let removed = total - kept.len();

        if kept.is_empty() && total > 0 {
            warn!(total, "Every candidate looked generic, keeping the unfiltered pool");
            return QualityOutcome {
                candidates: pool,
                removed: 0,
                fell_back: true,
            };
        }

        if removed > 0 {
            debug!(removed, kept = kept.len(), "Removed generic candidates");
        }
        QualityOutcome {
            candidates: kept,
            removed,
            fell_back: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn track(id: &str, name: &str, artist: &str) -> CandidateTrack {
        CandidateTrack::from_item(json!({"id": id, "name": name, "artists": [{"name": artist}]})).unwrap()
    }

    #[test]
    fn test_generic_terms_in_name_or_artist() {
        let filter = QualityFilter::default();
        assert_eq!(
            filter.classify(&track("1", "Deep Blue Sea", "Someone")),
            None
        );
        assert_eq!(
            filter.classify(&track("2", "Rain Sounds for Focus", "Someone")),
            Some(GenericReason::Term)
        );
        assert_eq!(
            filter.classify(&track("3", "Night Drive (Instrumental)", "Someone")),
            Some(GenericReason::Term)
        );
        assert_eq!(
            filter.classify(&track("4", "Sunset", "Chill Type Beat Factory")),
            Some(GenericReason::Term)
        );
    }

    #[test]
    fn test_blocked_artist_is_exact() {
        let filter = QualityFilter::default();
        assert_eq!(
            filter.classify(&track("1", "Song", "Various Artists")),
            Some(GenericReason::BlockedArtist)
        );
        assert_eq!(filter.classify(&track("2", "Song", "Various Artists Tribute Band")), None);
    }

    #[test]
    fn test_year_only_titles() {
        let filter = QualityFilter::default();
        assert_eq!(filter.classify(&track("1", "1999", "Prince")), Some(GenericReason::YearOnlyTitle));
        assert_eq!(filter.classify(&track("2", "(2019)", "X")), Some(GenericReason::YearOnlyTitle));
        assert_eq!(filter.classify(&track("3", "[2020]", "X")), Some(GenericReason::YearOnlyTitle));
        assert_eq!(filter.classify(&track("4", "Summer of 1999", "X")), None);
        assert_eq!(filter.classify(&track("5", "12345", "X")), None);
    }

    #[test]
    fn test_placeholder_titles() {
        let filter = QualityFilter::default();
        assert_eq!(filter.classify(&track("1", "Track 07", "X")), Some(GenericReason::PlaceholderTitle));
        assert_eq!(filter.classify(&track("2", "untitled #3", "X")), Some(GenericReason::PlaceholderTitle));
        assert_eq!(filter.classify(&track("3", "Untitled Love Song", "X")), None);
        assert_eq!(filter.classify(&track("4", "Track 1000", "X")), None);
    }

    #[test]
    fn test_apply_removes_generic() {
        let filter = QualityFilter::default();
        let pool = vec![
            track("1", "Blue in Green", "Miles Davis"),
            track("2", "White Noise 10 Hours", "Sleepy"),
            track("3", "Naima", "John Coltrane"),
        ];
        let outcome = filter.apply(pool);
        assert_eq!(outcome.removed, 1);
        assert!(!outcome.fell_back);
        let ids: Vec<&str> = outcome.candidates.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_apply_falls_back_when_everything_is_generic() {
        let filter = QualityFilter::default();
        let pool = vec![track("1", "Track 1", "X"), track("2", "2001", "Y")];
        let outcome = filter.apply(pool);
        assert!(outcome.fell_back);
        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(outcome.removed, 0);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let filter = QualityFilter::default();
        let pool = vec![
            track("1", "Blue in Green", "Miles Davis"),
            track("2", "Meditation Music", "Calm"),
            track("3", "untitled 4", "Y"),
            track("4", "So What", "Miles Davis"),
        ];
        let once = filter.apply(pool).candidates;
        let twice = filter.apply(once.clone()).candidates;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_custom_tables() {
        let filter = QualityFilter::new(&QualityConfig {
            generic_terms: vec!["nightcore".to_string()],
            blocked_artists: vec![],
        });
        assert!(filter.is_generic(&track("1", "Song (Nightcore)", "X")));
        assert!(!filter.is_generic(&track("2", "Rain Sounds", "X")));
    }
}
