//! Query expansion.
//!
//! Turns one [`Intent`] into the ordered list of concrete catalog queries
//! the aggregator runs. The catalog only understands literal text and
//! field filters, so every concept in the intent becomes a query string.

use chrono::Datelike;
use serde::Serialize;
use std::collections::HashSet;

use super::intent::Intent;
use crate::catalog::spotify::MAX_SEARCH_LIMIT;
use crate::config::PipelineConfig;

/// Genre tags the catalog accepts as filters
pub const GENRE_WHITELIST: &[&str] = &[
    "acoustic", "afrobeat", "alt-rock", "alternative", "ambient", "anime", "black-metal",
    "bluegrass", "blues", "bossanova", "brazil", "breakbeat", "british", "cantopop",
    "chicago-house", "children", "chill", "classical", "club", "comedy", "country",
    "dance", "dancehall", "death-metal", "deep-house", "detroit-techno", "disco", "disney",
    "drum-and-bass", "dub", "dubstep", "edm", "electro", "electronic", "emo", "folk",
    "forro", "french", "funk", "garage", "german", "gospel", "goth", "grindcore", "groove",
    "grunge", "guitar", "happy", "hard-rock", "hardcore", "hardstyle", "heavy-metal",
    "hip-hop", "holidays", "honky-tonk", "house", "idm", "indian", "indie", "indie-pop",
    "industrial", "iranian", "j-dance", "j-idol", "j-pop", "j-rock", "jazz", "k-pop",
    "kids", "latin", "latino", "malay", "mandopop", "metal", "metal-misc", "metalcore",
    "minimal-techno", "movies", "mpb", "new-age", "new-release", "opera", "pagode",
    "party", "philippines-opm", "piano", "pop", "pop-film", "post-dubstep", "power-pop",
    "progressive-house", "psych-rock", "punk", "punk-rock", "r-n-b", "rainy-day", "reggae",
    "reggaeton", "road-trip", "rock", "rock-n-roll", "rockabilly", "romance", "sad",
    "salsa", "samba", "sertanejo", "show-tunes", "singer-songwriter", "ska", "sleep",
    "songwriter", "soul", "soundtracks", "spanish", "study", "summer", "swedish",
    "synth-pop", "tango", "techno", "trance", "trip-hop", "turkish", "work-out", "world-music",
];

const QUOTES: &[char] = &['"', '\u{201C}', '\u{201D}', '\u{201E}', '\u{00AB}', '\u{00BB}'];

/// Why a query was planned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPurpose {
    KeywordGenre,
    KeywordOnly,
    GenreOnly,
    ArtistBoost,
}

/// One concrete catalog query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedQuery {
    pub text: String,
    pub fetch_limit: usize,
    pub purpose: QueryPurpose,
}

#[derive(Debug, Clone)]
pub struct QueryPlanner {
    whitelist: HashSet<String>,
    recent_years: i32,
    max_genres: usize,
    max_artists: usize,
    primary_fetch_limit: usize,
    artist_fetch_limit: usize,
    expansion_limit: usize,
    current_year: i32,
}

impl QueryPlanner {
    pub fn new(config: &PipelineConfig, expansion_limit: usize) -> Self {
        Self {
            whitelist: GENRE_WHITELIST.iter().map(|g| g.to_string()).collect(),
            recent_years: config.recent_years.max(0),
            max_genres: config.max_genres,
            max_artists: config.max_seed_artists,
            primary_fetch_limit: config.primary_fetch_limit.clamp(1, MAX_SEARCH_LIMIT),
            artist_fetch_limit: config.artist_fetch_limit.clamp(1, MAX_SEARCH_LIMIT),
            expansion_limit,
            current_year: chrono::Utc::now().year(),
        }
    }

    /// Replace the genre table
    pub fn with_whitelist<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.whitelist = genres
            .into_iter()
            .map(|g| g.as_ref().trim().to_lowercase())
            .collect();
        self
    }

    /// Pin the year used by the recency filter
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    /// How many similar artists are worth looking up for the first seed
    pub fn expansion_limit(&self) -> usize {
        self.expansion_limit
    }

    /// Lower-case, trim, keep whitelisted tags in order, drop repeats, cap.
    pub fn normalize_genres(&self, genres: &[String]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for genre in genres {
            if out.len() >= self.max_genres {
                break;
            }
            let genre = genre.trim().to_lowercase();
            if self.whitelist.contains(&genre) && !out.contains(&genre) {
                out.push(genre);
            }
        }
        out
    }

    /// Keywords without quote characters and with a recency filter, or
    /// `None` when nothing is left.
    pub fn keyword_query(&self, keywords: &str) -> Option<String> {
        let cleaned = clean_keywords(keywords)?;
        let from = self.current_year - self.recent_years;
        Some(format!("{cleaned} year:{from}-{}", self.current_year))
    }

    /// `genre:"a" genre:"b"` for the given normalized genres
    pub fn genre_filter(&self, genres: &[String]) -> Option<String> {
        if genres.is_empty() {
            return None;
        }
        let terms: Vec<String> = genres.iter().map(|g| format!("genre:\"{g}\"")).collect();
        Some(terms.join(" "))
    }

    /// Seeds followed by similar names, deduplicated case-insensitively and capped
    pub fn artist_names(&self, seeds: &[String], similar: &[String]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let candidates = seeds
            .iter()
            .chain(similar.iter().take(self.expansion_limit));

        for name in candidates {
            let name = name.replace(QUOTES, "").trim().to_string();
            if name.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case(&name)) {
                continue;
            }
            names.push(name);
            if names.len() == self.max_artists {
                break;
            }
        }
        names
    }

    /// Plan every query for `intent`.
    ///
    /// `similar` holds artists similar to the first seed; it is ignored
    /// when the intent has no seeds.
    pub fn plan(&self, intent: &Intent, similar: &[String]) -> Vec<PlannedQuery> {
        let genres = self.normalize_genres(&intent.genres);
        let keyword_query = self.keyword_query(&intent.keywords);
        let genre_filter = self.genre_filter(&genres);
        let mut queries = Vec::new();

        if let (Some(keywords), Some(genre)) = (&keyword_query, &genre_filter) {
            queries.push(self.primary(format!("{keywords} {genre}"), QueryPurpose::KeywordGenre));
        }
        if let Some(keywords) = &keyword_query {
            queries.push(self.primary(keywords.clone(), QueryPurpose::KeywordOnly));
        }
        if let Some(genre) = &genre_filter {
            queries.push(self.primary(genre.clone(), QueryPurpose::GenreOnly));
        }

        if intent.seed_artists.is_empty() {
            return queries;
        }

        let plain_keywords = clean_keywords(&intent.keywords);
        for artist in self.artist_names(&intent.seed_artists, similar) {
            let scope = format!("artist:\"{artist}\"");
            match (&plain_keywords, &genre_filter) {
                (None, None) => queries.push(self.boost(scope)),
                (keywords, genre) => {
                    if let Some(keywords) = keywords {
                        queries.push(self.boost(format!("{scope} {keywords}")));
                    }
                    if let Some(genre) = genre {
                        queries.push(self.boost(format!("{scope} {genre}")));
                    }
                }
            }
        }

        queries
    }

    fn primary(&self, text: String, purpose: QueryPurpose) -> PlannedQuery {
        PlannedQuery {
            text,
            fetch_limit: self.primary_fetch_limit,
            purpose,
        }
    }

    fn boost(&self, text: String) -> PlannedQuery {
        PlannedQuery {
            text,
            fetch_limit: self.artist_fetch_limit,
            purpose: QueryPurpose::ArtistBoost,
        }
    }
}

fn clean_keywords(keywords: &str) -> Option<String> {
    let stripped = keywords.replace(QUOTES, " ");
    let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    (!cleaned.is_empty()).then_some(cleaned)
}
