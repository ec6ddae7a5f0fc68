use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use crate::mood::MatchRules;
use crate::pipeline::quality::{DEFAULT_BLOCKED_ARTISTS, DEFAULT_GENERIC_TERMS};

/// Application configuration loaded from environment variables.
///
/// All settings can be configured via environment variables with the `CURATOR_` prefix.
/// For example: `CURATOR_SERVER__PORT=8097`, `CURATOR_SIMILARITY__API_KEY=...`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Catalog search and audio-feature endpoints
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Similar-artist lookup service
    #[serde(default)]
    pub similarity: SimilarityConfig,

    /// Candidate generation knobs
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Mood matcher tolerances and hard override thresholds
    #[serde(default)]
    pub matcher: MatchRules,

    /// Generic/spam filter tables
    #[serde(default)]
    pub quality: QualityConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Clone, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the catalog web API
    #[serde(default = "default_catalog_url")]
    pub base_url: String,

    /// Bearer token for the catalog. Without it every catalog call degrades to empty.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Market passed along with search queries
    #[serde(default = "default_market")]
    pub market: String,

    /// Timeout for a single search call, in seconds
    #[serde(default = "default_catalog_timeout")]
    pub timeout_s: u64,

    /// Timeout for a single audio-features batch, in seconds
    #[serde(default = "default_features_timeout")]
    pub features_timeout_s: u64,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("market", &self.market)
            .field("timeout_s", &self.timeout_s)
            .field("features_timeout_s", &self.features_timeout_s)
            .finish()
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            access_token: None,
            market: default_market(),
            timeout_s: default_catalog_timeout(),
            features_timeout_s: default_features_timeout(),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_s)
    }

    pub fn features_timeout(&self) -> Duration {
        Duration::from_secs(self.features_timeout_s)
    }
}

fn default_catalog_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_market() -> String {
    "from_token".to_string()
}

fn default_catalog_timeout() -> u64 {
    10
}

fn default_features_timeout() -> u64 {
    15
}

#[derive(Clone, Deserialize)]
pub struct SimilarityConfig {
    /// Base URL of the similarity service
    #[serde(default = "default_similarity_url")]
    pub base_url: String,

    /// API key; expansion is disabled when absent
    #[serde(default)]
    pub api_key: Option<String>,

    /// Timeout for a single lookup, in seconds
    #[serde(default = "default_similarity_timeout")]
    pub timeout_s: u64,

    /// Minimum match confidence for a similar artist to be kept
    #[serde(default = "default_min_match")]
    pub min_match: f64,

    /// How many similar artists to add for the first seed artist
    #[serde(default = "default_expansion_limit")]
    pub expansion_limit: usize,
}

impl std::fmt::Debug for SimilarityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_s", &self.timeout_s)
            .field("min_match", &self.min_match)
            .field("expansion_limit", &self.expansion_limit)
            .finish()
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            base_url: default_similarity_url(),
            api_key: None,
            timeout_s: default_similarity_timeout(),
            min_match: default_min_match(),
            expansion_limit: default_expansion_limit(),
        }
    }
}

impl SimilarityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_s)
    }
}

fn default_similarity_url() -> String {
    "https://ws.audioscrobbler.com/2.0/".to_string()
}

fn default_similarity_timeout() -> u64 {
    5
}

fn default_min_match() -> f64 {
    0.4
}

fn default_expansion_limit() -> usize {
    2
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Concurrent outbound calls per request (clamped to 1..=8)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Width of the recency window appended to keyword queries, in years
    #[serde(default = "default_recent_years")]
    pub recent_years: i32,

    /// Maximum number of normalized genres used for planning
    #[serde(default = "default_max_genres")]
    pub max_genres: usize,

    /// Maximum number of artist names used for artist-scoped queries
    #[serde(default = "default_max_seed_artists")]
    pub max_seed_artists: usize,

    /// Fetch budget of keyword/genre queries (upstream page ceiling is 50)
    #[serde(default = "default_primary_fetch_limit")]
    pub primary_fetch_limit: usize,

    /// Fetch budget of artist-scoped queries
    #[serde(default = "default_artist_fetch_limit")]
    pub artist_fetch_limit: usize,

    /// Ids per enrichment call (upstream ceiling is 100)
    #[serde(default = "default_feature_batch_size")]
    pub feature_batch_size: usize,

    /// Maximum number of scenes accepted in one request
    #[serde(default = "default_max_scenes")]
    pub max_scenes: usize,

    /// Track count used for a scene that does not ask for one
    #[serde(default = "default_tracks_per_scene")]
    pub default_tracks_per_scene: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            recent_years: default_recent_years(),
            max_genres: default_max_genres(),
            max_seed_artists: default_max_seed_artists(),
            primary_fetch_limit: default_primary_fetch_limit(),
            artist_fetch_limit: default_artist_fetch_limit(),
            feature_batch_size: default_feature_batch_size(),
            max_scenes: default_max_scenes(),
            default_tracks_per_scene: default_tracks_per_scene(),
        }
    }
}

impl PipelineConfig {
    /// Worker count actually used for fan-out
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(1, 8)
    }

    /// Batch size actually used for enrichment
    pub fn effective_batch_size(&self) -> usize {
        self.feature_batch_size.clamp(1, 100)
    }
}

fn default_concurrency() -> usize {
    6
}

fn default_recent_years() -> i32 {
    10
}

fn default_max_genres() -> usize {
    5
}

fn default_max_seed_artists() -> usize {
    3
}

fn default_primary_fetch_limit() -> usize {
    50
}

fn default_artist_fetch_limit() -> usize {
    10
}

fn default_feature_batch_size() -> usize {
    100
}

fn default_max_scenes() -> usize {
    6
}

fn default_tracks_per_scene() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct QualityConfig {
    /// Substrings that mark a track or artist name as generic filler
    #[serde(default = "default_generic_terms")]
    pub generic_terms: Vec<String>,

    /// Artist names rejected on exact (case-folded) match
    #[serde(default = "default_blocked_artists")]
    pub blocked_artists: Vec<String>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            generic_terms: default_generic_terms(),
            blocked_artists: default_blocked_artists(),
        }
    }
}

fn default_generic_terms() -> Vec<String> {
    DEFAULT_GENERIC_TERMS.iter().map(|s| s.to_string()).collect()
}

fn default_blocked_artists() -> Vec<String> {
    DEFAULT_BLOCKED_ARTISTS.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8097
}

impl ServerConfig {
    /// Returns the socket address for binding the server
    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .expect("Invalid socket address")
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables should be prefixed with `CURATOR_` and use
    /// double underscores for nested values:
    /// - `CURATOR_CATALOG__ACCESS_TOKEN` -> catalog.access_token
    /// - `CURATOR_MATCHER__VALENCE_TOLERANCE` -> matcher.valence_tolerance
    /// - `CURATOR_SERVER__PORT` -> server.port
    /// - `CURATOR_QUALITY__GENERIC_TERMS=loop,karaoke` -> comma-separated list
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix("CURATOR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("quality.generic_terms")
            .with_list_parse_key("quality.blocked_artists")
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let config = Config::builder().add_source(environment).build()?;

        config.try_deserialize()
    }
}
