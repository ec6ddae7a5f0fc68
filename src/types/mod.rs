//! Shared types for the curator API.
//!
//! Request/response bodies exchanged over HTTP. Pipeline results are
//! returned as-is; only inputs need dedicated types.

pub mod api;
pub mod mood;

use serde::{Deserialize, Serialize};

pub use api::*;
pub use mood::*;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    /// Catalog access token present
    #[serde(default)]
    pub catalog_configured: bool,
    /// Similarity API key present
    #[serde(default)]
    pub similarity_configured: bool,
    #[serde(default)]
    pub uptime_s: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Configuration response (subset of config safe to expose)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub catalog: CatalogInfo,
    pub similarity: SimilarityInfo,
    pub pipeline: PipelineInfo,
    pub matcher: MatcherInfo,
    pub server: ServerInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogInfo {
    pub base_url: String,
    pub market: String,
    pub configured: bool,
    pub timeout_s: u64,
    pub features_timeout_s: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityInfo {
    pub configured: bool,
    pub min_match: f64,
    pub expansion_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineInfo {
    pub concurrency: usize,
    pub feature_batch_size: usize,
    pub max_scenes: usize,
    pub default_tracks_per_scene: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherInfo {
    pub valence_tolerance: f64,
    pub energy_tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub host: String,
    pub port: u16,
}
