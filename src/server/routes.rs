//! HTTP route handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::types::{
    CatalogInfo, ConfigResponse, HealthResponse, HealthStatus, MatcherInfo, PipelineInfo, ServerInfo,
    SimilarityInfo,
};

use super::AppState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `MessagePack` response wrapper
pub struct MsgPack<T>(pub T);

impl<T: serde::Serialize> IntoResponse for MsgPack<T> {
    fn into_response(self) -> Response {
        match rmp_serde::to_vec_named(&self.0) {
            Ok(bytes) => (
                StatusCode::OK,
                [("content-type", "application/msgpack")],
                bytes,
            )
                .into_response(),
            Err(e) => AppError::Internal(format!("Failed to serialize response: {e}")).into_response(),
        }
    }
}

/// Health check endpoint
///
/// GET /api/v1/health
pub async fn health(State(state): State<AppState>) -> MsgPack<HealthResponse> {
    let catalog_configured = state.catalog_configured();

    // Without a catalog token every search degrades to nothing
    let status = if catalog_configured {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    MsgPack(HealthResponse {
        status,
        version: VERSION.to_string(),
        catalog_configured,
        similarity_configured: state.similarity_configured(),
        uptime_s: state.uptime_seconds(),
    })
}

/// Configuration endpoint
///
/// GET /api/v1/config
pub async fn config(State(state): State<AppState>) -> MsgPack<ConfigResponse> {
    let config = &state.config;

    MsgPack(ConfigResponse {
        catalog: CatalogInfo {
            base_url: config.catalog.base_url.clone(),
            market: config.catalog.market.clone(),
            configured: state.catalog_configured(),
            timeout_s: config.catalog.timeout_s,
            features_timeout_s: config.catalog.features_timeout_s,
        },
        similarity: SimilarityInfo {
            configured: state.similarity_configured(),
            min_match: config.similarity.min_match,
            expansion_limit: config.similarity.expansion_limit,
        },
        pipeline: PipelineInfo {
            concurrency: config.pipeline.effective_concurrency(),
            feature_batch_size: config.pipeline.effective_batch_size(),
            max_scenes: state.recommender.max_scenes(),
            default_tracks_per_scene: config.pipeline.default_tracks_per_scene,
        },
        matcher: MatcherInfo {
            valence_tolerance: config.matcher.valence_tolerance,
            energy_tolerance: config.matcher.energy_tolerance,
        },
        server: ServerInfo {
            host: config.server.host.clone(),
            port: config.server.port,
        },
    })
}
