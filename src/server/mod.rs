//! HTTP server setup and routing.

mod extractors;
mod mood;
mod recommend;
mod routes;

pub use routes::MsgPack;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::Result;
use crate::pipeline::Recommender;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub recommender: Arc<Recommender>,
    /// Server start time for uptime calculation
    pub started_at: Instant,
}

impl AppState {
    /// State backed by the HTTP catalog and similarity clients
    pub fn new(config: AppConfig) -> Result<Self> {
        let recommender = Recommender::from_config(&config)?;
        Ok(Self::with_recommender(config, recommender))
    }

    /// State with a prebuilt recommender
    pub fn with_recommender(config: AppConfig, recommender: Recommender) -> Self {
        Self {
            config: Arc::new(config),
            recommender: Arc::new(recommender),
            started_at: Instant::now(),
        }
    }

    pub fn catalog_configured(&self) -> bool {
        self.config
            .catalog
            .access_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }

    pub fn similarity_configured(&self) -> bool {
        self.config
            .similarity
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Creates the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(routes::health))
        .route("/config", get(routes::config))
        .route("/moods", get(mood::list_moods))
        .route("/moods/:id", get(mood::get_mood))
        .route("/recommend", post(recommend::recommend))
        .route("/recommend/scenes", post(recommend::recommend_scenes));

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
