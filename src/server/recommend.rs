//! Recommendation endpoints.

use axum::extract::State;
use tracing::debug;

use super::extractors::MsgPackExtractor;
use super::routes::MsgPack;
use super::AppState;
use crate::error::{AppError, Result};
use crate::pipeline::Recommendation;
use crate::types::{RecommendRequest, ScenesRequest, ScenesResponse};

/// Recommend tracks for one intent
///
/// POST /api/v1/recommend
pub async fn recommend(
    State(state): State<AppState>,
    MsgPackExtractor(request): MsgPackExtractor<RecommendRequest>,
) -> Result<MsgPack<Recommendation>> {
    // A single list gets the room of two scenes
    let default_limit = state.config.pipeline.default_tracks_per_scene as usize * 2;
    let intent = request.into_intent(default_limit)?;

    debug!(keywords = %intent.keywords, genres = ?intent.genres, "Recommend request");
    Ok(MsgPack(state.recommender.recommend_one(&intent).await))
}

/// Recommend tracks for an ordered list of scenes
///
/// POST /api/v1/recommend/scenes
pub async fn recommend_scenes(
    State(state): State<AppState>,
    MsgPackExtractor(request): MsgPackExtractor<ScenesRequest>,
) -> Result<MsgPack<ScenesResponse>> {
    let max_scenes = state.recommender.max_scenes();
    if request.scenes.is_empty() {
        return Err(AppError::BadRequest("At least one scene is required".to_string()));
    }
    if request.scenes.len() > max_scenes {
        return Err(AppError::BadRequest(format!(
            "Too many scenes: {} (max {max_scenes})",
            request.scenes.len()
        )));
    }

    let default_limit = state.config.pipeline.default_tracks_per_scene as usize;
    let scenes = request
        .scenes
        .into_iter()
        .enumerate()
        .map(|(i, scene)| scene.into_scene(i, default_limit))
        .collect::<Result<Vec<_>>>()?;

    let scenes = state.recommender.recommend_scenes(scenes).await;
    Ok(MsgPack(ScenesResponse { scenes }))
}
