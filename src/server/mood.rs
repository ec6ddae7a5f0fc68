//! Named mood endpoints.

use axum::extract::{Path, State};

use super::routes::MsgPack;
use super::AppState;
use crate::error::{AppError, Result};
use crate::mood::{get_mood_by_id, ALL_MOODS};
use crate::types::{ListMoodsResponse, MoodInfo};

/// List every named mood and its targets
///
/// GET /api/v1/moods
pub async fn list_moods(State(_state): State<AppState>) -> MsgPack<ListMoodsResponse> {
    let moods = ALL_MOODS.iter().map(MoodInfo::from).collect();
    MsgPack(ListMoodsResponse { moods })
}

/// GET /api/v1/moods/:id
pub async fn get_mood(
    State(_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<MsgPack<MoodInfo>> {
    get_mood_by_id(&id)
        .map(|m| MsgPack(MoodInfo::from(m)))
        .ok_or_else(|| AppError::NotFound(format!("Mood {id}")))
}
