//! API request and response types for recommendations.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::mood::{get_mood_by_id, MoodProfile};
use crate::pipeline::{Intent, SceneIntent, SceneRecommendation};

/// Request for one list of tracks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendRequest {
    /// Free-text keywords
    #[serde(default)]
    pub keywords: String,
    /// Genre tags; unknown tags are ignored
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub seed_artists: Vec<String>,
    /// Named mood, e.g. "melancholic"
    #[serde(default)]
    pub mood: Option<String>,
    /// Explicit targets; wins over `mood` when both are given
    #[serde(default)]
    pub mood_profile: Option<MoodProfile>,
    /// Number of tracks wanted (clamped to 1..=50)
    #[serde(default)]
    pub limit: Option<usize>,
}

impl RecommendRequest {
    /// Build the pipeline intent, failing on an unknown mood name
    pub fn into_intent(self, default_limit: usize) -> Result<Intent, AppError> {
        let mood = resolve_mood(self.mood.as_deref(), self.mood_profile)?;
        Ok(Intent {
            keywords: self.keywords,
            genres: self.genres,
            seed_artists: self.seed_artists,
            mood,
            result_limit: self.limit.unwrap_or(default_limit),
        })
    }
}

/// One scene of a scene request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneRequest {
    /// Defaults to the scene's 1-based position in the request
    #[serde(default)]
    pub scene_number: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub seed_artists: Vec<String>,
    #[serde(default)]
    pub mood: Option<String>,
    #[serde(default)]
    pub mood_profile: Option<MoodProfile>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SceneRequest {
    pub fn into_scene(self, position: usize, default_limit: usize) -> Result<SceneIntent, AppError> {
        let mood = resolve_mood(self.mood.as_deref(), self.mood_profile)?;
        Ok(SceneIntent {
            scene_number: self.scene_number.unwrap_or(position as u32 + 1),
            description: self.description.unwrap_or_default(),
            intent: Intent {
                keywords: self.keywords,
                genres: self.genres,
                seed_artists: self.seed_artists,
                mood,
                result_limit: self.limit.unwrap_or(default_limit),
            },
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenesRequest {
    #[serde(default)]
    pub scenes: Vec<SceneRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenesResponse {
    pub scenes: Vec<SceneRecommendation>,
}

fn resolve_mood(name: Option<&str>, profile: Option<MoodProfile>) -> Result<Option<MoodProfile>, AppError> {
    if let Some(profile) = profile {
        return Ok(Some(profile));
    }
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => get_mood_by_id(name)
            .map(|m| Some(m.profile))
            .ok_or_else(|| AppError::BadRequest(format!("Unknown mood: {name}"))),
        None => Ok(None),
    }
}
