//! Recommendation intents and the source that produces them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mood::MoodProfile;

/// Upper bound on tracks returned for one intent
pub const MAX_RESULT_LIMIT: usize = 50;

/// Upper bound on seed artists considered
pub const MAX_SEED_ARTISTS: usize = 3;

/// What the caller is asking for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub seed_artists: Vec<String>,
    #[serde(default)]
    pub mood: Option<MoodProfile>,
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
}

fn default_result_limit() -> usize {
    20
}

impl Default for Intent {
    fn default() -> Self {
        Self {
            keywords: String::new(),
            genres: Vec::new(),
            seed_artists: Vec::new(),
            mood: None,
            result_limit: default_result_limit(),
        }
    }
}

impl Intent {
    /// Result limit clamped into `[1, 50]`
    pub fn effective_limit(&self) -> usize {
        self.result_limit.clamp(1, MAX_RESULT_LIMIT)
    }

    /// Copy with the limit clamped, seeds trimmed and deduplicated
    /// (case-insensitively, first spelling wins) and the mood clamped.
    pub fn normalized(&self) -> Self {
        let mut seeds: Vec<String> = Vec::new();
        for artist in &self.seed_artists {
            let artist = artist.trim();
            if artist.is_empty() || seeds.iter().any(|s| s.eq_ignore_ascii_case(artist)) {
                continue;
            }
            seeds.push(artist.to_string());
            if seeds.len() == MAX_SEED_ARTISTS {
                break;
            }
        }

        Self {
            keywords: self.keywords.trim().to_string(),
            genres: self.genres.clone(),
            seed_artists: seeds,
            mood: self.mood.map(MoodProfile::normalized),
            result_limit: self.effective_limit(),
        }
    }
}

/// One scene of a multi-part request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneIntent {
    pub scene_number: u32,
    #[serde(default)]
    pub description: String,
    pub intent: Intent,
}

/// What an intent source made of a free-text prompt
#[derive(Debug, Clone, PartialEq)]
pub enum IntentAnalysis {
    Direct(Intent),
    Scenes(Vec<SceneIntent>),
}

#[derive(Debug, Error)]
pub enum IntentError {
    #[error("intent source unavailable: {0}")]
    Unavailable(String),
}

/// Turns a free-text prompt into one or more intents
#[async_trait]
pub trait IntentSource: Send + Sync {
    async fn analyze(&self, prompt: &str, genres: &[String]) -> Result<IntentAnalysis, IntentError>;
}

/// Intent used when no source is reachable.
///
/// It has no keywords, genres or artists, so planning yields no queries
/// and the result is empty.
pub fn fallback_intent(result_limit: usize) -> Intent {
    Intent {
        result_limit,
        ..Default::default()
    }
}
