//! Scene Curator
//!
//! Mood-aware track recommendation over a catalog search API that only
//! understands literal text queries. An intent (keywords, genres, seed
//! artists, mood profile) is expanded into several concrete searches whose
//! merged, filtered and feature-enriched results are matched against the
//! target mood, with a fallback cascade that never starves the caller.

pub mod catalog;
pub mod config;
pub mod error;
pub mod features;
pub mod mood;
pub mod pipeline;
pub mod server;
pub mod similarity;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, Result};

pub use mood::{MoodKind, MoodMatcher, MoodProfile, MoodStage};
pub use pipeline::{DedupTracker, Intent, Recommendation, Recommender, SceneIntent, SceneRecommendation};
