//! Named mood definitions.
//!
//! Each named mood maps to a fixed [`MoodProfile`] of acoustic targets. The
//! table is static; callers pick a profile by id or derive the nearest one.

use serde::{Deserialize, Serialize};

use super::MoodProfile;

/// Named mood category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodKind {
    Upbeat,
    Melancholic,
    Romantic,
    Adventurous,
    Peaceful,
    Energetic,
    Intense,
    Nostalgic,
    Dreamy,
    Chill,
    Balanced,
}

impl std::fmt::Display for MoodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.definition().id)
    }
}

impl MoodKind {
    /// Static definition for this mood
    pub fn definition(&self) -> &'static MoodDefinition {
        match self {
            MoodKind::Upbeat => &MOOD_UPBEAT,
            MoodKind::Melancholic => &MOOD_MELANCHOLIC,
            MoodKind::Romantic => &MOOD_ROMANTIC,
            MoodKind::Adventurous => &MOOD_ADVENTUROUS,
            MoodKind::Peaceful => &MOOD_PEACEFUL,
            MoodKind::Energetic => &MOOD_ENERGETIC,
            MoodKind::Intense => &MOOD_INTENSE,
            MoodKind::Nostalgic => &MOOD_NOSTALGIC,
            MoodKind::Dreamy => &MOOD_DREAMY,
            MoodKind::Chill => &MOOD_CHILL,
            MoodKind::Balanced => &MOOD_BALANCED,
        }
    }

    /// Target profile for this mood
    pub fn profile(&self) -> MoodProfile {
        self.definition().profile
    }
}

/// A named mood with its acoustic targets
#[derive(Debug, Clone)]
pub struct MoodDefinition {
    /// Mood identifier (lowercase, `snake_case`)
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    pub kind: MoodKind,
    /// Short human description
    pub description: &'static str,
    pub profile: MoodProfile,
}

pub const MOOD_UPBEAT: MoodDefinition = MoodDefinition {
    id: "upbeat",
    name: "Upbeat",
    kind: MoodKind::Upbeat,
    description: "happy, energetic",
    profile: MoodProfile {
        target_valence: 0.8,
        target_energy: 0.8,
        target_danceability: 0.7,
        target_tempo: 120.0,
        target_acousticness: 0.2,
    },
};

pub const MOOD_MELANCHOLIC: MoodDefinition = MoodDefinition {
    id: "melancholic",
    name: "Melancholic",
    kind: MoodKind::Melancholic,
    description: "sad, reflective",
    profile: MoodProfile {
        target_valence: 0.2,
        target_energy: 0.3,
        target_danceability: 0.3,
        target_tempo: 80.0,
        target_acousticness: 0.6,
    },
};

pub const MOOD_ROMANTIC: MoodDefinition = MoodDefinition {
    id: "romantic",
    name: "Romantic",
    kind: MoodKind::Romantic,
    description: "warm, tender",
    profile: MoodProfile {
        target_valence: 0.6,
        target_energy: 0.4,
        target_danceability: 0.5,
        target_tempo: 90.0,
        target_acousticness: 0.4,
    },
};

pub const MOOD_ADVENTUROUS: MoodDefinition = MoodDefinition {
    id: "adventurous",
    name: "Adventurous",
    kind: MoodKind::Adventurous,
    description: "bold, exciting",
    profile: MoodProfile {
        target_valence: 0.7,
        target_energy: 0.7,
        target_danceability: 0.6,
        target_tempo: 130.0,
        target_acousticness: 0.3,
    },
};

pub const MOOD_PEACEFUL: MoodDefinition = MoodDefinition {
    id: "peaceful",
    name: "Peaceful",
    kind: MoodKind::Peaceful,
    description: "calm, serene",
    profile: MoodProfile {
        target_valence: 0.5,
        target_energy: 0.2,
        target_danceability: 0.3,
        target_tempo: 70.0,
        target_acousticness: 0.8,
    },
};

pub const MOOD_ENERGETIC: MoodDefinition = MoodDefinition {
    id: "energetic",
    name: "Energetic",
    kind: MoodKind::Energetic,
    description: "high intensity",
    profile: MoodProfile {
        target_valence: 0.7,
        target_energy: 0.9,
        target_danceability: 0.8,
        target_tempo: 140.0,
        target_acousticness: 0.1,
    },
};

pub const MOOD_INTENSE: MoodDefinition = MoodDefinition {
    id: "intense",
    name: "Intense",
    kind: MoodKind::Intense,
    description: "dark, powerful",
    profile: MoodProfile {
        target_valence: 0.3,
        target_energy: 0.8,
        target_danceability: 0.5,
        target_tempo: 140.0,
        target_acousticness: 0.2,
    },
};

pub const MOOD_NOSTALGIC: MoodDefinition = MoodDefinition {
    id: "nostalgic",
    name: "Nostalgic",
    kind: MoodKind::Nostalgic,
    description: "wistful, reminiscent",
    profile: MoodProfile {
        target_valence: 0.5,
        target_energy: 0.4,
        target_danceability: 0.4,
        target_tempo: 85.0,
        target_acousticness: 0.5,
    },
};

pub const MOOD_DREAMY: MoodDefinition = MoodDefinition {
    id: "dreamy",
    name: "Dreamy",
    kind: MoodKind::Dreamy,
    description: "ethereal, floating",
    profile: MoodProfile {
        target_valence: 0.6,
        target_energy: 0.3,
        target_danceability: 0.4,
        target_tempo: 75.0,
        target_acousticness: 0.6,
    },
};

pub const MOOD_CHILL: MoodDefinition = MoodDefinition {
    id: "chill",
    name: "Chill",
    kind: MoodKind::Chill,
    description: "relaxed, laid-back",
    profile: MoodProfile {
        target_valence: 0.6,
        target_energy: 0.4,
        target_danceability: 0.5,
        target_tempo: 95.0,
        target_acousticness: 0.4,
    },
};

pub const MOOD_BALANCED: MoodDefinition = MoodDefinition {
    id: "balanced",
    name: "Balanced",
    kind: MoodKind::Balanced,
    description: "neutral, versatile",
    profile: MoodProfile {
        target_valence: 0.5,
        target_energy: 0.5,
        target_danceability: 0.5,
        target_tempo: 110.0,
        target_acousticness: 0.4,
    },
};

/// Every named mood, balanced last
pub const ALL_MOODS: &[MoodDefinition] = &[
    MOOD_UPBEAT,
    MOOD_MELANCHOLIC,
    MOOD_ROMANTIC,
    MOOD_ADVENTUROUS,
    MOOD_PEACEFUL,
    MOOD_ENERGETIC,
    MOOD_INTENSE,
    MOOD_NOSTALGIC,
    MOOD_DREAMY,
    MOOD_CHILL,
    MOOD_BALANCED,
];

/// Find a mood by ID (case-insensitive)
pub fn get_mood_by_id(id: &str) -> Option<&'static MoodDefinition> {
    let id = id.trim();
    ALL_MOODS.iter().find(|m| m.id.eq_ignore_ascii_case(id))
}
