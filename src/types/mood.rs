//! API types for listing the named moods.

use serde::{Deserialize, Serialize};

use crate::mood::{MoodDefinition, MoodKind, MoodProfile};

/// One named mood and its targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodInfo {
    pub id: String,
    pub name: String,
    pub kind: MoodKind,
    pub description: String,
    pub profile: MoodProfile,
}

impl From<&MoodDefinition> for MoodInfo {
    fn from(m: &MoodDefinition) -> Self {
        Self {
            id: m.id.to_string(),
            name: m.name.to_string(),
            kind: m.kind,
            description: m.description.to_string(),
            profile: m.profile,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMoodsResponse {
    pub moods: Vec<MoodInfo>,
}
