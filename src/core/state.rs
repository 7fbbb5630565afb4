use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Placeholder for unknown text attributes.
pub const UNKNOWN_TEXT: &str = "—";
/// Placeholder for an unknown age.
pub const UNKNOWN_AGE: u32 = 0;

pub fn is_placeholder_text(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value == UNKNOWN_TEXT
}

pub fn is_placeholder_age(value: u32) -> bool {
    value == UNKNOWN_AGE
}

/// One scene of a project as handed to the engine.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SceneUnit {
    pub id: String,
    pub ordinal: u32,
}

impl SceneUnit {
    pub fn new(id: impl Into<String>, ordinal: u32) -> Self {
        Self {
            id: id.into(),
            ordinal,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Role {
    Lead,
    #[default]
    Supporting,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Risk {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedActor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub risk: Risk,
    pub reason: String,
    pub available: bool,
    pub fee: f64,
    pub age: u32,
    pub recent_works: Vec<String>,
    pub match_count: u32,
    pub matching_traits: Vec<String>,
    pub movie_personality: Vec<String>,
    pub movies_played_in: Vec<String>,
}

/// The cumulative record for one character identity.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CharacterProfile {
    /// Normalized key, see [`crate::utils::normalize::normalize`].
    pub id: String,
    pub name: String,
    pub role: Role,
    pub scenes: BTreeSet<u32>,
    pub age: u32,
    pub race: String,
    pub gender: String,
    pub description: String,
    pub personality: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_actor: Option<SuggestedActor>,
}

impl CharacterProfile {
    /// A profile with every scalar attribute set to its placeholder.
    pub fn placeholder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: Role::Supporting,
            scenes: BTreeSet::new(),
            age: UNKNOWN_AGE,
            race: UNKNOWN_TEXT.to_string(),
            gender: UNKNOWN_TEXT.to_string(),
            description: UNKNOWN_TEXT.to_string(),
            personality: BTreeSet::new(),
            suggested_actor: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert!(is_placeholder_text(UNKNOWN_TEXT));
        assert!(is_placeholder_text("   "));
        assert!(!is_placeholder_text("Female"));
        assert!(is_placeholder_age(0));
        assert!(!is_placeholder_age(31));
    }

    #[test]
    fn test_profile_serializes_camel_case_sorted_scenes() {
        let mut profile = CharacterProfile::placeholder("ava_cole", "Ava Cole");
        profile.role = Role::Lead;
        profile.scenes.extend([3, 1, 2]);

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["role"], "Lead");
        assert_eq!(value["scenes"], serde_json::json!([1, 2, 3]));
        assert!(value.get("suggestedActor").is_none());
    }
}
