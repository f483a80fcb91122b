//! Character profile entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use muster_core::types::{CharacterId, UserId};

use super::class::CharacterClass;

/// Collaborator-supplied character metadata consumed by the engine.
///
/// The engine reads the class for capability checks and the `is_main` flag
/// as the promotion fallback tie-break; it never mutates profiles.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CharacterProfile {
    /// Unique character identifier.
    pub id: CharacterId,
    /// The participant who owns the character.
    pub user_id: UserId,
    /// In-game character name.
    pub name: String,
    /// Character class, driving the capability table.
    #[sqlx(rename = "class_name")]
    pub class: CharacterClass,
    /// Whether this is the participant's main character.
    pub is_main: bool,
    /// Inactive characters cannot sign up.
    pub is_active: bool,
    /// When the profile was recorded.
    pub created_at: DateTime<Utc>,
}

impl CharacterProfile {
    /// Convenience constructor with sensible defaults for a fresh profile.
    pub fn new(
        id: CharacterId,
        user_id: UserId,
        name: impl Into<String>,
        class: CharacterClass,
        is_main: bool,
    ) -> Self {
        Self {
            id,
            user_id,
            name: name.into(),
            class,
            is_main,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
