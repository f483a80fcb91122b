//! Character replacement request model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use muster_core::types::{CharacterId, ReplacementId, SignupId, UserId};

/// Status of a character replacement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "replacement_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReplacementStatus {
    /// Awaiting resolution.
    Pending,
    /// Character swapped in place.
    Confirmed,
    /// Request rejected; signup unchanged.
    Declined,
    /// Participant left the event instead; signup deleted.
    Left,
}

impl ReplacementStatus {
    /// Whether the request has reached a terminal state.
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ReplacementStatus::Pending)
    }
}

/// The action taken when resolving a pending replacement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementAction {
    /// Swap the character in place.
    Confirm,
    /// Reject the request.
    Decline,
    /// Delete the signup and leave the event.
    Leave,
}

/// A pending proposal to swap the character behind an existing signup.
///
/// Created pending, resolved exactly once, terminal thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CharacterReplacement {
    /// Unique request identifier.
    pub id: ReplacementId,
    /// The signup whose character is to be swapped.
    pub signup_id: SignupId,
    /// The character currently on the signup.
    pub old_character_id: CharacterId,
    /// The proposed replacement character.
    pub new_character_id: CharacterId,
    /// The officer who raised the request.
    pub requested_by: UserId,
    /// Optional reason shown to the participant.
    pub reason: Option<String>,
    /// Current status.
    pub status: ReplacementStatus,
    /// When the request was raised.
    pub created_at: DateTime<Utc>,
    /// When the request was resolved, if it has been.
    pub resolved_at: Option<DateTime<Utc>>,
}
