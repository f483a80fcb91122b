//! Signup entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use muster_core::types::{CharacterId, EventId, Role, SignupId, UserId};

/// One participant's declared intent to attend an event with one specific
/// character in one chosen role.
///
/// Unique per (event, character). The signup row carries intent only;
/// actual occupancy is always derived from the slot ledger, never from a
/// status field.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Signup {
    /// Unique signup identifier.
    pub id: SignupId,
    /// The event being signed up for.
    pub event_id: EventId,
    /// The participant who owns the signup.
    pub user_id: UserId,
    /// The character attending.
    pub character_id: CharacterId,
    /// The role the participant wants to play.
    pub chosen_role: Role,
    /// Optional specialization within the role.
    pub chosen_spec: Option<String>,
    /// Free-text note for the officers.
    pub note: Option<String>,
    /// Set when the participant declined; declined signups keep their row
    /// but hold no placement and are skipped by promotion.
    pub declined_at: Option<DateTime<Utc>>,
    /// When the signup was created.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Signup {
    /// Whether the signup is still live (not declined).
    pub fn is_active(&self) -> bool {
        self.declined_at.is_none()
    }
}

/// Data required to create a new signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSignup {
    /// The event being signed up for.
    pub event_id: EventId,
    /// The participant signing up.
    pub user_id: UserId,
    /// The character attending.
    pub character_id: CharacterId,
    /// The requested role.
    pub chosen_role: Role,
    /// Optional specialization within the role.
    pub chosen_spec: Option<String>,
    /// Free-text note for the officers.
    pub note: Option<String>,
}
