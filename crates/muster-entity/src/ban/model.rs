//! Permanent character ban entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use muster_core::types::{BanId, CharacterId, EventId, UserId};

/// Permanent exclusion of one character from one event.
///
/// Unique per (event, character). Consulted before every signup creation;
/// lifted only by explicit deletion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RaidBan {
    /// Unique ban identifier.
    pub id: BanId,
    /// The event the character is excluded from.
    pub event_id: EventId,
    /// The excluded character.
    pub character_id: CharacterId,
    /// The administrator who issued the ban.
    pub banned_by: UserId,
    /// Optional reason shown to officers.
    pub reason: Option<String>,
    /// When the ban was issued.
    pub created_at: DateTime<Utc>,
}
