//! Lineup slot entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use muster_core::types::{CharacterId, EventId, SignupId, SlotGroup, SlotId, UserId};

/// A placement of a signup into a typed role slot or the bench queue.
///
/// Unique per (event, group, position); a signup holds at most one slot at
/// any time. Bench positions encode FIFO promotion order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LineupSlot {
    /// Unique slot identifier.
    pub id: SlotId,
    /// The event this slot belongs to.
    pub event_id: EventId,
    /// Role group, or the bench pseudo-group.
    #[sqlx(rename = "slot_group")]
    pub group: SlotGroup,
    /// Ordinal position within the group.
    #[sqlx(rename = "slot_index")]
    pub position: i32,
    /// The occupying signup. Only transiently null while a bulk rewrite
    /// is staging.
    pub signup_id: Option<SignupId>,
    /// The occupying character, denormalized for lineup views.
    pub character_id: Option<CharacterId>,
    /// Officer who confirmed the placement, if any.
    pub confirmed_by: Option<UserId>,
    /// When the placement was confirmed.
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl LineupSlot {
    /// Whether this placement occupies role capacity (not the bench).
    pub fn is_role_slot(&self) -> bool {
        self.group.is_role()
    }
}
