//! Permanent character bans.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use muster_core::error::RosterError;
use muster_core::events::LineupEvent;
use muster_core::result::RosterResult;
use muster_core::types::{BanId, CharacterId, EventId};
use muster_entity::ban::RaidBan;
use muster_store::RosterStore;

use crate::context::RequestContext;
use crate::lineup::ledger;

/// Result of issuing a ban: the record plus any lineup fallout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanOutcome {
    /// The ban record.
    pub ban: RaidBan,
    /// Removal and promotion events caused by kicking a live signup.
    pub events: Vec<LineupEvent>,
}

/// Ban subsystem: permanent (event, character) exclusions.
#[derive(Debug, Clone)]
pub struct BanService {
    store: Arc<dyn RosterStore>,
}

impl BanService {
    /// Creates a new ban service.
    pub fn new(store: Arc<dyn RosterStore>) -> Self {
        Self { store }
    }

    /// Ban a character from an event.
    ///
    /// A live signup for the character is removed as part of the ban, and
    /// the freed role slot (if any) is refilled from the bench.
    pub async fn ban(
        &self,
        ctx: &RequestContext,
        event_id: EventId,
        character_id: CharacterId,
        reason: Option<String>,
    ) -> RosterResult<BanOutcome> {
        let mut tx = self.store.begin().await?;

        if tx.ban_for(event_id, character_id).await?.is_some() {
            return Err(RosterError::conflict(
                "character is already banned from this event",
            ));
        }
        if tx.character(character_id).await?.is_none() {
            return Err(RosterError::not_found(format!(
                "character {character_id} not found"
            )));
        }

        let ban = RaidBan {
            id: BanId::new(),
            event_id,
            character_id,
            banned_by: ctx.actor_id,
            reason,
            created_at: Utc::now(),
        };
        tx.insert_ban(&ban).await?;

        // Ban-triggered removal of the character's signup.
        let mut events = Vec::new();
        if let Some(signup) = tx.signup_by_character(event_id, character_id).await? {
            let was_role_slotted = tx.has_role_slot(signup.id).await?;
            tx.remove_slots_for_signup(signup.id).await?;
            tx.delete_signup(signup.id).await?;
            events.push(LineupEvent::Removed {
                signup_id: signup.id,
                event_id,
            });
            if was_role_slotted {
                if let Some(promoted) =
                    ledger::promote_first_eligible(&mut *tx, event_id, signup.chosen_role).await?
                {
                    events.push(LineupEvent::Promoted {
                        signup_id: promoted.id,
                        event_id,
                        role: signup.chosen_role,
                    });
                }
            }
        }

        tx.commit().await?;
        info!(
            %event_id,
            %character_id,
            actor = %ctx.actor_id,
            "character banned from event"
        );
        Ok(BanOutcome { ban, events })
    }

    /// Lift a ban. Returns whether a record was removed.
    pub async fn unban(
        &self,
        ctx: &RequestContext,
        event_id: EventId,
        character_id: CharacterId,
    ) -> RosterResult<bool> {
        let mut tx = self.store.begin().await?;
        let removed = tx.delete_ban(event_id, character_id).await?;
        tx.commit().await?;
        if removed {
            info!(%event_id, %character_id, actor = %ctx.actor_id, "ban lifted");
        }
        Ok(removed)
    }

    /// Whether a character is banned from an event.
    pub async fn is_banned(
        &self,
        event_id: EventId,
        character_id: CharacterId,
    ) -> RosterResult<bool> {
        let mut tx = self.store.begin().await?;
        Ok(tx.ban_for(event_id, character_id).await?.is_some())
    }

    /// All bans for an event, newest first.
    pub async fn list_bans(&self, event_id: EventId) -> RosterResult<Vec<RaidBan>> {
        let mut tx = self.store.begin().await?;
        tx.bans_for_event(event_id).await
    }
}
