//! Character replacement requests and their resolution.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use muster_core::error::RosterError;
use muster_core::events::LineupEvent;
use muster_core::result::RosterResult;
use muster_core::types::{CharacterId, ReplacementId, SignupId};
use muster_entity::character::class::validate_class_role;
use muster_entity::replacement::{CharacterReplacement, ReplacementAction, ReplacementStatus};
use muster_store::{RosterStore, RosterTx};

use crate::context::RequestContext;
use crate::lineup::ledger;

/// Result of resolving a replacement: the terminal request plus any
/// lineup fallout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacementOutcome {
    /// The request in its terminal state.
    pub request: CharacterReplacement,
    /// Removal and promotion events caused by the resolution.
    pub events: Vec<LineupEvent>,
}

/// Replacement subsystem: officer-raised character swap proposals.
#[derive(Debug, Clone)]
pub struct ReplacementService {
    store: Arc<dyn RosterStore>,
}

impl ReplacementService {
    /// Creates a new replacement service.
    pub fn new(store: Arc<dyn RosterStore>) -> Self {
        Self { store }
    }

    /// Fetch a replacement request by id.
    pub async fn get_request(
        &self,
        id: ReplacementId,
    ) -> RosterResult<Option<CharacterReplacement>> {
        let mut tx = self.store.begin().await?;
        tx.replacement(id).await
    }

    /// Raise a replacement request against an existing signup.
    ///
    /// Fails with [`RosterError::CharacterConflict`] when another live
    /// signup already uses the proposed character on the event; the caller
    /// must resolve that conflict first.
    pub async fn request(
        &self,
        ctx: &RequestContext,
        signup_id: SignupId,
        new_character_id: CharacterId,
        reason: Option<String>,
    ) -> RosterResult<CharacterReplacement> {
        let mut tx = self.store.begin().await?;

        let signup = tx
            .signup(signup_id)
            .await?
            .ok_or_else(|| RosterError::not_found(format!("signup {signup_id} not found")))?;
        if !signup.is_active() {
            return Err(RosterError::conflict("signup has been declined"));
        }
        if signup.character_id == new_character_id {
            return Err(RosterError::conflict(
                "replacement proposes the character already signed up",
            ));
        }
        if tx.character(new_character_id).await?.is_none() {
            return Err(RosterError::not_found(format!(
                "character {new_character_id} not found"
            )));
        }
        if let Some(conflicting) = tx
            .signup_by_character(signup.event_id, new_character_id)
            .await?
        {
            if conflicting.is_active() {
                return Err(RosterError::CharacterConflict {
                    character_id: new_character_id,
                });
            }
        }

        let request = CharacterReplacement {
            id: ReplacementId::new(),
            signup_id,
            old_character_id: signup.character_id,
            new_character_id,
            requested_by: ctx.actor_id,
            reason,
            status: ReplacementStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        };
        tx.insert_replacement(&request).await?;
        tx.commit().await?;

        info!(
            replacement_id = %request.id,
            %signup_id,
            actor = %ctx.actor_id,
            "character replacement requested"
        );
        Ok(request)
    }

    /// Resolve a pending replacement request. Terminal: resolving twice
    /// fails with a conflict.
    pub async fn resolve(
        &self,
        ctx: &RequestContext,
        id: ReplacementId,
        action: ReplacementAction,
    ) -> RosterResult<ReplacementOutcome> {
        let mut tx = self.store.begin().await?;

        let request = tx
            .replacement(id)
            .await?
            .ok_or_else(|| RosterError::not_found(format!("replacement {id} not found")))?;
        if request.status.is_resolved() {
            return Err(RosterError::conflict(
                "replacement request already resolved",
            ));
        }

        let (status, events) = match action {
            ReplacementAction::Decline => (ReplacementStatus::Declined, Vec::new()),
            ReplacementAction::Confirm => {
                let events = self.confirm(&mut *tx, &request).await?;
                (ReplacementStatus::Confirmed, events)
            }
            ReplacementAction::Leave => {
                let events = self.leave(&mut *tx, &request).await?;
                (ReplacementStatus::Left, events)
            }
        };

        let resolved = tx
            .update_replacement_status(id, status, Utc::now())
            .await?;
        tx.commit().await?;

        info!(
            replacement_id = %id,
            status = ?status,
            actor = %ctx.actor_id,
            "character replacement resolved"
        );
        Ok(ReplacementOutcome {
            request: resolved,
            events,
        })
    }

    /// Swap the character in place: placement keeps its group and ordinal.
    /// A conflicting signup for the new character that appeared since the
    /// request was raised is removed to make room.
    async fn confirm(
        &self,
        tx: &mut dyn RosterTx,
        request: &CharacterReplacement,
    ) -> RosterResult<Vec<LineupEvent>> {
        let signup = tx.signup(request.signup_id).await?.ok_or_else(|| {
            RosterError::conflict("signup behind the replacement no longer exists")
        })?;
        let character = tx.character(request.new_character_id).await?.ok_or_else(|| {
            RosterError::not_found(format!(
                "character {} not found",
                request.new_character_id
            ))
        })?;
        validate_class_role(character.class, signup.chosen_role)?;

        let mut events = Vec::new();
        if let Some(conflicting) = tx
            .signup_by_character(signup.event_id, request.new_character_id)
            .await?
        {
            if conflicting.id != signup.id {
                let was_role_slotted = tx.has_role_slot(conflicting.id).await?;
                tx.remove_slots_for_signup(conflicting.id).await?;
                tx.delete_signup(conflicting.id).await?;
                events.push(LineupEvent::Removed {
                    signup_id: conflicting.id,
                    event_id: signup.event_id,
                });
                if was_role_slotted {
                    if let Some(promoted) = ledger::promote_first_eligible(
                        tx,
                        signup.event_id,
                        conflicting.chosen_role,
                    )
                    .await?
                    {
                        events.push(LineupEvent::Promoted {
                            signup_id: promoted.id,
                            event_id: signup.event_id,
                            role: conflicting.chosen_role,
                        });
                    }
                }
            }
        }

        tx.update_signup_character(signup.id, request.new_character_id)
            .await?;
        Ok(events)
    }

    /// The participant leaves instead: full removal with promotion.
    async fn leave(
        &self,
        tx: &mut dyn RosterTx,
        request: &CharacterReplacement,
    ) -> RosterResult<Vec<LineupEvent>> {
        let mut events = Vec::new();
        if let Some(signup) = tx.signup(request.signup_id).await? {
            let was_role_slotted = tx.has_role_slot(signup.id).await?;
            tx.remove_slots_for_signup(signup.id).await?;
            tx.delete_signup(signup.id).await?;
            events.push(LineupEvent::Removed {
                signup_id: signup.id,
                event_id: signup.event_id,
            });
            if was_role_slotted {
                if let Some(promoted) =
                    ledger::promote_first_eligible(tx, signup.event_id, signup.chosen_role).await?
                {
                    events.push(LineupEvent::Promoted {
                        signup_id: promoted.id,
                        event_id: signup.event_id,
                        role: signup.chosen_role,
                    });
                }
            }
        }
        Ok(events)
    }
}
