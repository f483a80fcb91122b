//! Signup creation, updates, decline, and deletion with automatic bench
//! placement and promotion.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use muster_core::config::limits::DefaultLimitsConfig;
use muster_core::error::RosterError;
use muster_core::events::LineupEvent;
use muster_core::result::RosterResult;
use muster_core::types::{EventId, Role, SignupId};
use muster_entity::character::class::validate_class_role;
use muster_entity::signup::{NewSignup, Signup};
use muster_store::RosterStore;

use crate::context::RequestContext;
use crate::lineup::ledger;

/// Result of a signup mutation: the signup plus the events it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupOutcome {
    /// The signup after the operation.
    pub signup: Signup,
    /// Placements, demotions, and promotions for the notification layer.
    pub events: Vec<LineupEvent>,
}

/// Fields a participant (or an officer on their behalf) may edit.
/// `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupUpdate {
    /// New role; triggers re-placement on the bench when changed.
    pub chosen_role: Option<Role>,
    /// New specialization.
    pub chosen_spec: Option<String>,
    /// New note.
    pub note: Option<String>,
}

/// Signup lifecycle service.
#[derive(Debug, Clone)]
pub struct SignupService {
    store: Arc<dyn RosterStore>,
    defaults: DefaultLimitsConfig,
}

impl SignupService {
    /// Creates a new signup service.
    pub fn new(store: Arc<dyn RosterStore>, defaults: DefaultLimitsConfig) -> Self {
        Self { store, defaults }
    }

    /// Fetch a signup by id.
    pub async fn get_signup(&self, id: SignupId) -> RosterResult<Option<Signup>> {
        let mut tx = self.store.begin().await?;
        tx.signup(id).await
    }

    /// All signups for an event, oldest first.
    pub async fn list_signups(&self, event_id: EventId) -> RosterResult<Vec<Signup>> {
        let mut tx = self.store.begin().await?;
        tx.signups_for_event(event_id).await
    }

    /// Create a signup, placing it in a role slot when capacity allows or
    /// on the bench otherwise.
    ///
    /// `force_bench` skips the capacity check and benches directly; without
    /// it a full role fails with [`RosterError::RoleFull`] so the caller
    /// can offer the bench choice. The capacity check takes a serializing
    /// lock so two concurrent signups cannot share the last slot.
    pub async fn create_signup(
        &self,
        ctx: &RequestContext,
        new: NewSignup,
        force_bench: bool,
    ) -> RosterResult<SignupOutcome> {
        let mut tx = self.store.begin().await?;

        if tx.ban_for(new.event_id, new.character_id).await?.is_some() {
            return Err(RosterError::PermanentlyExcluded {
                character_id: new.character_id,
            });
        }

        let character = tx.character(new.character_id).await?.ok_or_else(|| {
            RosterError::not_found(format!("character {} not found", new.character_id))
        })?;
        if !character.is_active {
            return Err(RosterError::conflict("character is inactive"));
        }
        if character.user_id != new.user_id {
            return Err(RosterError::conflict(
                "character does not belong to the signing participant",
            ));
        }
        validate_class_role(character.class, new.chosen_role)?;

        let existing = tx
            .signup_by_character(new.event_id, new.character_id)
            .await?;
        if let Some(previous) = &existing {
            if previous.is_active() {
                return Err(RosterError::conflict(
                    "character already has a signup for this event",
                ));
            }
        }

        let group = new.chosen_role.slot_group();
        let mut bench = force_bench;
        if !bench {
            let capacity = match tx.role_limits(new.event_id).await? {
                Some(limits) => limits.capacity(new.chosen_role),
                None => self.defaults.capacity(new.chosen_role),
            } as i64;
            if capacity <= 0 {
                return Err(RosterError::NoCapacityDefined {
                    role: new.chosen_role,
                });
            }
            let occupied = tx.count_role_slots_locked(new.event_id, group).await?;
            if occupied >= capacity {
                return Err(RosterError::RoleFull {
                    role: new.chosen_role,
                    occupied,
                    capacity,
                });
            }
            // One occupied slot per participant: a second character of the
            // same user waits on the bench even when capacity remains.
            if ledger::user_holds_role_slot(&mut *tx, new.event_id, new.user_id).await? {
                bench = true;
            }
        }

        let signup = match existing {
            Some(previous) => {
                tx.remove_slots_for_signup(previous.id).await?;
                tx.revive_signup(previous.id, &new).await?
            }
            None => tx.insert_signup(&new).await?,
        };

        let mut events = Vec::new();
        if bench {
            ledger::append_to_bench(&mut *tx, &signup).await?;
            if let Some(pos) = ledger::bench_rank(&mut *tx, signup.id).await? {
                events.push(LineupEvent::Benched {
                    signup_id: signup.id,
                    event_id: signup.event_id,
                    role: pos.waiting_for,
                    position: pos.rank,
                });
            }
        } else {
            let slot = ledger::place_in_role(&mut *tx, &signup, group, None, None).await?;
            events.push(LineupEvent::Placed {
                signup_id: signup.id,
                event_id: signup.event_id,
                group: slot.group,
            });
        }

        tx.commit().await?;
        info!(
            signup_id = %signup.id,
            event_id = %signup.event_id,
            actor = %ctx.actor_id,
            role = %signup.chosen_role,
            benched = bench,
            "signup created"
        );
        Ok(SignupOutcome { signup, events })
    }

    /// Edit a signup. A role change drops the current placement, re-places
    /// the signup on the bench tail, and promotes into the freed slot when
    /// one was vacated.
    pub async fn update_signup(
        &self,
        ctx: &RequestContext,
        id: SignupId,
        update: SignupUpdate,
    ) -> RosterResult<SignupOutcome> {
        let mut tx = self.store.begin().await?;

        let signup = tx
            .signup(id)
            .await?
            .ok_or_else(|| RosterError::not_found(format!("signup {id} not found")))?;
        if !signup.is_active() {
            return Err(RosterError::conflict("signup has been declined"));
        }

        let new_role = update.chosen_role.unwrap_or(signup.chosen_role);
        let chosen_spec = update.chosen_spec.or_else(|| signup.chosen_spec.clone());
        let note = update.note.or_else(|| signup.note.clone());

        let mut events = Vec::new();
        let updated = if new_role != signup.chosen_role {
            let character = tx.character(signup.character_id).await?.ok_or_else(|| {
                RosterError::not_found(format!("character {} not found", signup.character_id))
            })?;
            validate_class_role(character.class, new_role)?;

            let was_role_slotted = tx.has_role_slot(id).await?;
            let old_role = signup.chosen_role;
            let updated = tx
                .update_signup_fields(id, new_role, chosen_spec, note)
                .await?;

            tx.remove_slots_for_signup(id).await?;
            ledger::append_to_bench(&mut *tx, &updated).await?;
            if let Some(pos) = ledger::bench_rank(&mut *tx, id).await? {
                events.push(LineupEvent::Benched {
                    signup_id: id,
                    event_id: updated.event_id,
                    role: pos.waiting_for,
                    position: pos.rank,
                });
            }

            if was_role_slotted {
                if let Some(promoted) =
                    ledger::promote_first_eligible(&mut *tx, updated.event_id, old_role).await?
                {
                    events.push(LineupEvent::Promoted {
                        signup_id: promoted.id,
                        event_id: updated.event_id,
                        role: old_role,
                    });
                }
            }
            updated
        } else {
            tx.update_signup_fields(id, new_role, chosen_spec, note)
                .await?
        };

        tx.commit().await?;
        info!(signup_id = %id, actor = %ctx.actor_id, "signup updated");
        Ok(SignupOutcome {
            signup: updated,
            events,
        })
    }

    /// Decline a signup: the participant opts out, the placement is
    /// dropped, and the freed role slot (if any) is refilled from the
    /// bench. Declining an already-declined signup is a no-op.
    pub async fn decline_signup(
        &self,
        ctx: &RequestContext,
        id: SignupId,
    ) -> RosterResult<SignupOutcome> {
        let mut tx = self.store.begin().await?;

        let signup = tx
            .signup(id)
            .await?
            .ok_or_else(|| RosterError::not_found(format!("signup {id} not found")))?;
        if !signup.is_active() {
            return Ok(SignupOutcome {
                signup,
                events: Vec::new(),
            });
        }

        let was_role_slotted = tx.has_role_slot(id).await?;
        tx.remove_slots_for_signup(id).await?;
        tx.mark_signup_declined(id).await?;

        let mut events = vec![LineupEvent::Removed {
            signup_id: id,
            event_id: signup.event_id,
        }];
        if was_role_slotted {
            if let Some(promoted) =
                ledger::promote_first_eligible(&mut *tx, signup.event_id, signup.chosen_role)
                    .await?
            {
                events.push(LineupEvent::Promoted {
                    signup_id: promoted.id,
                    event_id: signup.event_id,
                    role: signup.chosen_role,
                });
            }
        }

        let declined = tx
            .signup(id)
            .await?
            .ok_or_else(|| RosterError::not_found(format!("signup {id} not found")))?;
        tx.commit().await?;
        info!(signup_id = %id, event_id = %signup.event_id, actor = %ctx.actor_id, "signup declined");
        Ok(SignupOutcome {
            signup: declined,
            events,
        })
    }

    /// Delete a signup outright (leave or officer removal) and refill the
    /// freed role slot from the bench.
    pub async fn delete_signup(
        &self,
        ctx: &RequestContext,
        id: SignupId,
    ) -> RosterResult<Vec<LineupEvent>> {
        let mut tx = self.store.begin().await?;

        let signup = tx
            .signup(id)
            .await?
            .ok_or_else(|| RosterError::not_found(format!("signup {id} not found")))?;

        let was_role_slotted = tx.has_role_slot(id).await?;
        tx.remove_slots_for_signup(id).await?;
        tx.delete_signup(id).await?;

        let mut events = vec![LineupEvent::Removed {
            signup_id: id,
            event_id: signup.event_id,
        }];
        if was_role_slotted {
            if let Some(promoted) =
                ledger::promote_first_eligible(&mut *tx, signup.event_id, signup.chosen_role)
                    .await?
            {
                events.push(LineupEvent::Promoted {
                    signup_id: promoted.id,
                    event_id: signup.event_id,
                    role: signup.chosen_role,
                });
            }
        }

        tx.commit().await?;
        info!(signup_id = %id, event_id = %signup.event_id, actor = %ctx.actor_id, "signup deleted");
        Ok(events)
    }
}
