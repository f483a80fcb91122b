//! In-memory roster store using a Tokio mutex for single-node deployments.
//!
//! `begin()` takes an owned guard on the whole state and hands the
//! transaction a working copy; `commit()` swaps the working copy back in.
//! Holding the guard for the transaction's lifetime serializes all
//! transactions, which subsumes the row-level locking the PostgreSQL
//! backend needs for the last-slot race. Dropping the transaction without
//! committing discards every staged write.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use muster_core::error::RosterError;
use muster_core::result::RosterResult;
use muster_core::types::{CharacterId, EventId, ReplacementId, Role, SignupId, SlotGroup, UserId};
use muster_entity::ban::RaidBan;
use muster_entity::character::CharacterProfile;
use muster_entity::raid::RoleLimits;
use muster_entity::replacement::{CharacterReplacement, ReplacementStatus};
use muster_entity::signup::{LineupSlot, NewSignup, Signup};

use crate::store::{RosterStore, RosterTx};

/// Entire roster dataset held in process.
#[derive(Debug, Clone, Default)]
struct MemoryState {
    signups: HashMap<SignupId, Signup>,
    slots: Vec<LineupSlot>,
    characters: HashMap<CharacterId, CharacterProfile>,
    limits: HashMap<EventId, RoleLimits>,
    bans: Vec<RaidBan>,
    replacements: HashMap<ReplacementId, CharacterReplacement>,
}

/// In-memory roster store.
///
/// Suitable for single-node deployments and the test suites.
#[derive(Debug, Clone, Default)]
pub struct MemoryRosterStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRosterStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RosterStore for MemoryRosterStore {
    async fn begin(&self) -> RosterResult<Box<dyn RosterTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryRosterTx { guard, working }))
    }
}

/// A transaction over the in-memory store.
struct MemoryRosterTx {
    /// Exclusive hold on the shared state for the transaction's lifetime.
    guard: OwnedMutexGuard<MemoryState>,
    /// Staged copy all reads and writes go through.
    working: MemoryState,
}

#[async_trait]
impl RosterTx for MemoryRosterTx {
    async fn insert_signup(&mut self, new: &NewSignup) -> RosterResult<Signup> {
        let duplicate = self
            .working
            .signups
            .values()
            .any(|s| s.event_id == new.event_id && s.character_id == new.character_id);
        if duplicate {
            return Err(RosterError::conflict(format!(
                "character {} already has a signup for event {}",
                new.character_id, new.event_id
            )));
        }

        let now = Utc::now();
        let signup = Signup {
            id: SignupId::new(),
            event_id: new.event_id,
            user_id: new.user_id,
            character_id: new.character_id,
            chosen_role: new.chosen_role,
            chosen_spec: new.chosen_spec.clone(),
            note: new.note.clone(),
            declined_at: None,
            created_at: now,
            updated_at: now,
        };
        self.working.signups.insert(signup.id, signup.clone());
        Ok(signup)
    }

    async fn signup(&mut self, id: SignupId) -> RosterResult<Option<Signup>> {
        Ok(self.working.signups.get(&id).cloned())
    }

    async fn signup_by_character(
        &mut self,
        event_id: EventId,
        character_id: CharacterId,
    ) -> RosterResult<Option<Signup>> {
        Ok(self
            .working
            .signups
            .values()
            .find(|s| s.event_id == event_id && s.character_id == character_id)
            .cloned())
    }

    async fn signups_for_event(&mut self, event_id: EventId) -> RosterResult<Vec<Signup>> {
        let mut signups: Vec<Signup> = self
            .working
            .signups
            .values()
            .filter(|s| s.event_id == event_id)
            .cloned()
            .collect();
        signups.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(signups)
    }

    async fn update_signup_fields(
        &mut self,
        id: SignupId,
        chosen_role: Role,
        chosen_spec: Option<String>,
        note: Option<String>,
    ) -> RosterResult<Signup> {
        let signup = self
            .working
            .signups
            .get_mut(&id)
            .ok_or_else(|| RosterError::not_found(format!("signup {id} not found")))?;
        signup.chosen_role = chosen_role;
        signup.chosen_spec = chosen_spec;
        signup.note = note;
        signup.updated_at = Utc::now();
        Ok(signup.clone())
    }

    async fn update_signup_character(
        &mut self,
        id: SignupId,
        character_id: CharacterId,
    ) -> RosterResult<Signup> {
        let signup = self
            .working
            .signups
            .get_mut(&id)
            .ok_or_else(|| RosterError::not_found(format!("signup {id} not found")))?;
        signup.character_id = character_id;
        signup.updated_at = Utc::now();
        let updated = signup.clone();

        // Keep the denormalized character on any held slot in sync.
        for slot in self
            .working
            .slots
            .iter_mut()
            .filter(|slot| slot.signup_id == Some(id))
        {
            slot.character_id = Some(character_id);
        }
        Ok(updated)
    }

    async fn mark_signup_declined(&mut self, id: SignupId) -> RosterResult<()> {
        let signup = self
            .working
            .signups
            .get_mut(&id)
            .ok_or_else(|| RosterError::not_found(format!("signup {id} not found")))?;
        let now = Utc::now();
        signup.declined_at = Some(now);
        signup.updated_at = now;
        Ok(())
    }

    async fn revive_signup(&mut self, id: SignupId, new: &NewSignup) -> RosterResult<Signup> {
        let signup = self
            .working
            .signups
            .get_mut(&id)
            .ok_or_else(|| RosterError::not_found(format!("signup {id} not found")))?;
        signup.chosen_role = new.chosen_role;
        signup.chosen_spec = new.chosen_spec.clone();
        signup.note = new.note.clone();
        signup.declined_at = None;
        signup.updated_at = Utc::now();
        Ok(signup.clone())
    }

    async fn delete_signup(&mut self, id: SignupId) -> RosterResult<bool> {
        let removed = self.working.signups.remove(&id).is_some();
        if removed {
            // Mirrors ON DELETE CASCADE on lineup_slots.signup_id.
            self.working.slots.retain(|slot| slot.signup_id != Some(id));
        }
        Ok(removed)
    }

    async fn upsert_character(&mut self, profile: &CharacterProfile) -> RosterResult<()> {
        self.working.characters.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn character(&mut self, id: CharacterId) -> RosterResult<Option<CharacterProfile>> {
        Ok(self.working.characters.get(&id).cloned())
    }

    async fn upsert_role_limits(&mut self, limits: &RoleLimits) -> RosterResult<()> {
        self.working.limits.insert(limits.event_id, limits.clone());
        Ok(())
    }

    async fn role_limits(&mut self, event_id: EventId) -> RosterResult<Option<RoleLimits>> {
        Ok(self.working.limits.get(&event_id).cloned())
    }

    async fn next_position(&mut self, event_id: EventId, group: SlotGroup) -> RosterResult<i32> {
        let max = self
            .working
            .slots
            .iter()
            .filter(|slot| slot.event_id == event_id && slot.group == group)
            .map(|slot| slot.position)
            .max();
        Ok(max.map_or(0, |m| m + 1))
    }

    async fn place_slot(&mut self, slot: &LineupSlot) -> RosterResult<()> {
        let existing = self.working.slots.iter_mut().find(|s| {
            s.event_id == slot.event_id && s.group == slot.group && s.position == slot.position
        });
        match existing {
            Some(s) => {
                s.signup_id = slot.signup_id;
                s.character_id = slot.character_id;
                s.confirmed_by = slot.confirmed_by;
                s.confirmed_at = slot.confirmed_at;
            }
            None => self.working.slots.push(slot.clone()),
        }
        Ok(())
    }

    async fn remove_slots_for_signup(&mut self, signup_id: SignupId) -> RosterResult<u64> {
        let before = self.working.slots.len();
        self.working
            .slots
            .retain(|slot| slot.signup_id != Some(signup_id));
        Ok((before - self.working.slots.len()) as u64)
    }

    async fn slot_for_signup(&mut self, signup_id: SignupId) -> RosterResult<Option<LineupSlot>> {
        Ok(self
            .working
            .slots
            .iter()
            .find(|slot| slot.signup_id == Some(signup_id))
            .cloned())
    }

    async fn count_role_slots(
        &mut self,
        event_id: EventId,
        group: SlotGroup,
    ) -> RosterResult<i64> {
        Ok(self
            .working
            .slots
            .iter()
            .filter(|slot| {
                slot.event_id == event_id && slot.group == group && slot.signup_id.is_some()
            })
            .count() as i64)
    }

    async fn count_role_slots_locked(
        &mut self,
        event_id: EventId,
        group: SlotGroup,
    ) -> RosterResult<i64> {
        // The owned mutex guard already serializes whole transactions.
        self.count_role_slots(event_id, group).await
    }

    async fn list_slots(&mut self, event_id: EventId) -> RosterResult<Vec<LineupSlot>> {
        let mut slots: Vec<LineupSlot> = self
            .working
            .slots
            .iter()
            .filter(|slot| slot.event_id == event_id)
            .cloned()
            .collect();
        slots.sort_by(|a, b| a.group.cmp(&b.group).then(a.position.cmp(&b.position)));
        Ok(slots)
    }

    async fn clear_slots(&mut self, event_id: EventId) -> RosterResult<u64> {
        let before = self.working.slots.len();
        self.working.slots.retain(|slot| slot.event_id != event_id);
        Ok((before - self.working.slots.len()) as u64)
    }

    async fn confirm_slots(
        &mut self,
        event_id: EventId,
        confirmed_by: UserId,
        confirmed_at: DateTime<Utc>,
    ) -> RosterResult<u64> {
        let mut confirmed = 0;
        for slot in self.working.slots.iter_mut().filter(|slot| {
            slot.event_id == event_id && slot.signup_id.is_some() && slot.confirmed_at.is_none()
        }) {
            slot.confirmed_by = Some(confirmed_by);
            slot.confirmed_at = Some(confirmed_at);
            confirmed += 1;
        }
        Ok(confirmed)
    }

    async fn insert_ban(&mut self, ban: &RaidBan) -> RosterResult<()> {
        let duplicate = self
            .working
            .bans
            .iter()
            .any(|b| b.event_id == ban.event_id && b.character_id == ban.character_id);
        if duplicate {
            return Err(RosterError::conflict(format!(
                "character {} is already banned from event {}",
                ban.character_id, ban.event_id
            )));
        }
        self.working.bans.push(ban.clone());
        Ok(())
    }

    async fn ban_for(
        &mut self,
        event_id: EventId,
        character_id: CharacterId,
    ) -> RosterResult<Option<RaidBan>> {
        Ok(self
            .working
            .bans
            .iter()
            .find(|b| b.event_id == event_id && b.character_id == character_id)
            .cloned())
    }

    async fn delete_ban(
        &mut self,
        event_id: EventId,
        character_id: CharacterId,
    ) -> RosterResult<bool> {
        let before = self.working.bans.len();
        self.working
            .bans
            .retain(|b| !(b.event_id == event_id && b.character_id == character_id));
        Ok(self.working.bans.len() < before)
    }

    async fn bans_for_event(&mut self, event_id: EventId) -> RosterResult<Vec<RaidBan>> {
        let mut bans: Vec<RaidBan> = self
            .working
            .bans
            .iter()
            .filter(|b| b.event_id == event_id)
            .cloned()
            .collect();
        bans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bans)
    }

    async fn insert_replacement(&mut self, request: &CharacterReplacement) -> RosterResult<()> {
        self.working
            .replacements
            .insert(request.id, request.clone());
        Ok(())
    }

    async fn replacement(
        &mut self,
        id: ReplacementId,
    ) -> RosterResult<Option<CharacterReplacement>> {
        Ok(self.working.replacements.get(&id).cloned())
    }

    async fn update_replacement_status(
        &mut self,
        id: ReplacementId,
        status: ReplacementStatus,
        resolved_at: DateTime<Utc>,
    ) -> RosterResult<CharacterReplacement> {
        let request = self
            .working
            .replacements
            .get_mut(&id)
            .ok_or_else(|| RosterError::not_found(format!("replacement {id} not found")))?;
        request.status = status;
        request.resolved_at = Some(resolved_at);
        Ok(request.clone())
    }

    async fn commit(mut self: Box<Self>) -> RosterResult<()> {
        debug!(
            signups = self.working.signups.len(),
            slots = self.working.slots.len(),
            "committing memory transaction"
        );
        *self.guard = self.working;
        Ok(())
    }
}
