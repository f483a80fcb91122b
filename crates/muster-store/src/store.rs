//! Roster store traits and shared types.
//!
//! [`RosterStore`] hands out transactions; [`RosterTx`] exposes the
//! primitive operations the allocation engine composes. Implementations
//! must guarantee that a transaction's writes become visible atomically on
//! `commit` and never otherwise.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use muster_core::result::RosterResult;
use muster_core::types::{CharacterId, EventId, ReplacementId, Role, SignupId, SlotGroup, UserId};
use muster_entity::ban::RaidBan;
use muster_entity::character::CharacterProfile;
use muster_entity::raid::RoleLimits;
use muster_entity::replacement::{CharacterReplacement, ReplacementStatus};
use muster_entity::signup::{LineupSlot, NewSignup, Signup};

/// Factory for roster transactions.
#[async_trait]
pub trait RosterStore: Send + Sync + std::fmt::Debug {
    /// Begin a transaction. All reads and writes go through the returned
    /// handle; dropping it without [`RosterTx::commit`] rolls back.
    async fn begin(&self) -> RosterResult<Box<dyn RosterTx>>;
}

/// A single roster transaction.
///
/// Method receivers are `&mut self` because a transaction is a linear
/// resource; it is finished by exactly one `commit` call.
#[async_trait]
pub trait RosterTx: Send {
    // --- Signups ---

    /// Insert a new signup row and return it.
    async fn insert_signup(&mut self, new: &NewSignup) -> RosterResult<Signup>;

    /// Fetch a signup by id.
    async fn signup(&mut self, id: SignupId) -> RosterResult<Option<Signup>>;

    /// Fetch the signup for a character on an event, declined or not.
    async fn signup_by_character(
        &mut self,
        event_id: EventId,
        character_id: CharacterId,
    ) -> RosterResult<Option<Signup>>;

    /// All signups for an event, ordered by creation time.
    async fn signups_for_event(&mut self, event_id: EventId) -> RosterResult<Vec<Signup>>;

    /// Update role, spec, and note on a signup.
    async fn update_signup_fields(
        &mut self,
        id: SignupId,
        chosen_role: Role,
        chosen_spec: Option<String>,
        note: Option<String>,
    ) -> RosterResult<Signup>;

    /// Swap the character behind a signup.
    async fn update_signup_character(
        &mut self,
        id: SignupId,
        character_id: CharacterId,
    ) -> RosterResult<Signup>;

    /// Stamp the declined marker on a signup.
    async fn mark_signup_declined(&mut self, id: SignupId) -> RosterResult<()>;

    /// Clear the declined marker and refresh intent fields, reusing the
    /// existing row for a returning character.
    async fn revive_signup(&mut self, id: SignupId, new: &NewSignup) -> RosterResult<Signup>;

    /// Hard-delete a signup. Returns whether a row was removed.
    async fn delete_signup(&mut self, id: SignupId) -> RosterResult<bool>;

    // --- Characters (collaborator-supplied mirror) ---

    /// Insert or update a character profile.
    async fn upsert_character(&mut self, profile: &CharacterProfile) -> RosterResult<()>;

    /// Fetch a character profile.
    async fn character(&mut self, id: CharacterId) -> RosterResult<Option<CharacterProfile>>;

    // --- Role capacities ---

    /// Insert or update the role capacities for an event.
    async fn upsert_role_limits(&mut self, limits: &RoleLimits) -> RosterResult<()>;

    /// Fetch the role capacities for an event.
    async fn role_limits(&mut self, event_id: EventId) -> RosterResult<Option<RoleLimits>>;

    // --- Slot ledger ---

    /// One past the current maximum ordinal in a group.
    async fn next_position(&mut self, event_id: EventId, group: SlotGroup) -> RosterResult<i32>;

    /// Upsert a slot by (event, group, position).
    async fn place_slot(&mut self, slot: &LineupSlot) -> RosterResult<()>;

    /// Delete the signup's placement wherever it is. Idempotent; returns
    /// the number of rows removed.
    async fn remove_slots_for_signup(&mut self, signup_id: SignupId) -> RosterResult<u64>;

    /// The signup's current placement, if any.
    async fn slot_for_signup(&mut self, signup_id: SignupId) -> RosterResult<Option<LineupSlot>>;

    /// Whether the signup currently holds a role slot (not bench).
    async fn has_role_slot(&mut self, signup_id: SignupId) -> RosterResult<bool> {
        Ok(self
            .slot_for_signup(signup_id)
            .await?
            .is_some_and(|slot| slot.is_role_slot()))
    }

    /// Occupied slot count for a role group.
    async fn count_role_slots(&mut self, event_id: EventId, group: SlotGroup) -> RosterResult<i64>;

    /// Occupied slot count for a role group, taking a serializing lock on
    /// the group's rows so concurrent capacity checks cannot both observe
    /// the same free slot.
    async fn count_role_slots_locked(
        &mut self,
        event_id: EventId,
        group: SlotGroup,
    ) -> RosterResult<i64>;

    /// All slots for an event, ordered by (group, position).
    async fn list_slots(&mut self, event_id: EventId) -> RosterResult<Vec<LineupSlot>>;

    /// Remove every slot for an event (bulk rewrite staging). Returns the
    /// number of rows removed.
    async fn clear_slots(&mut self, event_id: EventId) -> RosterResult<u64>;

    /// Stamp confirmation metadata on occupied, unconfirmed slots.
    /// Returns the number of slots confirmed.
    async fn confirm_slots(
        &mut self,
        event_id: EventId,
        confirmed_by: UserId,
        confirmed_at: DateTime<Utc>,
    ) -> RosterResult<u64>;

    // --- Bans ---

    /// Insert a ban record.
    async fn insert_ban(&mut self, ban: &RaidBan) -> RosterResult<()>;

    /// Fetch the ban for a (event, character) pair.
    async fn ban_for(
        &mut self,
        event_id: EventId,
        character_id: CharacterId,
    ) -> RosterResult<Option<RaidBan>>;

    /// Delete the ban for a (event, character) pair. Returns whether a
    /// record was removed.
    async fn delete_ban(
        &mut self,
        event_id: EventId,
        character_id: CharacterId,
    ) -> RosterResult<bool>;

    /// All bans for an event, newest first.
    async fn bans_for_event(&mut self, event_id: EventId) -> RosterResult<Vec<RaidBan>>;

    // --- Replacements ---

    /// Insert a replacement request.
    async fn insert_replacement(&mut self, request: &CharacterReplacement) -> RosterResult<()>;

    /// Fetch a replacement request.
    async fn replacement(
        &mut self,
        id: ReplacementId,
    ) -> RosterResult<Option<CharacterReplacement>>;

    /// Move a replacement request into a terminal status.
    async fn update_replacement_status(
        &mut self,
        id: ReplacementId,
        status: ReplacementStatus,
        resolved_at: DateTime<Utc>,
    ) -> RosterResult<CharacterReplacement>;

    // --- Lifecycle ---

    /// Commit all staged writes atomically.
    async fn commit(self: Box<Self>) -> RosterResult<()>;
}
