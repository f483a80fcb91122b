//! PostgreSQL roster store.
//!
//! One [`RosterTx`] maps to one database transaction. The capacity check
//! serializes on the event's composition row (`SELECT ... FOR UPDATE`), so
//! two concurrent signups cannot both observe the same free slot; the
//! second caller blocks until the first transaction commits or rolls back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::{Postgres, Transaction};

use muster_core::error::RosterError;
use muster_core::result::RosterResult;
use muster_core::types::{CharacterId, EventId, ReplacementId, Role, SignupId, SlotGroup, UserId};
use muster_entity::ban::RaidBan;
use muster_entity::character::CharacterProfile;
use muster_entity::raid::RoleLimits;
use muster_entity::replacement::{CharacterReplacement, ReplacementStatus};
use muster_entity::signup::{LineupSlot, NewSignup, Signup};

use crate::store::{RosterStore, RosterTx};

/// PostgreSQL-backed roster store.
#[derive(Debug, Clone)]
pub struct PgRosterStore {
    pool: PgPool,
}

impl PgRosterStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterStore for PgRosterStore {
    async fn begin(&self) -> RosterResult<Box<dyn RosterTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgRosterTx { tx }))
    }
}

/// A transaction over the PostgreSQL store.
struct PgRosterTx {
    tx: Transaction<'static, Postgres>,
}

/// Map unique-constraint violations to domain conflicts.
fn map_insert_error(err: sqlx::Error, message: &str) -> RosterError {
    let unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        RosterError::conflict(message.to_string())
    } else {
        err.into()
    }
}

#[async_trait]
impl RosterTx for PgRosterTx {
    async fn insert_signup(&mut self, new: &NewSignup) -> RosterResult<Signup> {
        sqlx::query_as::<_, Signup>(
            "INSERT INTO signups (id, event_id, user_id, character_id, chosen_role, chosen_spec, note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(SignupId::new())
        .bind(new.event_id)
        .bind(new.user_id)
        .bind(new.character_id)
        .bind(new.chosen_role)
        .bind(&new.chosen_spec)
        .bind(&new.note)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_insert_error(e, "character already has a signup for this event"))
    }

    async fn signup(&mut self, id: SignupId) -> RosterResult<Option<Signup>> {
        Ok(
            sqlx::query_as::<_, Signup>("SELECT * FROM signups WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await?,
        )
    }

    async fn signup_by_character(
        &mut self,
        event_id: EventId,
        character_id: CharacterId,
    ) -> RosterResult<Option<Signup>> {
        Ok(sqlx::query_as::<_, Signup>(
            "SELECT * FROM signups WHERE event_id = $1 AND character_id = $2",
        )
        .bind(event_id)
        .bind(character_id)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn signups_for_event(&mut self, event_id: EventId) -> RosterResult<Vec<Signup>> {
        Ok(sqlx::query_as::<_, Signup>(
            "SELECT * FROM signups WHERE event_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(event_id)
        .fetch_all(&mut *self.tx)
        .await?)
    }

    async fn update_signup_fields(
        &mut self,
        id: SignupId,
        chosen_role: Role,
        chosen_spec: Option<String>,
        note: Option<String>,
    ) -> RosterResult<Signup> {
        sqlx::query_as::<_, Signup>(
            "UPDATE signups SET chosen_role = $2, chosen_spec = $3, note = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(chosen_role)
        .bind(&chosen_spec)
        .bind(&note)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| RosterError::not_found(format!("signup {id} not found")))
    }

    async fn update_signup_character(
        &mut self,
        id: SignupId,
        character_id: CharacterId,
    ) -> RosterResult<Signup> {
        let signup = sqlx::query_as::<_, Signup>(
            "UPDATE signups SET character_id = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(character_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| RosterError::not_found(format!("signup {id} not found")))?;

        // Keep the denormalized character on any held slot in sync.
        sqlx::query("UPDATE lineup_slots SET character_id = $2 WHERE signup_id = $1")
            .bind(id)
            .bind(character_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(signup)
    }

    async fn mark_signup_declined(&mut self, id: SignupId) -> RosterResult<()> {
        let result = sqlx::query(
            "UPDATE signups SET declined_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RosterError::not_found(format!("signup {id} not found")));
        }
        Ok(())
    }

    async fn revive_signup(&mut self, id: SignupId, new: &NewSignup) -> RosterResult<Signup> {
        sqlx::query_as::<_, Signup>(
            "UPDATE signups SET chosen_role = $2, chosen_spec = $3, note = $4, \
             declined_at = NULL, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(new.chosen_role)
        .bind(&new.chosen_spec)
        .bind(&new.note)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| RosterError::not_found(format!("signup {id} not found")))
    }

    async fn delete_signup(&mut self, id: SignupId) -> RosterResult<bool> {
        let result = sqlx::query("DELETE FROM signups WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_character(&mut self, profile: &CharacterProfile) -> RosterResult<()> {
        sqlx::query(
            "INSERT INTO characters (id, user_id, name, class_name, is_main, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE SET \
             name = EXCLUDED.name, class_name = EXCLUDED.class_name, \
             is_main = EXCLUDED.is_main, is_active = EXCLUDED.is_active",
        )
        .bind(profile.id)
        .bind(profile.user_id)
        .bind(&profile.name)
        .bind(profile.class)
        .bind(profile.is_main)
        .bind(profile.is_active)
        .bind(profile.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn character(&mut self, id: CharacterId) -> RosterResult<Option<CharacterProfile>> {
        Ok(
            sqlx::query_as::<_, CharacterProfile>("SELECT * FROM characters WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.tx)
                .await?,
        )
    }

    async fn upsert_role_limits(&mut self, limits: &RoleLimits) -> RosterResult<()> {
        sqlx::query(
            "INSERT INTO raid_compositions \
             (event_id, main_tank_slots, off_tank_slots, tank_slots, healer_slots, dps_slots) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (event_id) DO UPDATE SET \
             main_tank_slots = EXCLUDED.main_tank_slots, \
             off_tank_slots = EXCLUDED.off_tank_slots, \
             tank_slots = EXCLUDED.tank_slots, \
             healer_slots = EXCLUDED.healer_slots, \
             dps_slots = EXCLUDED.dps_slots",
        )
        .bind(limits.event_id)
        .bind(limits.main_tank_slots)
        .bind(limits.off_tank_slots)
        .bind(limits.tank_slots)
        .bind(limits.healer_slots)
        .bind(limits.dps_slots)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn role_limits(&mut self, event_id: EventId) -> RosterResult<Option<RoleLimits>> {
        Ok(sqlx::query_as::<_, RoleLimits>(
            "SELECT * FROM raid_compositions WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn next_position(&mut self, event_id: EventId, group: SlotGroup) -> RosterResult<i32> {
        Ok(sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(slot_index) + 1, 0) FROM lineup_slots \
             WHERE event_id = $1 AND slot_group = $2",
        )
        .bind(event_id)
        .bind(group)
        .fetch_one(&mut *self.tx)
        .await?)
    }

    async fn place_slot(&mut self, slot: &LineupSlot) -> RosterResult<()> {
        sqlx::query(
            "INSERT INTO lineup_slots \
             (id, event_id, slot_group, slot_index, signup_id, character_id, confirmed_by, confirmed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (event_id, slot_group, slot_index) DO UPDATE SET \
             signup_id = EXCLUDED.signup_id, \
             character_id = EXCLUDED.character_id, \
             confirmed_by = EXCLUDED.confirmed_by, \
             confirmed_at = EXCLUDED.confirmed_at",
        )
        .bind(slot.id)
        .bind(slot.event_id)
        .bind(slot.group)
        .bind(slot.position)
        .bind(slot.signup_id)
        .bind(slot.character_id)
        .bind(slot.confirmed_by)
        .bind(slot.confirmed_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn remove_slots_for_signup(&mut self, signup_id: SignupId) -> RosterResult<u64> {
        let result = sqlx::query("DELETE FROM lineup_slots WHERE signup_id = $1")
            .bind(signup_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn slot_for_signup(&mut self, signup_id: SignupId) -> RosterResult<Option<LineupSlot>> {
        Ok(
            sqlx::query_as::<_, LineupSlot>("SELECT * FROM lineup_slots WHERE signup_id = $1")
                .bind(signup_id)
                .fetch_optional(&mut *self.tx)
                .await?,
        )
    }

    async fn count_role_slots(
        &mut self,
        event_id: EventId,
        group: SlotGroup,
    ) -> RosterResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM lineup_slots \
             WHERE event_id = $1 AND slot_group = $2 AND signup_id IS NOT NULL",
        )
        .bind(event_id)
        .bind(group)
        .fetch_one(&mut *self.tx)
        .await?)
    }

    async fn count_role_slots_locked(
        &mut self,
        event_id: EventId,
        group: SlotGroup,
    ) -> RosterResult<i64> {
        // Serialize concurrent capacity checks on the composition row;
        // locking only the existing slot rows would not block a racing
        // insert into the same group.
        sqlx::query("SELECT event_id FROM raid_compositions WHERE event_id = $1 FOR UPDATE")
            .bind(event_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        self.count_role_slots(event_id, group).await
    }

    async fn list_slots(&mut self, event_id: EventId) -> RosterResult<Vec<LineupSlot>> {
        Ok(sqlx::query_as::<_, LineupSlot>(
            "SELECT * FROM lineup_slots WHERE event_id = $1 ORDER BY slot_group ASC, slot_index ASC",
        )
        .bind(event_id)
        .fetch_all(&mut *self.tx)
        .await?)
    }

    async fn clear_slots(&mut self, event_id: EventId) -> RosterResult<u64> {
        let result = sqlx::query("DELETE FROM lineup_slots WHERE event_id = $1")
            .bind(event_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn confirm_slots(
        &mut self,
        event_id: EventId,
        confirmed_by: UserId,
        confirmed_at: DateTime<Utc>,
    ) -> RosterResult<u64> {
        let result = sqlx::query(
            "UPDATE lineup_slots SET confirmed_by = $2, confirmed_at = $3 \
             WHERE event_id = $1 AND signup_id IS NOT NULL AND confirmed_at IS NULL",
        )
        .bind(event_id)
        .bind(confirmed_by)
        .bind(confirmed_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_ban(&mut self, ban: &RaidBan) -> RosterResult<()> {
        sqlx::query(
            "INSERT INTO raid_bans (id, event_id, character_id, banned_by, reason, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(ban.id)
        .bind(ban.event_id)
        .bind(ban.character_id)
        .bind(ban.banned_by)
        .bind(&ban.reason)
        .bind(ban.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_insert_error(e, "character is already banned from this event"))?;
        Ok(())
    }

    async fn ban_for(
        &mut self,
        event_id: EventId,
        character_id: CharacterId,
    ) -> RosterResult<Option<RaidBan>> {
        Ok(sqlx::query_as::<_, RaidBan>(
            "SELECT * FROM raid_bans WHERE event_id = $1 AND character_id = $2",
        )
        .bind(event_id)
        .bind(character_id)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn delete_ban(
        &mut self,
        event_id: EventId,
        character_id: CharacterId,
    ) -> RosterResult<bool> {
        let result =
            sqlx::query("DELETE FROM raid_bans WHERE event_id = $1 AND character_id = $2")
                .bind(event_id)
                .bind(character_id)
                .execute(&mut *self.tx)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn bans_for_event(&mut self, event_id: EventId) -> RosterResult<Vec<RaidBan>> {
        Ok(sqlx::query_as::<_, RaidBan>(
            "SELECT * FROM raid_bans WHERE event_id = $1 ORDER BY created_at DESC",
        )
        .bind(event_id)
        .fetch_all(&mut *self.tx)
        .await?)
    }

    async fn insert_replacement(&mut self, request: &CharacterReplacement) -> RosterResult<()> {
        sqlx::query(
            "INSERT INTO character_replacements \
             (id, signup_id, old_character_id, new_character_id, requested_by, reason, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(request.id)
        .bind(request.signup_id)
        .bind(request.old_character_id)
        .bind(request.new_character_id)
        .bind(request.requested_by)
        .bind(&request.reason)
        .bind(request.status)
        .bind(request.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn replacement(
        &mut self,
        id: ReplacementId,
    ) -> RosterResult<Option<CharacterReplacement>> {
        Ok(sqlx::query_as::<_, CharacterReplacement>(
            "SELECT * FROM character_replacements WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?)
    }

    async fn update_replacement_status(
        &mut self,
        id: ReplacementId,
        status: ReplacementStatus,
        resolved_at: DateTime<Utc>,
    ) -> RosterResult<CharacterReplacement> {
        sqlx::query_as::<_, CharacterReplacement>(
            "UPDATE character_replacements SET status = $2, resolved_at = $3 \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(resolved_at)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| RosterError::not_found(format!("replacement {id} not found")))
    }

    async fn commit(self: Box<Self>) -> RosterResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
