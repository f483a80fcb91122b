//! Placement primitives and the bench promotion algorithm.
//!
//! These helpers operate on an open transaction so every caller composes
//! them with its own lifecycle mutations atomically. Promotion always runs
//! in the same transaction as the operation that freed the slot.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use muster_core::result::RosterResult;
use muster_core::types::{EventId, Role, SignupId, SlotGroup, SlotId, UserId};
use muster_entity::signup::{LineupSlot, Signup};
use muster_store::RosterTx;

use super::view::BenchPosition;

/// Place a signup at the next free ordinal of a role group.
pub async fn place_in_role(
    tx: &mut dyn RosterTx,
    signup: &Signup,
    group: SlotGroup,
    confirmed_by: Option<UserId>,
    confirmed_at: Option<DateTime<Utc>>,
) -> RosterResult<LineupSlot> {
    let position = tx.next_position(signup.event_id, group).await?;
    let slot = LineupSlot {
        id: SlotId::new(),
        event_id: signup.event_id,
        group,
        position,
        signup_id: Some(signup.id),
        character_id: Some(signup.character_id),
        confirmed_by,
        confirmed_at,
    };
    tx.place_slot(&slot).await?;
    Ok(slot)
}

/// Append a signup to the tail of the event's bench queue.
pub async fn append_to_bench(tx: &mut dyn RosterTx, signup: &Signup) -> RosterResult<LineupSlot> {
    place_in_role(tx, signup, SlotGroup::Bench, None, None).await
}

/// The signup's 1-based rank among bench entries waiting for the same
/// role, or `None` when the signup is not on the bench.
pub async fn bench_rank(
    tx: &mut dyn RosterTx,
    signup_id: SignupId,
) -> RosterResult<Option<BenchPosition>> {
    let Some(slot) = tx.slot_for_signup(signup_id).await? else {
        return Ok(None);
    };
    if slot.group != SlotGroup::Bench {
        return Ok(None);
    }
    let Some(signup) = tx.signup(signup_id).await? else {
        return Ok(None);
    };

    let slots = tx.list_slots(slot.event_id).await?;
    let signups = tx.signups_for_event(slot.event_id).await?;
    let by_id: HashMap<SignupId, &Signup> = signups.iter().map(|s| (s.id, s)).collect();

    let rank = slots
        .iter()
        .filter(|s| s.group == SlotGroup::Bench && s.position <= slot.position)
        .filter_map(|s| s.signup_id)
        .filter_map(|id| by_id.get(&id))
        .filter(|s| s.chosen_role == signup.chosen_role)
        .count() as i64;

    Ok(Some(BenchPosition {
        waiting_for: signup.chosen_role,
        rank,
    }))
}

/// Whether the user already occupies a role slot on the event with any of
/// their characters.
pub async fn user_holds_role_slot(
    tx: &mut dyn RosterTx,
    event_id: EventId,
    user_id: UserId,
) -> RosterResult<bool> {
    let slots = tx.list_slots(event_id).await?;
    let signups = tx.signups_for_event(event_id).await?;
    let by_id: HashMap<SignupId, &Signup> = signups.iter().map(|s| (s.id, s)).collect();

    Ok(slots
        .iter()
        .filter(|slot| slot.is_role_slot())
        .filter_map(|slot| slot.signup_id)
        .filter_map(|id| by_id.get(&id))
        .any(|signup| signup.user_id == user_id))
}

/// Promote the first eligible benched signup into a freed slot of `role`.
///
/// Eligibility, in order of preference:
/// 1. the explicit bench queue, lowest position first;
/// 2. signups for the role lacking any placement, mains before alts, then
///    earliest created.
///
/// Both passes skip declined signups and participants who already hold a
/// role slot on the event with another character. An empty result is a
/// legitimate no-op, not an error.
pub async fn promote_first_eligible(
    tx: &mut dyn RosterTx,
    event_id: EventId,
    role: Role,
) -> RosterResult<Option<Signup>> {
    let slots = tx.list_slots(event_id).await?;
    let signups = tx.signups_for_event(event_id).await?;
    let by_id: HashMap<SignupId, &Signup> = signups.iter().map(|s| (s.id, s)).collect();

    let mut placed_ids: HashSet<SignupId> = HashSet::new();
    let mut users_with_role_slot: HashSet<UserId> = HashSet::new();
    for slot in &slots {
        let Some(id) = slot.signup_id else { continue };
        placed_ids.insert(id);
        if slot.is_role_slot() {
            if let Some(signup) = by_id.get(&id) {
                users_with_role_slot.insert(signup.user_id);
            }
        }
    }

    // Explicit bench queue first; list_slots returns bench entries in
    // position order.
    let mut candidate: Option<Signup> = slots
        .iter()
        .filter(|slot| slot.group == SlotGroup::Bench)
        .filter_map(|slot| slot.signup_id)
        .filter_map(|id| by_id.get(&id))
        .find(|signup| {
            signup.chosen_role == role
                && signup.is_active()
                && !users_with_role_slot.contains(&signup.user_id)
        })
        .map(|signup| (*signup).clone());

    // Fallback: signups with no placement at all. Declined signups are
    // skipped so an intentional opt-out is never re-selected.
    if candidate.is_none() {
        let mut pool: Vec<(Signup, bool)> = Vec::new();
        for signup in &signups {
            if signup.chosen_role != role
                || !signup.is_active()
                || placed_ids.contains(&signup.id)
                || users_with_role_slot.contains(&signup.user_id)
            {
                continue;
            }
            let is_main = tx
                .character(signup.character_id)
                .await?
                .is_some_and(|c| c.is_main);
            pool.push((signup.clone(), is_main));
        }
        pool.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.created_at.cmp(&b.0.created_at)));
        candidate = pool.into_iter().next().map(|(signup, _)| signup);
    }

    let Some(signup) = candidate else {
        debug!(%event_id, %role, "no eligible bench signup to promote");
        return Ok(None);
    };

    tx.remove_slots_for_signup(signup.id).await?;
    place_in_role(tx, &signup, role.slot_group(), None, None).await?;

    info!(
        signup_id = %signup.id,
        %event_id,
        %role,
        "promoted bench signup into freed slot"
    );
    Ok(Some(signup))
}
