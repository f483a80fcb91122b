//! Lineup viewing, bulk rewrite, and confirmation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use muster_core::error::RosterError;
use muster_core::events::LineupEvent;
use muster_core::result::RosterResult;
use muster_core::types::{EventId, Role, SignupId, SlotGroup, SlotId, UserId};
use muster_entity::character::class::validate_class_role;
use muster_entity::signup::{LineupSlot, Signup};
use muster_store::{RosterStore, RosterTx};

use crate::context::RequestContext;

use super::ledger;
use super::view::{self, BenchPosition, LineupView};

/// One entry of the submitted bench order. Entries may carry a new chosen
/// role for the waiting signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchEntry {
    /// The waiting signup.
    pub signup_id: SignupId,
    /// Optional role change applied while benched.
    pub chosen_role: Option<Role>,
}

/// An administrator's wholesale lineup submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineupSubmission {
    /// Main tank slots in desired order.
    pub main_tanks: Vec<SignupId>,
    /// Off tank slots in desired order.
    pub off_tanks: Vec<SignupId>,
    /// General tank slots in desired order.
    pub tanks: Vec<SignupId>,
    /// Healer slots in desired order.
    pub healers: Vec<SignupId>,
    /// Damage dealer slots in desired order.
    pub dps: Vec<SignupId>,
    /// Explicit bench queue in desired order.
    pub bench_queue: Vec<BenchEntry>,
    /// Fingerprint the lineup had when the administrator loaded it. When
    /// set, a mismatch fails the rewrite with [`RosterError::StaleLineup`]
    /// before any mutation.
    pub expected_version: Option<String>,
}

impl LineupSubmission {
    fn role_groups(&self) -> [(SlotGroup, &[SignupId]); 5] {
        [
            (SlotGroup::MainTank, &self.main_tanks),
            (SlotGroup::OffTank, &self.off_tanks),
            (SlotGroup::Tank, &self.tanks),
            (SlotGroup::Healer, &self.healers),
            (SlotGroup::Dps, &self.dps),
        ]
    }
}

/// Result of a bulk rewrite: the fresh lineup plus the events it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteOutcome {
    /// The lineup after the rewrite and any promotions.
    pub lineup: LineupView,
    /// Bench demotions and promotions for the notification layer.
    pub events: Vec<LineupEvent>,
}

/// Lineup service: grouped views, wholesale rewrites, confirmation.
#[derive(Debug, Clone)]
pub struct LineupService {
    store: Arc<dyn RosterStore>,
}

impl LineupService {
    /// Creates a new lineup service.
    pub fn new(store: Arc<dyn RosterStore>) -> Self {
        Self { store }
    }

    /// The current grouped lineup for an event.
    pub async fn view(&self, event_id: EventId) -> RosterResult<LineupView> {
        let mut tx = self.store.begin().await?;
        let slots = tx.list_slots(event_id).await?;
        let signups = tx.signups_for_event(event_id).await?;
        Ok(LineupView::build(&slots, &signups))
    }

    /// A signup's bench queue position, or `None` when it is not benched.
    pub async fn bench_position(
        &self,
        signup_id: SignupId,
    ) -> RosterResult<Option<BenchPosition>> {
        let mut tx = self.store.begin().await?;
        ledger::bench_rank(&mut *tx, signup_id).await
    }

    /// Stamp confirmation metadata on every occupied, unconfirmed slot.
    pub async fn confirm_lineup(
        &self,
        ctx: &RequestContext,
        event_id: EventId,
    ) -> RosterResult<u64> {
        let mut tx = self.store.begin().await?;
        let confirmed = tx
            .confirm_slots(event_id, ctx.actor_id, Utc::now())
            .await?;
        tx.commit().await?;
        info!(%event_id, confirmed, "lineup confirmed");
        Ok(confirmed)
    }

    /// Rebuild the whole lineup from an administrator's submission.
    ///
    /// Reconciliation pass, in order: optimistic-concurrency check,
    /// pre-image snapshot, role groups in submitted order (diverting
    /// one-slot-per-participant violations to an overflow list), bench
    /// rebuild (explicit order, then overflow, then orphans), and finally
    /// one promotion per net-freed role slot. Unknown and duplicate ids
    /// are skipped; capability violations abort the whole rewrite.
    pub async fn update_lineup(
        &self,
        ctx: &RequestContext,
        event_id: EventId,
        submission: &LineupSubmission,
    ) -> RosterResult<RewriteOutcome> {
        let mut tx = self.store.begin().await?;

        let slots = tx.list_slots(event_id).await?;
        if let Some(expected) = &submission.expected_version {
            let current = view::fingerprint(&slots);
            if &current != expected {
                warn!(%event_id, "lineup rewrite rejected: stale fingerprint");
                return Err(RosterError::StaleLineup);
            }
        }

        let signups = tx.signups_for_event(event_id).await?;
        let by_id: HashMap<SignupId, Signup> =
            signups.iter().map(|s| (s.id, s.clone())).collect();

        // Pre-image: who held which role slot. Freed-slot accounting
        // compares this against the submitted groups.
        let mut old_role_ids: HashMap<SlotGroup, HashSet<SignupId>> = HashMap::new();
        for slot in &slots {
            let Some(id) = slot.signup_id else { continue };
            if slot.group != SlotGroup::Bench {
                old_role_ids.entry(slot.group).or_default().insert(id);
            }
        }

        tx.clear_slots(event_id).await?;
        let now = Utc::now();

        // Role groups in submitted order, enforcing one occupied slot per
        // participant within the same pass.
        let mut users_in_lineup: HashSet<UserId> = HashSet::new();
        let mut placed_role_ids: HashSet<SignupId> = HashSet::new();
        let mut new_role_ids: HashMap<SlotGroup, HashSet<SignupId>> = HashMap::new();
        let mut overflow: Vec<SignupId> = Vec::new();

        for (group, submitted) in submission.role_groups() {
            let Some(role) = group.role() else { continue };
            let mut position = 0;
            for signup_id in submitted {
                let Some(signup) = by_id.get(signup_id) else {
                    continue;
                };
                if !signup.is_active() || placed_role_ids.contains(signup_id) {
                    continue;
                }
                if users_in_lineup.contains(&signup.user_id) {
                    overflow.push(*signup_id);
                    continue;
                }
                users_in_lineup.insert(signup.user_id);

                // Sync the signup's chosen role with the submitted group.
                if signup.chosen_role != role {
                    self.change_role(&mut *tx, signup, role).await?;
                }

                let slot = LineupSlot {
                    id: SlotId::new(),
                    event_id,
                    group,
                    position,
                    signup_id: Some(signup.id),
                    character_id: Some(signup.character_id),
                    confirmed_by: Some(ctx.actor_id),
                    confirmed_at: Some(now),
                };
                tx.place_slot(&slot).await?;
                placed_role_ids.insert(signup.id);
                new_role_ids.entry(group).or_default().insert(signup.id);
                position += 1;
            }
        }

        let all_new_role: HashSet<SignupId> =
            new_role_ids.values().flatten().copied().collect();

        // Orphans: placed before the rewrite (role or bench), absent from
        // the entire submission. Appended after explicit bench entries and
        // overflow so voluntary waiters are served first. Pre-rewrite slot
        // order keeps orphan ordering deterministic.
        let explicit_ids: HashSet<SignupId> = submission
            .bench_queue
            .iter()
            .map(|entry| entry.signup_id)
            .collect();
        let overflow_ids: HashSet<SignupId> = overflow.iter().copied().collect();
        let orphans: Vec<SignupId> = slots
            .iter()
            .filter_map(|slot| slot.signup_id)
            .filter(|id| {
                !all_new_role.contains(id)
                    && !explicit_ids.contains(id)
                    && !overflow_ids.contains(id)
            })
            .collect();

        // Bench rebuild: explicit order, then overflow, then orphans.
        let mut bench_sequence: Vec<(SignupId, Option<Role>, bool)> = Vec::new();
        for entry in &submission.bench_queue {
            bench_sequence.push((entry.signup_id, entry.chosen_role, false));
        }
        for signup_id in &overflow {
            bench_sequence.push((*signup_id, None, true));
        }
        for signup_id in &orphans {
            bench_sequence.push((*signup_id, None, true));
        }

        let mut seen_bench: HashSet<SignupId> = HashSet::new();
        let mut auto_benched: Vec<SignupId> = Vec::new();
        let mut position = 0;
        for (signup_id, new_role, is_auto) in bench_sequence {
            if seen_bench.contains(&signup_id) || placed_role_ids.contains(&signup_id) {
                continue;
            }
            let Some(signup) = by_id.get(&signup_id) else {
                continue;
            };
            if !signup.is_active() {
                continue;
            }
            seen_bench.insert(signup_id);

            if let Some(role) = new_role {
                if signup.chosen_role != role {
                    self.change_role(&mut *tx, signup, role).await?;
                }
            }

            let slot = LineupSlot {
                id: SlotId::new(),
                event_id,
                group: SlotGroup::Bench,
                position,
                signup_id: Some(signup.id),
                character_id: Some(signup.character_id),
                confirmed_by: Some(ctx.actor_id),
                confirmed_at: Some(now),
            };
            tx.place_slot(&slot).await?;
            if is_auto {
                auto_benched.push(signup_id);
            }
            position += 1;
        }

        let mut events: Vec<LineupEvent> = Vec::new();
        for signup_id in &auto_benched {
            if let Some(pos) = ledger::bench_rank(&mut *tx, *signup_id).await? {
                events.push(LineupEvent::Benched {
                    signup_id: *signup_id,
                    event_id,
                    role: pos.waiting_for,
                    position: pos.rank,
                });
            }
        }

        // One promotion per net-freed slot, per role group.
        let empty = HashSet::new();
        for group in SlotGroup::ALL {
            let Some(role) = group.role() else { continue };
            let old_ids = old_role_ids.get(&group).unwrap_or(&empty);
            let new_ids = new_role_ids.get(&group).unwrap_or(&empty);
            let removed = old_ids.difference(new_ids).count() as i64;
            let added = new_ids.difference(old_ids).count() as i64;
            let freed = removed - added;
            for _ in 0..freed.max(0) {
                match ledger::promote_first_eligible(&mut *tx, event_id, role).await? {
                    Some(promoted) => events.push(LineupEvent::Promoted {
                        signup_id: promoted.id,
                        event_id,
                        role,
                    }),
                    None => break,
                }
            }
        }

        let slots = tx.list_slots(event_id).await?;
        let signups = tx.signups_for_event(event_id).await?;
        let lineup = LineupView::build(&slots, &signups);
        tx.commit().await?;

        info!(
            %event_id,
            role_slots = all_new_role.len(),
            benched = seen_bench.len(),
            demoted = auto_benched.len(),
            "lineup rewritten"
        );
        Ok(RewriteOutcome { lineup, events })
    }

    /// Validate and persist a role change implied by the rewrite.
    async fn change_role(
        &self,
        tx: &mut dyn RosterTx,
        signup: &Signup,
        role: Role,
    ) -> RosterResult<()> {
        let character = tx.character(signup.character_id).await?.ok_or_else(|| {
            RosterError::not_found(format!("character {} not found", signup.character_id))
        })?;
        validate_class_role(character.class, role)?;
        tx.update_signup_fields(
            signup.id,
            role,
            signup.chosen_spec.clone(),
            signup.note.clone(),
        )
        .await?;
        Ok(())
    }
}
