//! Grouped lineup projection and the concurrency fingerprint.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use muster_core::types::{Role, SignupId, SlotGroup};
use muster_entity::signup::{LineupSlot, Signup};

/// One occupied slot in a lineup view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineupEntry {
    /// The placement.
    pub slot: LineupSlot,
    /// The occupying signup.
    pub signup: Signup,
}

/// A signup's position in the bench queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchPosition {
    /// The role the signup is waiting for.
    pub waiting_for: Role,
    /// 1-based rank among bench entries waiting for the same role.
    pub rank: i64,
}

/// The full lineup of an event, grouped by role with the bench queue in
/// promotion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineupView {
    /// Main tank slots in position order.
    pub main_tanks: Vec<LineupEntry>,
    /// Off tank slots in position order.
    pub off_tanks: Vec<LineupEntry>,
    /// General tank slots in position order.
    pub tanks: Vec<LineupEntry>,
    /// Healer slots in position order.
    pub healers: Vec<LineupEntry>,
    /// Damage dealer slots in position order.
    pub dps: Vec<LineupEntry>,
    /// The bench queue in FIFO order.
    pub bench_queue: Vec<LineupEntry>,
    /// Fingerprint of the lineup for optimistic-concurrency checks.
    pub version: String,
}

impl LineupView {
    /// Build a view from an event's slots (ordered by group and position)
    /// and its signups.
    pub fn build(slots: &[LineupSlot], signups: &[Signup]) -> Self {
        let by_id: HashMap<SignupId, &Signup> = signups.iter().map(|s| (s.id, s)).collect();

        let mut view = LineupView::default();
        for slot in slots {
            let Some(signup_id) = slot.signup_id else {
                continue;
            };
            let Some(signup) = by_id.get(&signup_id) else {
                continue;
            };
            let entry = LineupEntry {
                slot: slot.clone(),
                signup: (*signup).clone(),
            };
            match slot.group {
                SlotGroup::MainTank => view.main_tanks.push(entry),
                SlotGroup::OffTank => view.off_tanks.push(entry),
                SlotGroup::Tank => view.tanks.push(entry),
                SlotGroup::Healer => view.healers.push(entry),
                SlotGroup::Dps => view.dps.push(entry),
                SlotGroup::Bench => view.bench_queue.push(entry),
            }
        }
        view.version = fingerprint(slots);
        view
    }

    /// Entries for a single role group.
    pub fn group(&self, group: SlotGroup) -> &[LineupEntry] {
        match group {
            SlotGroup::MainTank => &self.main_tanks,
            SlotGroup::OffTank => &self.off_tanks,
            SlotGroup::Tank => &self.tanks,
            SlotGroup::Healer => &self.healers,
            SlotGroup::Dps => &self.dps,
            SlotGroup::Bench => &self.bench_queue,
        }
    }
}

/// Deterministic digest over the ordered signup-id lists of every group.
///
/// The slots must already be ordered by (group, position), which is how
/// the store returns them.
pub fn fingerprint(slots: &[LineupSlot]) -> String {
    let mut parts = Vec::with_capacity(SlotGroup::ALL.len());
    for group in SlotGroup::ALL {
        let ids: Vec<String> = slots
            .iter()
            .filter(|slot| slot.group == group)
            .filter_map(|slot| slot.signup_id)
            .map(|id| id.to_string())
            .collect();
        parts.push(format!("{}:{}", group, ids.join(",")));
    }
    parts.join("|")
}
