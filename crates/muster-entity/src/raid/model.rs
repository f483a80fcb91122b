//! Role capacity entity (the capacity table).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use muster_core::config::limits::DefaultLimitsConfig;
use muster_core::types::{EventId, Role};

/// Per-event integer capacity for each role group.
///
/// Derived from an external raid definition and read-only to the engine.
/// A capacity of zero means the role is not offered for the event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleLimits {
    /// The event these limits apply to.
    pub event_id: EventId,
    /// Main tank slots.
    pub main_tank_slots: i32,
    /// Off tank slots.
    pub off_tank_slots: i32,
    /// General tank slots.
    pub tank_slots: i32,
    /// Healer slots.
    pub healer_slots: i32,
    /// Damage dealer slots.
    pub dps_slots: i32,
}

impl RoleLimits {
    /// Capacity for a single role.
    pub fn capacity(&self, role: Role) -> i32 {
        match role {
            Role::MainTank => self.main_tank_slots,
            Role::OffTank => self.off_tank_slots,
            Role::Tank => self.tank_slots,
            Role::Healer => self.healer_slots,
            Role::Dps => self.dps_slots,
        }
    }

    /// Total role capacity across all groups.
    pub fn total(&self) -> i32 {
        Role::ALL.iter().map(|r| self.capacity(*r)).sum()
    }

    /// Build limits for an event from the configured fallback composition.
    pub fn from_defaults(event_id: EventId, defaults: &DefaultLimitsConfig) -> Self {
        Self {
            event_id,
            main_tank_slots: defaults.main_tank_slots,
            off_tank_slots: defaults.off_tank_slots,
            tank_slots: defaults.tank_slots,
            healer_slots: defaults.healer_slots,
            dps_slots: defaults.dps_slots,
        }
    }
}
