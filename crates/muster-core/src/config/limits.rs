//! Fallback role capacity configuration.

use serde::{Deserialize, Serialize};

use crate::types::Role;

/// Role capacities applied when an event has no explicit composition.
///
/// The defaults mirror a standard 25-player composition: one main tank,
/// one off tank, five healers, eighteen damage dealers, and no general
/// tank slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultLimitsConfig {
    /// Main tank slots.
    #[serde(default = "default_main_tank")]
    pub main_tank_slots: i32,
    /// Off tank slots.
    #[serde(default = "default_off_tank")]
    pub off_tank_slots: i32,
    /// General tank slots.
    #[serde(default)]
    pub tank_slots: i32,
    /// Healer slots.
    #[serde(default = "default_healer")]
    pub healer_slots: i32,
    /// Damage dealer slots.
    #[serde(default = "default_dps")]
    pub dps_slots: i32,
}

impl DefaultLimitsConfig {
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
}

impl Default for DefaultLimitsConfig {
    fn default() -> Self {
        Self {
            main_tank_slots: default_main_tank(),
            off_tank_slots: default_off_tank(),
            tank_slots: 0,
            healer_slots: default_healer(),
            dps_slots: default_dps(),
        }
    }
}

fn default_main_tank() -> i32 {
    1
}

fn default_off_tank() -> i32 {
    1
}

fn default_healer() -> i32 {
    5
}

fn default_dps() -> i32 {
    18
}
