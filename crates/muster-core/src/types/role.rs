//! Role and slot-group enums.
//!
//! A [`Role`] is what a signup asks to play; a [`SlotGroup`] is where a
//! lineup slot lives. The two differ only in the distinguished `Bench`
//! variant, which is a queue position rather than a playable role.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A playable role with a fixed per-event capacity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "signup_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Primary tank.
    MainTank,
    /// Secondary tank.
    OffTank,
    /// General tank slot.
    Tank,
    /// Healer.
    Healer,
    /// Damage dealer.
    Dps,
}

impl Role {
    /// All roles, in lineup display order.
    pub const ALL: [Role; 5] = [
        Role::MainTank,
        Role::OffTank,
        Role::Tank,
        Role::Healer,
        Role::Dps,
    ];

    /// Stable string form used in fingerprints and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::MainTank => "main_tank",
            Role::OffTank => "off_tank",
            Role::Tank => "tank",
            Role::Healer => "healer",
            Role::Dps => "dps",
        }
    }

    /// The slot group a role slot for this role lives in.
    pub fn slot_group(&self) -> SlotGroup {
        match self {
            Role::MainTank => SlotGroup::MainTank,
            Role::OffTank => SlotGroup::OffTank,
            Role::Tank => SlotGroup::Tank,
            Role::Healer => SlotGroup::Healer,
            Role::Dps => SlotGroup::Dps,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main_tank" => Ok(Role::MainTank),
            "off_tank" => Ok(Role::OffTank),
            "tank" => Ok(Role::Tank),
            "healer" => Ok(Role::Healer),
            "dps" => Ok(Role::Dps),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The group a lineup slot belongs to: one of the role groups, or the
/// bench pseudo-group whose positions encode FIFO promotion order.
/// Ordering follows lineup display order, with the bench sorted last.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "slot_group", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SlotGroup {
    /// Primary tank slots.
    MainTank,
    /// Secondary tank slots.
    OffTank,
    /// General tank slots.
    Tank,
    /// Healer slots.
    Healer,
    /// Damage dealer slots.
    Dps,
    /// The waiting queue.
    Bench,
}

impl SlotGroup {
    /// All groups in fingerprint order (role groups first, bench last).
    pub const ALL: [SlotGroup; 6] = [
        SlotGroup::MainTank,
        SlotGroup::OffTank,
        SlotGroup::Tank,
        SlotGroup::Healer,
        SlotGroup::Dps,
        SlotGroup::Bench,
    ];

    /// Stable string form used in fingerprints and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotGroup::MainTank => "main_tank",
            SlotGroup::OffTank => "off_tank",
            SlotGroup::Tank => "tank",
            SlotGroup::Healer => "healer",
            SlotGroup::Dps => "dps",
            SlotGroup::Bench => "bench",
        }
    }

    /// The role this group holds slots for, or `None` for the bench.
    pub fn role(&self) -> Option<Role> {
        match self {
            SlotGroup::MainTank => Some(Role::MainTank),
            SlotGroup::OffTank => Some(Role::OffTank),
            SlotGroup::Tank => Some(Role::Tank),
            SlotGroup::Healer => Some(Role::Healer),
            SlotGroup::Dps => Some(Role::Dps),
            SlotGroup::Bench => None,
        }
    }

    /// Whether this is a role group (occupies capacity) as opposed to bench.
    pub fn is_role(&self) -> bool {
        !matches!(self, SlotGroup::Bench)
    }
}

impl fmt::Display for SlotGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
