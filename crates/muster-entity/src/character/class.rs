//! Character classes and the static class→role capability table.
//!
//! The table is the single gate for every role assignment: initial signup,
//! role change, and bulk lineup rewrite all validate against it before any
//! ledger mutation. Rejection aborts the whole operation.

use std::fmt;

use serde::{Deserialize, Serialize};

use muster_core::error::RosterError;
use muster_core::result::RosterResult;
use muster_core::types::Role;

/// The ten character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "character_class", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CharacterClass {
    DeathKnight,
    Druid,
    Hunter,
    Mage,
    Paladin,
    Priest,
    Rogue,
    Shaman,
    Warlock,
    Warrior,
}

impl CharacterClass {
    /// Human-readable class name.
    pub fn display_name(&self) -> &'static str {
        match self {
            CharacterClass::DeathKnight => "Death Knight",
            CharacterClass::Druid => "Druid",
            CharacterClass::Hunter => "Hunter",
            CharacterClass::Mage => "Mage",
            CharacterClass::Paladin => "Paladin",
            CharacterClass::Priest => "Priest",
            CharacterClass::Rogue => "Rogue",
            CharacterClass::Shaman => "Shaman",
            CharacterClass::Warlock => "Warlock",
            CharacterClass::Warrior => "Warrior",
        }
    }

    /// The roles this class may legally occupy.
    pub fn allowed_roles(&self) -> &'static [Role] {
        use Role::{Dps, Healer, MainTank, OffTank, Tank};
        match self {
            CharacterClass::DeathKnight => &[MainTank, OffTank, Tank, Dps],
            CharacterClass::Druid => &[MainTank, OffTank, Tank, Healer, Dps],
            CharacterClass::Hunter => &[Dps],
            CharacterClass::Mage => &[Dps],
            CharacterClass::Paladin => &[MainTank, OffTank, Tank, Healer, Dps],
            CharacterClass::Priest => &[Healer, Dps],
            CharacterClass::Rogue => &[Dps],
            CharacterClass::Shaman => &[Healer, Dps],
            CharacterClass::Warlock => &[Dps],
            CharacterClass::Warrior => &[MainTank, OffTank, Tank, Dps],
        }
    }

    /// Whether this class may take the given role.
    pub fn can_take(&self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }

    /// The default role for a freshly created character of this class.
    pub fn default_role(&self) -> Role {
        self.allowed_roles()[0]
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Validate that `class` may take `role`.
///
/// Returns [`RosterError::IncompatibleRole`] otherwise.
pub fn validate_class_role(class: CharacterClass, role: Role) -> RosterResult<()> {
    if class.can_take(role) {
        Ok(())
    } else {
        Err(RosterError::IncompatibleRole {
            class: class.display_name().to_string(),
            role,
        })
    }
}
