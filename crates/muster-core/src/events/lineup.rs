//! Lineup allocation events.

use serde::{Deserialize, Serialize};

use crate::types::{EventId, Role, SignupId, SlotGroup};

/// State changes produced by the allocation engine.
///
/// Every mutating operation returns the list of events it produced so the
/// caller can forward them to notification and real-time collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LineupEvent {
    /// A signup received a role slot.
    Placed {
        /// The placed signup.
        signup_id: SignupId,
        /// The event the slot belongs to.
        event_id: EventId,
        /// The group the signup was placed in.
        group: SlotGroup,
    },
    /// A signup was appended to the bench queue.
    Benched {
        /// The benched signup.
        signup_id: SignupId,
        /// The event the bench belongs to.
        event_id: EventId,
        /// The role the signup is waiting for.
        role: Role,
        /// 1-based rank among bench entries waiting for the same role.
        position: i64,
    },
    /// A benched signup was moved into a freed role slot.
    Promoted {
        /// The promoted signup.
        signup_id: SignupId,
        /// The event the slot belongs to.
        event_id: EventId,
        /// The role whose slot was filled.
        role: Role,
    },
    /// A signup lost its placement (decline, delete, ban, or leave).
    Removed {
        /// The removed signup.
        signup_id: SignupId,
        /// The event the placement belonged to.
        event_id: EventId,
    },
}
