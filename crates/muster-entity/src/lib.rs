//! # muster-entity
//!
//! Domain models for Muster: signups and lineup slots, character metadata
//! with the class→role capability table, per-event role capacities, ban
//! records, and character replacement requests.
//!
//! All models derive `sqlx::FromRow` so the same structs travel through
//! both the in-memory and PostgreSQL stores.

pub mod ban;
pub mod character;
pub mod raid;
pub mod replacement;
pub mod signup;

pub use ban::RaidBan;
pub use character::{CharacterClass, CharacterProfile};
pub use raid::RoleLimits;
pub use replacement::{CharacterReplacement, ReplacementAction, ReplacementStatus};
pub use signup::{LineupSlot, NewSignup, Signup};
