//! # Muster
//!
//! Capacity-constrained roster allocation for recurring group events.
//!
//! A raid event offers a fixed number of typed role slots; more players
//! sign up than fit. The allocation engine assigns each signup to a role
//! slot or the FIFO bench queue, automatically promotes waiting players
//! when a slot frees, and guards officer lineup rewrites with optimistic
//! concurrency. State-change events are returned to the caller for
//! delivery to notification collaborators.
//!
//! This crate is a facade over the workspace members:
//!
//! - [`muster_core`] — identifiers, roles, errors, events, configuration
//! - [`muster_entity`] — domain models and the class→role table
//! - [`muster_store`] — transactional storage (in-memory and PostgreSQL)
//! - [`muster_service`] — the allocation engine and its subsystems

pub use muster_core::config::{self, RosterConfig};
pub use muster_core::error::RosterError;
pub use muster_core::events::{self, LineupEvent, RosterEvent};
pub use muster_core::result::RosterResult;
pub use muster_core::types;

pub use muster_entity as entity;
pub use muster_service as service;
pub use muster_store as store;

pub use muster_service::{
    BanService, LineupService, ReplacementService, RequestContext, SignupService,
};
pub use muster_store::{MemoryRosterStore, PgRosterStore, RosterStore};
