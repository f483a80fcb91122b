//! # muster-core
//!
//! Core crate for Muster. Contains typed identifiers, the role and slot
//! group vocabulary, domain events, configuration schemas, and the unified
//! error system.
//!
//! This crate has **no** internal dependencies on other Muster crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod types;

pub use error::RosterError;
pub use result::RosterResult;
