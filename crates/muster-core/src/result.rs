//! Result alias used across all Muster crates.

use crate::error::RosterError;

/// Convenience alias for `Result<T, RosterError>`.
pub type RosterResult<T> = Result<T, RosterError>;
