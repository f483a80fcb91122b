//! Unified application error type for Muster.
//!
//! All crates map their internal failures into [`RosterError`] for
//! consistent propagation through the `?` operator. Every variant is
//! value-returned; nothing is panicked across subsystem boundaries, and a
//! failed operation leaves no partial mutation behind.

use thiserror::Error;

use crate::types::{CharacterId, Role};

/// The unified error type used throughout Muster.
#[derive(Debug, Error)]
pub enum RosterError {
    /// The character's class cannot take the requested role.
    #[error("{class} cannot take the {role} role")]
    IncompatibleRole {
        /// Display name of the character class.
        class: String,
        /// The role that was requested.
        role: Role,
    },

    /// Every slot for the requested role is occupied. The caller must
    /// choose bench placement or abort; the error is never retried
    /// automatically.
    #[error("all {role} slots are full ({occupied}/{capacity})")]
    RoleFull {
        /// The role whose slots are exhausted.
        role: Role,
        /// Occupied role slots at the time of the check.
        occupied: i64,
        /// Configured capacity for the role.
        capacity: i64,
    },

    /// The character is permanently banned from the event.
    #[error("character {character_id} is permanently excluded from this event")]
    PermanentlyExcluded {
        /// The banned character.
        character_id: CharacterId,
    },

    /// The event offers no slots for the requested role.
    #[error("no {role} slots are defined for this event")]
    NoCapacityDefined {
        /// The role with zero (or missing) capacity.
        role: Role,
    },

    /// Another live signup already uses the character on the event.
    #[error("character {character_id} already has an active signup for this event")]
    CharacterConflict {
        /// The character that is already signed up.
        character_id: CharacterId,
    },

    /// The lineup was modified by another officer since it was loaded.
    /// The caller must refetch and retry; conflicting rewrites are never
    /// silently merged.
    #[error("lineup was modified concurrently; reload and retry")]
    StaleLineup,

    /// The requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A lifecycle or uniqueness rule was violated.
    #[error("{0}")]
    Conflict(String),

    /// A storage-layer failure.
    #[error("storage error: {message}")]
    Storage {
        /// Human-readable description of the failed operation.
        message: String,
        /// Underlying driver error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

impl RosterError {
    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Create a storage error without an underlying cause.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Create a storage error wrapping an underlying cause.
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<sqlx::Error> for RosterError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("row not found"),
            other => Self::storage_with_source("database error", other),
        }
    }
}
