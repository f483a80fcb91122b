//! Domain events emitted by roster operations.
//!
//! Events are returned synchronously from each engine operation; delivery
//! to notification or broadcast collaborators is the caller's concern.

pub mod lineup;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::UserId;

pub use lineup::LineupEvent;

/// Wrapper for a domain event with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The user whose action caused the event, if applicable.
    pub actor_id: Option<UserId>,
    /// The event payload.
    pub payload: LineupEvent,
}

impl RosterEvent {
    /// Create a new event wrapper.
    pub fn new(actor_id: Option<UserId>, payload: LineupEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor_id,
            payload,
        }
    }
}
