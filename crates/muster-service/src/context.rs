//! Request context carrying the acting user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use muster_core::types::UserId;

/// Context for the current request.
///
/// Authentication and permission checks happen upstream; the engine only
/// needs to know *who* is acting, for confirmation stamps, ban records,
/// and event attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user's ID.
    pub actor_id: UserId,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context for the given actor.
    pub fn new(actor_id: UserId) -> Self {
        Self {
            actor_id,
            request_time: Utc::now(),
        }
    }
}
