//! # muster-service
//!
//! The allocation engine: signup lifecycle with automatic bench placement,
//! FIFO bench promotion, bulk lineup rewrites with optimistic concurrency,
//! and the ban and character-replacement subsystems.
//!
//! Services follow constructor injection — the store is provided at
//! construction time via an `Arc` reference, and every operation runs
//! inside a single store transaction. Each mutating operation returns the
//! [`muster_core::events::LineupEvent`]s it produced for the caller to
//! forward to notification collaborators.

pub mod ban;
pub mod context;
pub mod lineup;
pub mod replacement;
pub mod signup;

pub use ban::BanService;
pub use context::RequestContext;
pub use lineup::{BenchEntry, LineupService, LineupSubmission, LineupView, RewriteOutcome};
pub use replacement::ReplacementService;
pub use signup::{SignupOutcome, SignupService, SignupUpdate};
