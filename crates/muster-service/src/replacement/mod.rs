//! Character replacement subsystem.

pub mod service;

pub use service::{ReplacementOutcome, ReplacementService};
