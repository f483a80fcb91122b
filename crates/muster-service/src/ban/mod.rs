//! Permanent exclusion subsystem.

pub mod service;

pub use service::{BanOutcome, BanService};
