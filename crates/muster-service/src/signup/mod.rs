//! Signup lifecycle service.

pub mod service;

pub use service::{SignupOutcome, SignupService, SignupUpdate};
