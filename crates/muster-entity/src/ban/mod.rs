//! Raid ban entity.

pub mod model;

pub use model::RaidBan;
