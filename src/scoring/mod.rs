//! Scoring engine
//!
//! Pure functions from audit inputs to scores. Every surface computes
//! through here; nothing else in the crate holds its own copy of the
//! weighting logic.

pub mod browser;
pub mod extension;
pub mod posture;
