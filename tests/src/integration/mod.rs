//! Cross-crate integration tests.

pub mod events;
pub mod flows;
pub mod invariants;
pub mod recall;
