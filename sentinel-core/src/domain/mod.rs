//! Domain models: probe targets, the live target registry and probe outcomes.

pub mod outcome;
pub mod registry;
pub mod target;
