//! Application services
//!
//! Concrete service implementations that orchestrate the reparenting engine.
//! Services depend on the storage boundary traits (NodeStore, NodeTransaction)
//! but are themselves concrete structs, not traits.

mod forest;

pub use forest::{ForestService, MoveOutcome};
