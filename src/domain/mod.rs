//! Domain layer: entities and structural rules
//!
//! This layer is independent of external concerns (no storage, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod invariants;

pub use entities::{Node, NodeId};
pub use error::DomainError;
pub use invariants::{verify_forest, Violation, ViolationKind};

/// Expand environment variables and `~` in a path string.
///
/// Falls back to the input unchanged when a variable cannot be resolved.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
