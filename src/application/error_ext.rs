//! Error conversion helpers for store operations
//!
//! Provides extension traits for cleaner error handling with node context.

use std::fmt::Display;
use std::io;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait StoreResultExt<T> {
    /// Add node context to a store error.
    ///
    /// # Example
    /// ```ignore
    /// tx.put(&node).with_node_context("write node", node.id)?;
    /// ```
    fn with_node_context(self, action: &str, id: impl Display) -> ApplicationResult<T>;

    /// Add free-form context to a store error.
    fn with_store_context(self, action: &str) -> ApplicationResult<T>;
}

impl<T> StoreResultExt<T> for io::Result<T> {
    fn with_node_context(self, action: &str, id: impl Display) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Store {
            context: format!("{}: {}", action, id),
            source: e,
        })
    }

    fn with_store_context(self, action: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Store {
            context: action.to_string(),
            source: e,
        })
    }
}
