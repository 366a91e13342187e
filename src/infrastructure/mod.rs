//! Infrastructure layer: storage implementations and DI container
//!
//! This layer implements the storage boundary traits and wires up services.

pub mod di;
pub mod error;
pub mod json_file;
pub mod memory;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use json_file::JsonFileNodeStore;
pub use memory::MemoryNodeStore;
pub use traits::{ForestDocument, NodeStore, NodeTransaction};
