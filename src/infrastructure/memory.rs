//! In-memory node store.

use std::io;
use std::sync::Mutex;

use crate::domain::Node;
use crate::infrastructure::traits::{
    lock_document, ForestDocument, NodeStore, NodeTransaction, StagedTransaction,
};

/// Node store kept entirely in process memory.
///
/// A single mutex serializes all transactions.
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    document: Mutex<ForestDocument>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing nodes, bypassing any checks.
    pub fn with_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let document = ForestDocument {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
            ..ForestDocument::default()
        };
        Self {
            document: Mutex::new(document),
        }
    }
}

impl NodeStore for MemoryNodeStore {
    fn begin(&self) -> io::Result<Box<dyn NodeTransaction + '_>> {
        let document = lock_document(&self.document)?;
        Ok(Box::new(StagedTransaction::new(document, None)))
    }
}
