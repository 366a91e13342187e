//! Storage boundary traits for testability
//!
//! These traits abstract the persistence collaborator, allowing the engine
//! to run against an in-memory map, a JSON document, or a test double.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::{Node, NodeId};

/// Store of nodes that hands out serialized transactions.
pub trait NodeStore: Send + Sync {
    /// Begin a transaction.
    ///
    /// Blocks until no other transaction on this store is open. The returned
    /// transaction holds the store's lock until it is committed or dropped.
    fn begin(&self) -> io::Result<Box<dyn NodeTransaction + '_>>;
}

/// Scoped unit of work against a [`NodeStore`].
///
/// Reads observe this transaction's own staged writes. Dropping the
/// transaction without calling [`commit`](NodeTransaction::commit) discards
/// everything it staged.
pub trait NodeTransaction {
    /// Read a node by id.
    fn get(&mut self, id: NodeId) -> io::Result<Option<Node>>;

    /// Insert or replace a node.
    fn put(&mut self, node: &Node) -> io::Result<()>;

    /// Remove a node; returns whether it existed.
    fn remove(&mut self, id: NodeId) -> io::Result<bool>;

    /// All nodes, ordered by id.
    fn nodes(&mut self) -> io::Result<Vec<Node>>;

    /// Number of nodes.
    fn count(&mut self) -> io::Result<usize> {
        Ok(self.nodes()?.len())
    }

    /// A root node, if any exists (first by id).
    fn find_root(&mut self) -> io::Result<Option<Node>> {
        Ok(self.nodes()?.into_iter().find(Node::is_root))
    }

    /// Make every staged write visible to later transactions.
    fn commit(self: Box<Self>) -> io::Result<()>;
}

/// On-disk and in-memory form of the whole forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestDocument {
    pub version: u32,
    pub nodes: BTreeMap<NodeId, Node>,
}

pub const DOCUMENT_VERSION: u32 = 1;

impl Default for ForestDocument {
    fn default() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            nodes: BTreeMap::new(),
        }
    }
}

impl ForestDocument {
    fn apply(&mut self, staged: BTreeMap<NodeId, Option<Node>>) {
        for (id, entry) in staged {
            match entry {
                Some(node) => {
                    self.nodes.insert(id, node);
                }
                None => {
                    self.nodes.remove(&id);
                }
            }
        }
    }
}

/// Persists a committed document before it becomes visible.
pub(crate) trait DocumentSink: Send + Sync {
    fn persist(&self, document: &ForestDocument) -> io::Result<()>;
}

pub(crate) fn lock_document(lock: &Mutex<ForestDocument>) -> io::Result<MutexGuard<'_, ForestDocument>> {
    lock.lock()
        .map_err(|_| io::Error::other("node store lock poisoned"))
}

/// Transaction that stages writes over a locked document.
///
/// `None` in `staged` marks a removal. `lock_file`, when set, holds an
/// advisory file lock that is released when the transaction ends.
pub(crate) struct StagedTransaction<'a> {
    document: MutexGuard<'a, ForestDocument>,
    staged: BTreeMap<NodeId, Option<Node>>,
    sink: Option<&'a dyn DocumentSink>,
    lock_file: Option<File>,
}

impl<'a> StagedTransaction<'a> {
    pub(crate) fn new(
        document: MutexGuard<'a, ForestDocument>,
        sink: Option<&'a dyn DocumentSink>,
    ) -> Self {
        Self {
            document,
            staged: BTreeMap::new(),
            sink,
            lock_file: None,
        }
    }

    /// Keep `lock_file` (and its lock) until commit or drop.
    pub(crate) fn holding(mut self, lock_file: File) -> Self {
        self.lock_file = Some(lock_file);
        self
    }
}

impl NodeTransaction for StagedTransaction<'_> {
    fn get(&mut self, id: NodeId) -> io::Result<Option<Node>> {
        match self.staged.get(&id) {
            Some(entry) => Ok(entry.clone()),
            None => Ok(self.document.nodes.get(&id).cloned()),
        }
    }

    fn put(&mut self, node: &Node) -> io::Result<()> {
        trace!("stage put {}", node.id);
        self.staged.insert(node.id, Some(node.clone()));
        Ok(())
    }

    fn remove(&mut self, id: NodeId) -> io::Result<bool> {
        let existed = self.get(id)?.is_some();
        trace!("stage remove {} (existed: {})", id, existed);
        self.staged.insert(id, None);
        Ok(existed)
    }

    fn nodes(&mut self) -> io::Result<Vec<Node>> {
        let mut merged: BTreeMap<NodeId, &Node> =
            self.document.nodes.iter().map(|(id, n)| (*id, n)).collect();
        for (id, entry) in &self.staged {
            match entry {
                Some(node) => {
                    merged.insert(*id, node);
                }
                None => {
                    merged.remove(id);
                }
            }
        }
        Ok(merged.into_values().cloned().collect())
    }

    fn count(&mut self) -> io::Result<usize> {
        let mut count = self.document.nodes.len();
        for (id, entry) in &self.staged {
            match (self.document.nodes.contains_key(id), entry.is_some()) {
                (false, true) => count += 1,
                (true, false) => count -= 1,
                _ => {}
            }
        }
        Ok(count)
    }

    fn commit(self: Box<Self>) -> io::Result<()> {
        let Self {
            mut document,
            staged,
            sink,
            lock_file: _lock_file,
        } = *self;
        if staged.is_empty() {
            return Ok(());
        }
        match sink {
            Some(sink) => {
                let mut next = document.clone();
                next.apply(staged);
                sink.persist(&next)?;
                *document = next;
            }
            None => document.apply(staged),
        }
        Ok(())
    }
}
