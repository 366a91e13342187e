//! Forest mutation and query service
//!
//! Each public operation runs in exactly one store transaction: it commits
//! when the operation succeeds and rolls back on any error.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::lookup::{fetch_linked, fetch_or, save};
use crate::application::reparent::set_parent;
use crate::application::{ApplicationResult, StoreResultExt};
use crate::domain::{verify_forest, DomainError, Node, NodeId, Violation};
use crate::infrastructure::traits::{NodeStore, NodeTransaction};

/// Result of moving a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub moved: NodeId,
    pub new_parent: Option<NodeId>,
    pub old_parent: Option<NodeId>,
}

/// Service for creating, deleting and moving nodes.
pub struct ForestService {
    store: Arc<dyn NodeStore>,
}

impl ForestService {
    /// Create a new forest service.
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }

    /// Run `op` inside one transaction.
    ///
    /// Commits when `op` returns `Ok`; otherwise the transaction is dropped
    /// and every write it staged is discarded.
    pub fn atomically<T>(
        &self,
        op: impl FnOnce(&mut dyn NodeTransaction) -> ApplicationResult<T>,
    ) -> ApplicationResult<T> {
        let mut tx = self.store.begin().with_store_context("begin transaction")?;
        match op(tx.as_mut()) {
            Ok(value) => {
                tx.commit().with_store_context("commit transaction")?;
                Ok(value)
            }
            Err(e) => {
                debug!("rolling back: {}", e);
                Err(e)
            }
        }
    }

    /// Create a node, optionally under `parent`.
    ///
    /// Without a parent the new node becomes the root of the existing tree:
    /// the current root (if any) is demoted to its child.
    #[instrument(level = "debug", skip(self))]
    pub fn create_node(&self, description: &str, parent: Option<NodeId>) -> ApplicationResult<Node> {
        let mut node = Node::new(description)?;
        let node = self.atomically(move |tx| {
            if parent.is_none() {
                if let Some(root) = tx.find_root().with_store_context("find root")? {
                    node.root_node = root.id;
                }
            }
            save(tx, &node)?;
            set_parent(tx, node.id, parent)
        })?;
        info!("created node {} ({:?})", node.id, node.description);
        Ok(node)
    }

    /// Delete a non-root node, handing its children to its parent.
    ///
    /// Returns the node as it was before removal.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_node(&self, id: NodeId) -> ApplicationResult<Node> {
        let deleted = self.atomically(|tx| {
            let node = fetch_or(tx, id, DomainError::NodeNotFound)?;
            let Some(parent_id) = node.parent_node else {
                return Err(DomainError::IllegalRootDeletion(id).into());
            };

            let mut parent = fetch_linked(tx, parent_id, "parent")?;
            parent.remove_child(id);
            save(tx, &parent)?;

            for child in &node.children {
                set_parent(tx, *child, Some(parent_id))?;
            }

            tx.remove(id).with_node_context("remove node", id)?;
            Ok(node)
        })?;
        info!(
            "deleted node {}, {} children moved up",
            deleted.id,
            deleted.children.len()
        );
        Ok(deleted)
    }

    /// Move `id` under `parent`, or promote it to root when `None`.
    #[instrument(level = "debug", skip(self))]
    pub fn move_node(&self, id: NodeId, parent: Option<NodeId>) -> ApplicationResult<MoveOutcome> {
        let outcome = self.atomically(|tx| {
            let old_parent = fetch_or(tx, id, DomainError::NodeNotFound)?.parent_node;
            let moved = set_parent(tx, id, parent)?;
            Ok(MoveOutcome {
                moved: moved.id,
                new_parent: moved.parent_node,
                old_parent,
            })
        })?;
        info!(
            "moved node {}: {:?} -> {:?}",
            outcome.moved, outcome.old_parent, outcome.new_parent
        );
        Ok(outcome)
    }

    /// Reparent a node and return its updated state.
    #[instrument(level = "debug", skip(self))]
    pub fn set_parent(&self, id: NodeId, parent: Option<NodeId>) -> ApplicationResult<Node> {
        self.atomically(|tx| set_parent(tx, id, parent))
    }

    pub fn get(&self, id: NodeId) -> ApplicationResult<Node> {
        self.atomically(|tx| fetch_or(tx, id, DomainError::NodeNotFound))
    }

    /// The direct children of `id`, ordered by id.
    pub fn children(&self, id: NodeId) -> ApplicationResult<Vec<Node>> {
        self.atomically(|tx| {
            let node = fetch_or(tx, id, DomainError::NodeNotFound)?;
            node.children
                .iter()
                .map(|child| fetch_linked(tx, *child, "child"))
                .collect()
        })
    }

    pub fn list(&self) -> ApplicationResult<Vec<Node>> {
        self.atomically(|tx| tx.nodes().with_store_context("list nodes"))
    }

    /// Report every broken structural invariant in the store.
    #[instrument(level = "debug", skip(self))]
    pub fn check(&self) -> ApplicationResult<Vec<Violation>> {
        let nodes = self.list()?;
        let violations = verify_forest(&nodes);
        debug!(
            "checked {} nodes, {} violations",
            nodes.len(),
            violations.len()
        );
        Ok(violations)
    }
}
