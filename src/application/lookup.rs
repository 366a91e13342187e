//! Typed node reads and writes inside a transaction.

use crate::application::{ApplicationResult, StoreResultExt};
use crate::domain::{DomainError, Node, NodeId};
use crate::infrastructure::traits::NodeTransaction;

/// Read a node, mapping absence through `missing`.
pub(crate) fn fetch_or(
    tx: &mut dyn NodeTransaction,
    id: NodeId,
    missing: fn(NodeId) -> DomainError,
) -> ApplicationResult<Node> {
    tx.get(id)
        .with_node_context("read node", id)?
        .ok_or_else(|| missing(id).into())
}

/// Read a node that another node refers to.
///
/// Absence means the stored links are broken, not that the caller passed a
/// bad id.
pub(crate) fn fetch_linked(
    tx: &mut dyn NodeTransaction,
    id: NodeId,
    relation: &str,
) -> ApplicationResult<Node> {
    tx.get(id)
        .with_node_context("read node", id)?
        .ok_or_else(|| DomainError::corrupt(id, format!("{} does not exist", relation)).into())
}

pub(crate) fn save(tx: &mut dyn NodeTransaction, node: &Node) -> ApplicationResult<()> {
    tx.put(node).with_node_context("write node", node.id)
}
