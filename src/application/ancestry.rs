//! Ancestor lookup along parent links.

use tracing::{instrument, trace};

use crate::application::lookup::{fetch_linked, fetch_or};
use crate::application::{ApplicationResult, StoreResultExt};
use crate::domain::{DomainError, NodeId};
use crate::infrastructure::traits::NodeTransaction;

/// Find the direct child of `ancestor` on the path down to `descendant`.
///
/// Walks parent links upward from `descendant`. Returns `None` when the walk
/// reaches a root without passing `ancestor`, and also when both ids are the
/// same (a node is not its own descendant). The walk is bounded by the node
/// count, so a corrupted parent chain fails instead of looping.
#[instrument(level = "debug", skip(tx))]
pub fn locate_bridge_child(
    tx: &mut dyn NodeTransaction,
    ancestor: NodeId,
    descendant: NodeId,
) -> ApplicationResult<Option<NodeId>> {
    if ancestor == descendant {
        return Ok(None);
    }
    let limit = tx.count().with_store_context("count nodes")?;
    let mut current = fetch_or(tx, descendant, DomainError::NodeNotFound)?;

    for _ in 0..limit {
        match current.parent_node {
            None => return Ok(None),
            Some(parent) if parent == ancestor => {
                trace!("bridge child of {} towards {} is {}", ancestor, descendant, current.id);
                return Ok(Some(current.id));
            }
            Some(parent) => current = fetch_linked(tx, parent, "parent")?,
        }
    }

    Err(DomainError::corrupt(descendant, "parent chain does not terminate").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationError;
    use crate::domain::Node;
    use crate::infrastructure::traits::NodeStore;
    use crate::infrastructure::MemoryNodeStore;

    /// root -> a -> b -> c, plus root -> x
    fn chain() -> (MemoryNodeStore, Vec<Node>) {
        let mut nodes: Vec<Node> = ["root", "a", "b", "c", "x"]
            .iter()
            .map(|d| Node::new(*d).unwrap())
            .collect();
        let root_id = nodes[0].id;
        for (parent, child) in [(0, 1), (1, 2), (2, 3), (0, 4)] {
            let parent_id = nodes[parent].id;
            let parent_height = nodes[parent].height;
            let child_id = nodes[child].id;
            nodes[parent].add_child(child_id);
            nodes[child].parent_node = Some(parent_id);
            nodes[child].height = parent_height + 1;
            nodes[child].root_node = root_id;
        }
        (MemoryNodeStore::with_nodes(nodes.clone()), nodes)
    }

    #[test]
    fn given_deep_descendant_when_locating_then_returns_direct_child() {
        let (store, n) = chain();
        let mut tx = store.begin().unwrap();

        let bridge = locate_bridge_child(tx.as_mut(), n[0].id, n[3].id).unwrap();

        assert_eq!(bridge, Some(n[1].id));
    }

    #[test]
    fn given_direct_child_when_locating_then_returns_child_itself() {
        let (store, n) = chain();
        let mut tx = store.begin().unwrap();

        assert_eq!(
            locate_bridge_child(tx.as_mut(), n[2].id, n[3].id).unwrap(),
            Some(n[3].id)
        );
    }

    #[test]
    fn given_unrelated_nodes_when_locating_then_none() {
        let (store, n) = chain();
        let mut tx = store.begin().unwrap();

        assert_eq!(locate_bridge_child(tx.as_mut(), n[1].id, n[4].id).unwrap(), None);
        assert_eq!(locate_bridge_child(tx.as_mut(), n[3].id, n[0].id).unwrap(), None);
    }

    #[test]
    fn given_same_node_when_locating_then_none() {
        let (store, n) = chain();
        let mut tx = store.begin().unwrap();

        assert_eq!(locate_bridge_child(tx.as_mut(), n[2].id, n[2].id).unwrap(), None);
    }

    #[test]
    fn given_parent_cycle_when_locating_then_corrupt_hierarchy() {
        let mut a = Node::new("a").unwrap();
        let mut b = Node::new("b").unwrap();
        let outsider = Node::new("outsider").unwrap();
        a.parent_node = Some(b.id);
        b.parent_node = Some(a.id);
        let store = MemoryNodeStore::with_nodes([a.clone(), b, outsider.clone()]);
        let mut tx = store.begin().unwrap();

        let err = locate_bridge_child(tx.as_mut(), outsider.id, a.id).unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::CorruptHierarchy { .. })
        ));
    }
}
