//! Reparenting: move a node under a new parent or promote it to root.
//!
//! Every structural mutation funnels through [`set_parent`]. The caller owns
//! the transaction; nothing here commits or rolls back.

use tracing::{debug, instrument};

use crate::application::ancestry::locate_bridge_child;
use crate::application::lookup::{fetch_linked, fetch_or, save};
use crate::application::recalibrate::recalibrate;
use crate::application::ApplicationResult;
use crate::domain::{DomainError, Node, NodeId};
use crate::infrastructure::traits::NodeTransaction;

/// Attach `node_id` under `new_parent`, or make it a root when `None`.
///
/// Attaching a node under one of its own descendants never creates a cycle:
/// the child of `node_id` on the path to the new parent (the pivot) is first
/// re-grafted into the slot `node_id` leaves behind, then `node_id` is
/// attached. Promoting a node to root demotes the previous root of its tree
/// to a child of the node, so no part of the old tree is orphaned.
///
/// Heights and roots of every affected subtree are recalibrated before
/// returning the updated node.
#[instrument(level = "debug", skip(tx))]
pub fn set_parent(
    tx: &mut dyn NodeTransaction,
    node_id: NodeId,
    new_parent: Option<NodeId>,
) -> ApplicationResult<Node> {
    let node = fetch_or(tx, node_id, DomainError::NodeNotFound)?;
    if let Some(parent_id) = new_parent {
        if parent_id == node_id {
            return Err(DomainError::SelfParent(node_id).into());
        }
        fetch_or(tx, parent_id, DomainError::ParentNotFound)?;
    }

    detach(tx, &node)?;

    match new_parent {
        None => promote_to_root(tx, node),
        Some(parent_id) => attach(tx, node, parent_id),
    }
}

/// Remove `node` from its current parent's children.
fn detach(tx: &mut dyn NodeTransaction, node: &Node) -> ApplicationResult<()> {
    let Some(parent_id) = node.parent_node else {
        return Ok(());
    };
    let mut parent = fetch_linked(tx, parent_id, "parent")?;
    if !parent.remove_child(node.id) {
        debug!("parent {} did not list child {}", parent_id, node.id);
    }
    debug!("detached {} from {}", node.id, parent_id);
    save(tx, &parent)
}

fn promote_to_root(tx: &mut dyn NodeTransaction, mut node: Node) -> ApplicationResult<Node> {
    let previous_root = node.root_node;
    if previous_root != node.id {
        let mut old_root = fetch_linked(tx, previous_root, "root")?;
        old_root.parent_node = Some(node.id);
        node.add_child(old_root.id);
        save(tx, &old_root)?;
        debug!("demoted root {} under {}", previous_root, node.id);
    }

    node.parent_node = None;
    node.height = 0;
    node.root_node = node.id;
    save(tx, &node)?;

    recalibrate(tx, node.id, 0, node.id)?;
    fetch_or(tx, node.id, DomainError::NodeNotFound)
}

fn attach(tx: &mut dyn NodeTransaction, mut node: Node, parent_id: NodeId) -> ApplicationResult<Node> {
    let old_parent = node.parent_node;
    let old_height = node.height;

    let recalibrate_from = match locate_bridge_child(tx, node.id, parent_id)? {
        Some(pivot_id) => {
            rotate(tx, &mut node, pivot_id, old_parent, old_height)?;
            pivot_id
        }
        None => node.id,
    };

    // Re-read: the rotation may have rewritten the new parent.
    let mut parent = fetch_or(tx, parent_id, DomainError::ParentNotFound)?;
    parent.add_child(node.id);
    node.parent_node = Some(parent_id);
    node.height = parent.height + 1;
    node.root_node = parent.root_node;
    save(tx, &parent)?;
    save(tx, &node)?;
    debug!("attached {} under {}", node.id, parent_id);

    let start = fetch_or(tx, recalibrate_from, DomainError::NodeNotFound)?;
    recalibrate(tx, start.id, start.height, start.root_node)?;
    fetch_or(tx, node.id, DomainError::NodeNotFound)
}

/// Move the pivot into the slot `node` is leaving.
///
/// The pivot takes `node`'s old parent, height and root; it leaves `node`'s
/// children. `node` itself is written by the caller.
fn rotate(
    tx: &mut dyn NodeTransaction,
    node: &mut Node,
    pivot_id: NodeId,
    old_parent: Option<NodeId>,
    old_height: u32,
) -> ApplicationResult<()> {
    let mut pivot = fetch_linked(tx, pivot_id, "child")?;
    pivot.parent_node = old_parent;
    pivot.height = old_height;
    pivot.root_node = match old_parent {
        Some(old_parent_id) => {
            let mut old_parent = fetch_linked(tx, old_parent_id, "parent")?;
            old_parent.add_child(pivot_id);
            save(tx, &old_parent)?;
            old_parent.root_node
        }
        None => pivot_id,
    };
    node.remove_child(pivot_id);
    save(tx, &pivot)?;
    debug!(
        "rotated pivot {} into slot of {} (parent {:?})",
        pivot_id, node.id, old_parent
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::verify_forest;
    use crate::infrastructure::traits::NodeStore;
    use crate::infrastructure::MemoryNodeStore;

    fn add(tx: &mut dyn NodeTransaction, description: &str, parent: Option<NodeId>) -> NodeId {
        let node = Node::new(description).unwrap();
        tx.put(&node).unwrap();
        if let Some(parent) = parent {
            set_parent(tx, node.id, Some(parent)).unwrap();
        }
        node.id
    }

    fn get(tx: &mut dyn NodeTransaction, id: NodeId) -> Node {
        tx.get(id).unwrap().unwrap()
    }

    #[test]
    fn given_chain_when_moving_leaf_to_root_then_height_one() {
        let store = MemoryNodeStore::new();
        let mut tx = store.begin().unwrap();
        let tx = tx.as_mut();
        let r = add(tx, "root", None);
        let a = add(tx, "a", Some(r));
        let b = add(tx, "b", Some(a));
        let c = add(tx, "c", Some(b));

        let moved = set_parent(tx, c, Some(r)).unwrap();

        assert_eq!(moved.parent_node, Some(r));
        assert_eq!(moved.height, 1);
        assert!(!get(tx, b).children.contains(&c));
        assert!(verify_forest(&tx.nodes().unwrap()).is_empty());
    }

    #[test]
    fn given_node_when_attaching_under_grandchild_then_pivot_takes_its_slot() {
        // r -> a -> b -> c ; move a under c
        let store = MemoryNodeStore::new();
        let mut tx = store.begin().unwrap();
        let tx = tx.as_mut();
        let r = add(tx, "root", None);
        let a = add(tx, "a", Some(r));
        let b = add(tx, "b", Some(a));
        let c = add(tx, "c", Some(b));

        set_parent(tx, a, Some(c)).unwrap();

        let (na, nb, nc) = (get(tx, a), get(tx, b), get(tx, c));
        assert_eq!(nb.parent_node, Some(r));
        assert_eq!(nb.height, 1);
        assert_eq!(nc.height, 2);
        assert_eq!(na.parent_node, Some(c));
        assert_eq!(na.height, 3);
        assert!(na.children.is_empty());
        assert!(verify_forest(&tx.nodes().unwrap()).is_empty());
    }

    #[test]
    fn given_root_when_attaching_under_other_subtree_child_then_siblings_stay_with_node() {
        // r -> {a, x}, a -> b ; move r under b
        let store = MemoryNodeStore::new();
        let mut tx = store.begin().unwrap();
        let tx = tx.as_mut();
        let r = add(tx, "root", None);
        let a = add(tx, "a", Some(r));
        let x = add(tx, "x", Some(r));
        let b = add(tx, "b", Some(a));

        set_parent(tx, r, Some(b)).unwrap();

        let na = get(tx, a);
        assert!(na.is_root());
        assert_eq!(na.root_node, a);
        let nr = get(tx, r);
        assert_eq!(nr.parent_node, Some(b));
        assert_eq!(nr.height, 2);
        assert_eq!(get(tx, x).height, 3);
        assert!(tx.nodes().unwrap().iter().all(|n| n.root_node == a));
        assert!(verify_forest(&tx.nodes().unwrap()).is_empty());
    }

    #[test]
    fn given_mid_node_when_promoting_then_old_root_becomes_its_child() {
        let store = MemoryNodeStore::new();
        let mut tx = store.begin().unwrap();
        let tx = tx.as_mut();
        let r = add(tx, "root", None);
        let a = add(tx, "a", Some(r));
        let b = add(tx, "b", Some(a));

        let promoted = set_parent(tx, a, None).unwrap();

        assert!(promoted.is_root());
        assert!(promoted.children.contains(&r));
        assert!(promoted.children.contains(&b));
        let nr = get(tx, r);
        assert_eq!(nr.parent_node, Some(a));
        assert_eq!(nr.height, 1);
        assert_eq!(nr.root_node, a);
        assert!(verify_forest(&tx.nodes().unwrap()).is_empty());
    }

    #[test]
    fn given_self_as_parent_when_setting_then_rejected() {
        let store = MemoryNodeStore::new();
        let mut tx = store.begin().unwrap();
        let r = add(tx.as_mut(), "root", None);

        let err = set_parent(tx.as_mut(), r, Some(r)).unwrap_err();

        assert_eq!(err.as_domain(), Some(&DomainError::SelfParent(r)));
    }
}
