//! Height and root recalibration over a subtree.

use std::collections::{HashSet, VecDeque};

use tracing::{instrument, trace};

use crate::application::lookup::{fetch_linked, fetch_or, save};
use crate::application::ApplicationResult;
use crate::domain::{DomainError, NodeId};
use crate::infrastructure::traits::NodeTransaction;

/// Rewrite `height` and `root_node` for `start` and all of its descendants.
///
/// `start` gets `start_height`; every other node gets its parent's new
/// height plus one. All visited nodes get `root`. Breadth-first with an
/// explicit queue; a node reached twice means the children links contain a
/// cycle and the walk fails with `CorruptHierarchy`.
///
/// Only nodes whose height or root actually changes are written back; an
/// unchanged node already holds what a write would store. Returns the
/// number of nodes visited, written or not.
#[instrument(level = "debug", skip(tx))]
pub fn recalibrate(
    tx: &mut dyn NodeTransaction,
    start: NodeId,
    start_height: u32,
    root: NodeId,
) -> ApplicationResult<usize> {
    let mut queue = VecDeque::from([(start, start_height)]);
    let mut visited = HashSet::new();

    while let Some((id, height)) = queue.pop_front() {
        if !visited.insert(id) {
            return Err(DomainError::corrupt(id, "reached twice while walking children").into());
        }
        let mut node = if id == start {
            fetch_or(tx, id, DomainError::NodeNotFound)?
        } else {
            fetch_linked(tx, id, "child")?
        };

        if node.height != height || node.root_node != root {
            trace!(
                "recalibrate {}: height {} -> {}, root {} -> {}",
                id,
                node.height,
                height,
                node.root_node,
                root
            );
            node.height = height;
            node.root_node = root;
            save(tx, &node)?;
        }

        queue.extend(node.children.iter().map(|child| (*child, height + 1)));
    }

    Ok(visited.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationError;
    use crate::domain::Node;
    use crate::infrastructure::traits::NodeStore;
    use crate::infrastructure::MemoryNodeStore;

    fn linked(parent: &mut Node, child: &mut Node) {
        parent.add_child(child.id);
        child.parent_node = Some(parent.id);
    }

    #[test]
    fn given_stale_subtree_when_recalibrating_then_heights_and_roots_follow_start() {
        // a -> b -> c with garbage heights and roots
        let mut a = Node::new("a").unwrap();
        let mut b = Node::new("b").unwrap();
        let mut c = Node::new("c").unwrap();
        linked(&mut a, &mut b);
        linked(&mut b, &mut c);
        b.height = 9;
        c.height = 0;
        let new_root = NodeId::new();
        let store = MemoryNodeStore::with_nodes([a.clone(), b.clone(), c.clone()]);
        let mut tx = store.begin().unwrap();

        let visited = recalibrate(tx.as_mut(), a.id, 4, new_root).unwrap();

        assert_eq!(visited, 3);
        for (id, height) in [(a.id, 4), (b.id, 5), (c.id, 6)] {
            let node = tx.get(id).unwrap().unwrap();
            assert_eq!(node.height, height);
            assert_eq!(node.root_node, new_root);
        }
    }

    #[test]
    fn given_calibrated_subtree_when_recalibrating_twice_then_idempotent() {
        let mut a = Node::new("a").unwrap();
        let mut b = Node::new("b").unwrap();
        linked(&mut a, &mut b);
        let store = MemoryNodeStore::with_nodes([a.clone(), b.clone()]);
        let mut tx = store.begin().unwrap();

        recalibrate(tx.as_mut(), a.id, 0, a.id).unwrap();
        let first = tx.nodes().unwrap();
        recalibrate(tx.as_mut(), a.id, 0, a.id).unwrap();

        assert_eq!(tx.nodes().unwrap(), first);
    }

    /// Counts puts on the way to an inner transaction.
    struct CountingTx<'a> {
        inner: Box<dyn NodeTransaction + 'a>,
        puts: Vec<NodeId>,
    }

    impl NodeTransaction for CountingTx<'_> {
        fn get(&mut self, id: NodeId) -> std::io::Result<Option<Node>> {
            self.inner.get(id)
        }
        fn put(&mut self, node: &Node) -> std::io::Result<()> {
            self.puts.push(node.id);
            self.inner.put(node)
        }
        fn remove(&mut self, id: NodeId) -> std::io::Result<bool> {
            self.inner.remove(id)
        }
        fn nodes(&mut self) -> std::io::Result<Vec<Node>> {
            self.inner.nodes()
        }
        fn commit(self: Box<Self>) -> std::io::Result<()> {
            self.inner.commit()
        }
    }

    #[test]
    fn given_partly_stale_subtree_when_recalibrating_then_only_changed_nodes_written() {
        // a -> b -> c, only c is stale
        let mut a = Node::new("a").unwrap();
        let mut b = Node::new("b").unwrap();
        let mut c = Node::new("c").unwrap();
        linked(&mut a, &mut b);
        linked(&mut b, &mut c);
        b.height = 1;
        b.root_node = a.id;
        c.height = 7;
        c.root_node = a.id;
        let store = MemoryNodeStore::with_nodes([a.clone(), b, c.clone()]);
        let mut tx = CountingTx {
            inner: store.begin().unwrap(),
            puts: Vec::new(),
        };

        let visited = recalibrate(&mut tx, a.id, 0, a.id).unwrap();

        assert_eq!(visited, 3);
        assert_eq!(tx.puts, vec![c.id]);
        assert_eq!(tx.get(c.id).unwrap().unwrap().height, 2);
    }

    #[test]
    fn given_missing_child_when_recalibrating_then_corrupt_hierarchy() {
        let mut a = Node::new("a").unwrap();
        a.add_child(NodeId::new());
        let store = MemoryNodeStore::with_nodes([a.clone()]);
        let mut tx = store.begin().unwrap();

        let err = recalibrate(tx.as_mut(), a.id, 0, a.id).unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::CorruptHierarchy { .. })
        ));
    }

    #[test]
    fn given_children_cycle_when_recalibrating_then_terminates_with_error() {
        let mut a = Node::new("a").unwrap();
        let mut b = Node::new("b").unwrap();
        a.add_child(b.id);
        b.add_child(a.id);
        let store = MemoryNodeStore::with_nodes([a.clone(), b]);
        let mut tx = store.begin().unwrap();

        assert!(recalibrate(tx.as_mut(), a.id, 0, a.id).is_err());
    }
}
