//! Render the forest as `termtree` trees.

use std::collections::{BTreeMap, HashMap, HashSet};

use termtree::Tree;

use crate::domain::{Node, NodeId};

fn label(node: &Node) -> String {
    format!("{} ({})", node.description, node.id)
}

/// Build one tree per root, children ordered by id.
///
/// Children that do not exist or were already rendered are skipped, so a
/// corrupted store still renders.
pub fn forest_trees(nodes: &[Node]) -> Vec<Tree<String>> {
    let by_id: BTreeMap<NodeId, &Node> = nodes.iter().map(|n| (n.id, n)).collect();
    let mut rendered = HashSet::new();

    nodes
        .iter()
        .filter(|n| n.is_root())
        .map(|root| build(root, &by_id, &mut rendered))
        .collect()
}

/// Subtree of `root` as a tree, built without recursion.
///
/// A depth-first pass with an explicit stack records every node in
/// pre-order; the trees are then assembled in reverse, so each node's
/// children are finished before the node itself.
fn build(
    root: &Node,
    by_id: &BTreeMap<NodeId, &Node>,
    rendered: &mut HashSet<NodeId>,
) -> Tree<String> {
    rendered.insert(root.id);
    let mut preorder: Vec<(&Node, Vec<NodeId>)> = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        let children: Vec<NodeId> = node
            .children
            .iter()
            .filter(|id| by_id.contains_key(*id) && rendered.insert(**id))
            .copied()
            .collect();
        stack.extend(children.iter().rev().filter_map(|id| by_id.get(id).copied()));
        preorder.push((node, children));
    }

    let mut finished: HashMap<NodeId, Tree<String>> = HashMap::new();
    for (node, children) in preorder.into_iter().rev() {
        let mut tree = Tree::new(label(node));
        for child in &children {
            if let Some(subtree) = finished.remove(child) {
                tree.push(subtree);
            }
        }
        finished.insert(node.id, tree);
    }
    finished
        .remove(&root.id)
        .unwrap_or_else(|| Tree::new(label(root)))
}
