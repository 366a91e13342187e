//! Structural invariant checks over a snapshot of the forest.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::domain::{Node, NodeId};

/// Kind of structural rule broken by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// `parent_node` points to an id that is not in the forest
    DanglingParent(NodeId),
    /// `children` lists an id that is not in the forest
    DanglingChild(NodeId),
    /// parent does not list this node among its children
    MissingChildLink { parent: NodeId },
    /// node lists a child whose `parent_node` is something else
    MissingParentLink { child: NodeId },
    /// root whose `root_node` is not its own id
    RootNotSelf { root_node: NodeId },
    /// non-root that claims to be its own root
    NonRootClaimsRoot,
    WrongHeight { expected: u32, actual: u32 },
    WrongRoot { expected: NodeId, actual: NodeId },
    /// following `parent_node` from this node never reaches a root
    Cycle,
    EmptyDescription,
}

/// A single broken invariant, attributed to one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub node: NodeId,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::DanglingParent(p) => write!(f, "{}: parent {} does not exist", self.node, p),
            ViolationKind::DanglingChild(c) => write!(f, "{}: child {} does not exist", self.node, c),
            ViolationKind::MissingChildLink { parent } => {
                write!(f, "{}: not listed in children of parent {}", self.node, parent)
            }
            ViolationKind::MissingParentLink { child } => {
                write!(f, "{}: child {} points to another parent", self.node, child)
            }
            ViolationKind::RootNotSelf { root_node } => {
                write!(f, "{}: root node but rootNode is {}", self.node, root_node)
            }
            ViolationKind::NonRootClaimsRoot => {
                write!(f, "{}: has a parent but rootNode is itself", self.node)
            }
            ViolationKind::WrongHeight { expected, actual } => {
                write!(f, "{}: height {} (expected {})", self.node, actual, expected)
            }
            ViolationKind::WrongRoot { expected, actual } => {
                write!(f, "{}: rootNode {} (expected {})", self.node, actual, expected)
            }
            ViolationKind::Cycle => write!(f, "{}: parent chain does not reach a root", self.node),
            ViolationKind::EmptyDescription => write!(f, "{}: empty description", self.node),
        }
    }
}

/// Check every structural invariant of the forest.
///
/// Returns an empty vector when the snapshot is a valid forest. Height and
/// root propagation are only checked along parent chains that reach a root,
/// so a cycle is reported once per node on it rather than as a cascade of
/// height errors.
pub fn verify_forest(nodes: &[Node]) -> Vec<Violation> {
    let by_id: BTreeMap<NodeId, &Node> = nodes.iter().map(|n| (n.id, n)).collect();
    let mut violations = Vec::new();
    let mut push = |node: NodeId, kind: ViolationKind| violations.push(Violation { node, kind });

    for node in nodes {
        if node.description.trim().is_empty() {
            push(node.id, ViolationKind::EmptyDescription);
        }

        match node.parent_node {
            None => {
                if node.root_node != node.id {
                    push(
                        node.id,
                        ViolationKind::RootNotSelf {
                            root_node: node.root_node,
                        },
                    );
                }
            }
            Some(parent_id) => {
                if node.root_node == node.id {
                    push(node.id, ViolationKind::NonRootClaimsRoot);
                }
                match by_id.get(&parent_id) {
                    None => push(node.id, ViolationKind::DanglingParent(parent_id)),
                    Some(parent) => {
                        if !parent.children.contains(&node.id) {
                            push(node.id, ViolationKind::MissingChildLink { parent: parent_id });
                        }
                    }
                }
            }
        }

        for child_id in &node.children {
            match by_id.get(child_id) {
                None => push(node.id, ViolationKind::DanglingChild(*child_id)),
                Some(child) => {
                    if child.parent_node != Some(node.id) {
                        push(node.id, ViolationKind::MissingParentLink { child: *child_id });
                    }
                }
            }
        }

        match resolve_chain(node, &by_id) {
            Chain::Root { root, depth } => {
                if node.height != depth {
                    push(
                        node.id,
                        ViolationKind::WrongHeight {
                            expected: depth,
                            actual: node.height,
                        },
                    );
                }
                if node.parent_node.is_some() && node.root_node != root {
                    push(
                        node.id,
                        ViolationKind::WrongRoot {
                            expected: root,
                            actual: node.root_node,
                        },
                    );
                }
            }
            Chain::Cycle => push(node.id, ViolationKind::Cycle),
            Chain::Broken => {}
        }
    }

    violations
}

enum Chain {
    Root { root: NodeId, depth: u32 },
    Cycle,
    /// chain ends at a dangling parent, already reported
    Broken,
}

fn resolve_chain(start: &Node, by_id: &BTreeMap<NodeId, &Node>) -> Chain {
    let mut seen = HashSet::new();
    let mut current = start;
    let mut depth = 0u32;
    loop {
        if !seen.insert(current.id) {
            return Chain::Cycle;
        }
        match current.parent_node {
            None => {
                return Chain::Root {
                    root: current.id,
                    depth,
                }
            }
            Some(parent_id) => match by_id.get(&parent_id) {
                None => return Chain::Broken,
                Some(parent) => {
                    current = parent;
                    depth += 1;
                }
            },
        }
    }
}
