//! Domain entities: core data structures

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Stable identifier of a node.
///
/// Assigned once at creation and never reused. Serialized as the hyphenated
/// uuid string so it can key a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Allocate a fresh random identifier.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for NodeId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| DomainError::InvalidIdentifier(s.to_string()))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// A labeled node of the forest.
///
/// `parent_node` and `children` are non-owning references resolved through
/// the store. `parent_node` is `None` exactly when the node is a root, in
/// which case `root_node == id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub description: String,
    /// Distance to the root of the node's tree (root = 0)
    pub height: u32,
    pub parent_node: Option<NodeId>,
    pub root_node: NodeId,
    #[serde(default)]
    pub children: BTreeSet<NodeId>,
}

impl Node {
    /// Create a node that is the root of its own one-node tree.
    ///
    /// Rejects descriptions that are empty or only whitespace.
    pub fn new(description: impl Into<String>) -> Result<Self, DomainError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(DomainError::EmptyDescription);
        }
        let id = NodeId::new();
        Ok(Self {
            id,
            description,
            height: 0,
            parent_node: None,
            root_node: id,
            children: BTreeSet::new(),
        })
    }

    pub fn is_root(&self) -> bool {
        self.parent_node.is_none()
    }

    /// Add a child id; returns false if it was already present.
    pub fn add_child(&mut self, child: NodeId) -> bool {
        self.children.insert(child)
    }

    /// Remove a child id; returns false if it was not present.
    pub fn remove_child(&mut self, child: NodeId) -> bool {
        self.children.remove(&child)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description, self.id)
    }
}
