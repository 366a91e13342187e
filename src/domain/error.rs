//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::NodeId;

/// Domain errors represent violations of the forest's structural rules.
/// These are independent of storage concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("parent node not found: {0}")]
    ParentNotFound(NodeId),

    #[error("incorrect id format: {0:?}")]
    InvalidIdentifier(String),

    #[error("cannot delete root node {0}, make another node root first")]
    IllegalRootDeletion(NodeId),

    #[error("node description must not be empty")]
    EmptyDescription,

    #[error("node {0} cannot become its own parent")]
    SelfParent(NodeId),

    #[error("corrupt hierarchy at {id}: {reason}")]
    CorruptHierarchy { id: NodeId, reason: String },
}

impl DomainError {
    pub(crate) fn corrupt(id: NodeId, reason: impl Into<String>) -> Self {
        Self::CorruptHierarchy {
            id,
            reason: reason.into(),
        }
    }

    /// True for the "does not resolve" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NodeNotFound(_) | Self::ParentNotFound(_))
    }
}
