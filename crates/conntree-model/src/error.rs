//! Error types for tree construction and validation

use crate::id::ConstantId;

/// Structural violations of the connection tree
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Identity already present in the tree
    #[error("duplicate node identity: {0}")]
    DuplicateId(ConstantId),

    /// Referenced node does not exist
    #[error("node not found: {0}")]
    NodeNotFound(ConstantId),

    /// Parent exists but cannot hold children
    #[error("parent {0} is a connection and cannot hold children")]
    ParentNotContainer(ConstantId),

    /// A root node appeared somewhere other than the top of the tree
    #[error("unexpected root node: {0}")]
    UnexpectedRoot(ConstantId),

    /// No root node, or the recorded root is not a root
    #[error("tree has no root node")]
    MissingRoot,

    /// Parent/child links disagree
    #[error("inconsistent parent link for node {0}")]
    InconsistentLink(ConstantId),

    /// Node cannot be reached from the root (orphan or cycle)
    #[error("node {0} is not reachable from the root")]
    Unreachable(ConstantId),
}
