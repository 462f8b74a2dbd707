//! Session errors
//!
//! Geometric edge cases (slivers, collinear points, failed splits) are never
//! errors; they surface as `Option`/`bool` results. These variants cover API
//! misuse and resource guards.

use crate::session::hierarchy::NodeId;

/// All the possible failures of a [`BuildSession`](crate::session::BuildSession) call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CsgError {
    /// The id does not name a live node of the hierarchy
    #[error("(UnknownNode) no node with id {0:?}")]
    UnknownNode(NodeId),
    /// The node exists but is a group, not a brush
    #[error("(NotABrush) node {0:?} is a group")]
    NotABrush(NodeId),
    /// Re-parenting would make a node its own ancestor
    #[error("(HierarchyCycle) node {0:?} cannot be moved under its own subtree")]
    HierarchyCycle(NodeId),
    /// Splitting a brush into chunks produced more chunks than allowed
    #[error("(ChunkLimitExceeded) brush chunking exceeded {limit} chunks")]
    ChunkLimitExceeded { limit: usize },
    /// A brush source yielded too few valid polygons to enclose a volume
    #[error("(DegenerateBrush) brush {0:?} does not describe a closed solid")]
    DegenerateBrush(NodeId),
}
