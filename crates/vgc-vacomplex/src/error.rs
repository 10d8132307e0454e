//! Error types for the vector algebraic complex.
//!
//! Every variant is a precondition violation detected before the complex
//! was left in an inconsistent state, except `Inconsistent`, which reports a
//! broken invariant found by [`Complex::check_invariants`](crate::Complex::check_invariants).

use crate::node::NodeKind;
use thiserror::Error;
use vgc_core::Id;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VacError {
    /// Another transaction is already editing the complex
    #[error("Another operation is already in progress on this complex")]
    OperationInProgress,

    /// No node with this id exists in the complex
    #[error("Node {0} not found")]
    NodeNotFound(Id),

    /// The node was expected to be a group
    #[error("Node {0} is not a group")]
    NotAGroup(Id),

    /// The node was expected to be a cell
    #[error("Node {0} is not a cell")]
    NotACell(Id),

    /// The cell has another type than the operation requires
    #[error("Node {id} is a {actual:?}, expected {expected:?}")]
    WrongCellType {
        /// The offending node.
        id: Id,
        /// The kind the operation requires.
        expected: NodeKind,
        /// The kind of the node.
        actual: NodeKind,
    },

    /// The requested next sibling is not a child of the requested parent
    #[error("Node {sibling} is not a child of group {parent}")]
    InvalidSibling {
        /// The requested next sibling.
        sibling: Id,
        /// The requested parent group.
        parent: Id,
    },

    /// The id is already used by another node
    #[error("Id {0} is already in use")]
    DuplicateId(Id),

    /// The move would make a node its own descendant
    #[error("Cannot move {node} into {group}: it would become its own descendant")]
    CyclicMove {
        /// The node being moved.
        node: Id,
        /// The requested destination group.
        group: Id,
    },

    /// A face cycle is not a closed walk
    #[error("Invalid cycle: {0}")]
    InvalidCycle(String),

    /// The inputs of an operation are malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The cut cannot be performed on this configuration
    #[error("Invalid cut: {0}")]
    InvalidCut(String),

    /// The operation exists in the API but has no implementation
    #[error("Operation not implemented: {0}")]
    NotImplemented(&'static str),

    /// An invariant of the complex does not hold
    #[error("Inconsistent complex: {0}")]
    Inconsistent(String),
}

/// Result type alias for complex operations.
pub type VacResult<T> = Result<T, VacError>;
