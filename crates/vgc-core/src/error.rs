//! Error handling for VGC
//!
//! Provides error types for the shared layers:
//! - History errors (undo group state machine misuse)
//! - Configuration errors (parsing/validation)
//!
//! All error types use `thiserror` for ergonomic error handling.

use crate::history::UndoGroupId;
use thiserror::Error;

/// History error type
///
/// Every variant except `OperationFailed` is a precondition violation: the
/// caller asked for a transition the undo tree does not allow.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    /// An undo or redo traversal is already running
    #[error("Undo or redo already in progress")]
    UndoRedoInProgress,

    /// The head group is open and already recorded operations
    #[error("Cannot open a nested undo group under {parent} which already has operations")]
    NestedInNonEmptyGroup {
        /// The open head group.
        parent: UndoGroupId,
    },

    /// No group with this id exists (it may have been pruned)
    #[error("Unknown undo group {0}")]
    UnknownGroup(UndoGroupId),

    /// The group was expected to be open
    #[error("Undo group {0} is not open")]
    GroupNotOpen(UndoGroupId),

    /// The group was expected not to be undone
    #[error("Undo group {0} is undone")]
    GroupUndone(UndoGroupId),

    /// A nested open group lies between the head and the group
    #[error("Undo group {group} is not the innermost open group (found {innermost})")]
    NotFirstOpenGroup {
        /// The group that was asked to close.
        group: UndoGroupId,
        /// The innermost open group on the path from the head.
        innermost: UndoGroupId,
    },

    /// An operation was pushed while no group is open
    #[error("No open undo group to record operation '{0}'")]
    NoOpenGroup(String),

    /// The request is invalid while groups are still open
    #[error("Cannot {0} while undo groups are open")]
    OpenGroupsPending(&'static str),

    /// A recorded operation failed to undo or redo
    #[error("Operation '{name}' failed: {reason}")]
    OperationFailed {
        /// The operation name.
        name: String,
        /// The reason reported by the operation.
        reason: String,
    },
}

/// Configuration error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The configuration text could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// A configuration value is out of valid range
    #[error("Value out of range for '{key}': {value}")]
    ValueOutOfRange {
        /// The offending key.
        key: String,
        /// The rejected value.
        value: String,
    },
}

/// Main error type for VGC core
#[derive(Error, Debug)]
pub enum Error {
    /// History error
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a history error
    pub fn is_history_error(&self) -> bool {
        matches!(self, Error::History(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
