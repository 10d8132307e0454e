//! Undo groups: the nodes of the history tree.

use super::operation::UndoOperation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies an undo group within its [`History`](super::History).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UndoGroupId(u64);

impl UndoGroupId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UndoGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One undoable unit.
///
/// The first child is the main child, the target of redo. Other children are
/// alternate redo branches left behind by edits made after an undo.
pub struct UndoGroup<T> {
    pub(super) id: UndoGroupId,
    pub(super) name: String,
    pub(super) operations: Vec<Box<dyn UndoOperation<T>>>,
    pub(super) is_open: bool,
    pub(super) is_undone: bool,
    pub(super) parent: Option<UndoGroupId>,
    pub(super) children: Vec<UndoGroupId>,
    /// Nearest open ancestor, `None` for top-level groups.
    pub(super) open_ancestor: Option<UndoGroupId>,
}

impl<T> UndoGroup<T> {
    pub(super) fn new(
        id: UndoGroupId,
        name: String,
        parent: Option<UndoGroupId>,
        open_ancestor: Option<UndoGroupId>,
        is_open: bool,
    ) -> Self {
        Self {
            id,
            name,
            operations: Vec::new(),
            is_open,
            is_undone: false,
            parent,
            children: Vec::new(),
            open_ancestor,
        }
    }

    pub fn id(&self) -> UndoGroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_undone(&self) -> bool {
        self.is_undone
    }

    pub fn parent(&self) -> Option<UndoGroupId> {
        self.parent
    }

    pub fn children(&self) -> &[UndoGroupId] {
        &self.children
    }

    pub fn main_child(&self) -> Option<UndoGroupId> {
        self.children.first().copied()
    }

    pub fn open_ancestor(&self) -> Option<UndoGroupId> {
        self.open_ancestor
    }

    pub fn num_operations(&self) -> usize {
        self.operations.len()
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(|op| op.name())
    }
}

impl<T> fmt::Debug for UndoGroup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoGroup")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("operations", &self.operations.len())
            .field("is_open", &self.is_open)
            .field("is_undone", &self.is_undone)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish()
    }
}
