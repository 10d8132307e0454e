//! Undo/redo history.
//!
//! The history is a tree of [`UndoGroup`]s. The root is permanent and stands
//! for "no changes yet". `head` is the group whose changes are the latest
//! applied ones: its ancestors are applied, everything else is undone.
//!
//! Groups are opened with [`History::create_undo_group`], receive operations
//! while open, and are closed with [`History::close_undo_group`] or merged
//! into the previous step with [`History::amend_undo_group`]. Opening a group
//! while another one is open nests it; closing the outer group hoists every
//! nested operation into it.
//!
//! Retention is bounded by `max_levels`: past that depth the root is
//! advanced along the main branch, and abandoned redo branches are evicted
//! once the tree holds more than four times `max_levels` groups.

mod operation;
mod undo_group;

pub use operation::{ClosureOperation, UndoOperation};
pub use undo_group::{UndoGroup, UndoGroupId};

use crate::config::HistoryConfig;
use crate::error::HistoryError;
use crate::signal::Signal;
use std::collections::{HashMap, HashSet};

/// Multiplier applied to `max_levels` to bound the total number of groups.
const NODE_BUDGET_FACTOR: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Undo,
    Redo,
}

pub struct History<T> {
    groups: HashMap<UndoGroupId, UndoGroup<T>>,
    root: UndoGroupId,
    head: UndoGroupId,
    num_levels: usize,
    num_nodes: usize,
    max_levels: usize,
    next_group_id: u64,
    is_undo_or_redo_in_progress: bool,

    /// Emitted with the new head whenever it changes.
    pub head_changed: Signal<UndoGroupId>,
    pub about_to_undo: Signal<UndoGroupId>,
    pub undone: Signal<UndoGroupId>,
    pub about_to_redo: Signal<UndoGroupId>,
    pub redone: Signal<UndoGroupId>,
}

impl<T> History<T> {
    pub fn new(max_levels: usize) -> Self {
        let root = UndoGroupId::new(0);
        let mut groups = HashMap::new();
        groups.insert(
            root,
            UndoGroup::new(root, "Root".to_string(), None, None, false),
        );
        Self {
            groups,
            root,
            head: root,
            num_levels: 0,
            num_nodes: 0,
            max_levels: max_levels.max(1),
            next_group_id: 1,
            is_undo_or_redo_in_progress: false,
            head_changed: Signal::new(),
            about_to_undo: Signal::new(),
            undone: Signal::new(),
            about_to_redo: Signal::new(),
            redone: Signal::new(),
        }
    }

    pub fn with_config(config: &HistoryConfig) -> Self {
        Self::new(config.max_levels)
    }

    pub fn root(&self) -> UndoGroupId {
        self.root
    }

    pub fn head(&self) -> UndoGroupId {
        self.head
    }

    pub fn group(&self, id: UndoGroupId) -> Option<&UndoGroup<T>> {
        self.groups.get(&id)
    }

    pub fn contains(&self, id: UndoGroupId) -> bool {
        self.groups.contains_key(&id)
    }

    /// Number of committed steps between the root and the head.
    pub fn num_levels(&self) -> usize {
        self.num_levels
    }

    /// Number of committed groups in the tree, the root excluded.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    pub fn set_max_levels(&mut self, max_levels: usize) {
        self.max_levels = max_levels.max(1);
        self.prune_();
    }

    pub fn is_undo_or_redo_in_progress(&self) -> bool {
        self.is_undo_or_redo_in_progress
    }

    pub fn has_open_groups(&self) -> bool {
        self.innermost_open_group_().is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.head != self.root || self.has_open_groups()
    }

    pub fn can_redo(&self) -> bool {
        !self.has_open_groups()
            && self
                .groups
                .get(&self.head)
                .and_then(|g| g.main_child())
                .is_some()
    }

    /// Opens a new group as the main child of the head and makes it the head.
    pub fn create_undo_group(
        &mut self,
        name: impl Into<String>,
    ) -> Result<UndoGroupId, HistoryError> {
        if self.is_undo_or_redo_in_progress {
            return Err(HistoryError::UndoRedoInProgress);
        }
        let head = self.head;
        let (head_is_open, head_has_operations, head_open_ancestor) = {
            let group = self.group_(head)?;
            (
                group.is_open,
                !group.operations.is_empty(),
                group.open_ancestor,
            )
        };
        if head_is_open && head_has_operations {
            return Err(HistoryError::NestedInNonEmptyGroup { parent: head });
        }

        // An open group can only be the head; one found in the redo chain is stale.
        while let Some(main) = self.groups.get(&head).and_then(|g| g.main_child()) {
            if !self.groups.get(&main).is_some_and(|g| g.is_open) {
                break;
            }
            tracing::warn!("Destroying stale open undo group {}", main);
            if let Some(group) = self.groups.get_mut(&head) {
                group.children.retain(|c| *c != main);
            }
            self.destroy_subtree_(main);
        }

        let id = UndoGroupId::new(self.next_group_id);
        self.next_group_id += 1;
        let open_ancestor = if head_is_open {
            Some(head)
        } else {
            head_open_ancestor
        };
        let group = UndoGroup::new(id, name.into(), Some(head), open_ancestor, true);
        tracing::debug!("Opening undo group {} '{}'", id, group.name);
        self.groups.insert(id, group);
        if let Some(parent) = self.groups.get_mut(&head) {
            parent.children.insert(0, id);
        }
        self.set_head_(id);
        Ok(id)
    }

    /// Records an operation in the head group, which must be open.
    pub fn push_operation<O>(&mut self, operation: O) -> Result<(), HistoryError>
    where
        O: UndoOperation<T> + 'static,
    {
        self.push_boxed_operation(Box::new(operation))
    }

    pub fn push_boxed_operation(
        &mut self,
        operation: Box<dyn UndoOperation<T>>,
    ) -> Result<(), HistoryError> {
        if self.is_undo_or_redo_in_progress {
            return Err(HistoryError::UndoRedoInProgress);
        }
        match self.groups.get_mut(&self.head) {
            Some(group) if group.is_open => {
                tracing::trace!("Recording '{}' in undo group {}", operation.name(), group.id);
                group.operations.push(operation);
                Ok(())
            }
            _ => Err(HistoryError::NoOpenGroup(operation.name().to_string())),
        }
    }

    /// Closes `id`, which must be the innermost open group.
    pub fn close_undo_group(&mut self, id: UndoGroupId) -> Result<(), HistoryError> {
        self.close_undo_group_(id, false).map(|_| ())
    }

    /// Closes `id` and merges its operations into the previous step.
    ///
    /// Falls back to a plain close when the parent has other children, is
    /// the root, or is itself open. Returns true when the merge happened.
    pub fn amend_undo_group(&mut self, id: UndoGroupId) -> Result<bool, HistoryError> {
        self.close_undo_group_(id, true)
    }

    /// Undoes the head group.
    ///
    /// Open groups are closed first, so an in-progress edit is undone as a
    /// whole. Returns false if there was nothing to undo.
    pub fn undo(&mut self, target: &mut T) -> Result<bool, HistoryError> {
        if self.is_undo_or_redo_in_progress {
            return Err(HistoryError::UndoRedoInProgress);
        }
        if let Some(top) = self.topmost_open_group_() {
            self.close_undo_group_(top, false)?;
        }
        if self.head == self.root {
            return Ok(false);
        }
        self.undo_one_(target)?;
        Ok(true)
    }

    /// Redoes the main child of the head. Returns false if there is none.
    pub fn redo(&mut self, target: &mut T) -> Result<bool, HistoryError> {
        if self.is_undo_or_redo_in_progress {
            return Err(HistoryError::UndoRedoInProgress);
        }
        if self.has_open_groups() {
            return Err(HistoryError::OpenGroupsPending("redo"));
        }
        let Some(main) = self.groups.get(&self.head).and_then(|g| g.main_child()) else {
            return Ok(false);
        };
        self.redo_one_(main, target)?;
        Ok(true)
    }

    /// Moves the head to `id`, undoing and redoing as needed.
    ///
    /// The path from the root to `id` becomes the main branch.
    pub fn go_to(&mut self, id: UndoGroupId, target: &mut T) -> Result<(), HistoryError> {
        if self.is_undo_or_redo_in_progress {
            return Err(HistoryError::UndoRedoInProgress);
        }
        self.group_(id)?;
        if let Some(top) = self.topmost_open_group_() {
            self.close_undo_group_(top, false)?;
            // Closing may have destroyed `id` if it was nested.
            self.group_(id)?;
        }

        let mut on_path = HashSet::new();
        let mut current = Some(id);
        while let Some(node) = current {
            on_path.insert(node);
            let parent = self.groups.get(&node).and_then(|g| g.parent);
            if let Some(parent_id) = parent {
                if let Some(parent_group) = self.groups.get_mut(&parent_id) {
                    parent_group.children.retain(|c| *c != node);
                    parent_group.children.insert(0, node);
                }
            }
            current = parent;
        }

        let mut ancestor = self.head;
        while !on_path.contains(&ancestor) {
            match self.groups.get(&ancestor).and_then(|g| g.parent) {
                Some(parent) => ancestor = parent,
                None => {
                    tracing::error!("Undo group {} is not connected to the root", ancestor);
                    return Err(HistoryError::UnknownGroup(ancestor));
                }
            }
        }

        while self.head != ancestor {
            self.undo_one_(target)?;
        }
        while self.head != id {
            let Some(next) = self.groups.get(&self.head).and_then(|g| g.main_child()) else {
                tracing::error!("Lost the path to undo group {}", id);
                return Err(HistoryError::UnknownGroup(id));
            };
            self.redo_one_(next, target)?;
        }
        Ok(())
    }

    /// Reverts and discards every open group. Returns false if none was open.
    pub fn abort(&mut self, target: &mut T) -> Result<bool, HistoryError> {
        if self.is_undo_or_redo_in_progress {
            return Err(HistoryError::UndoRedoInProgress);
        }
        let Some(top) = self.topmost_open_group_() else {
            return Ok(false);
        };
        tracing::debug!("Aborting undo group {}", top);

        self.is_undo_or_redo_in_progress = true;
        let mut current = self.head;
        let result = loop {
            let step = self.run_operations_(current, target, Direction::Undo);
            if step.is_err() || current == top {
                break step;
            }
            match self.groups.get(&current).and_then(|g| g.parent) {
                Some(parent) => current = parent,
                None => break Ok(()),
            }
        };
        self.is_undo_or_redo_in_progress = false;
        result?;

        let parent = self.groups.get(&top).and_then(|g| g.parent).unwrap_or(self.root);
        if let Some(group) = self.groups.get_mut(&parent) {
            group.children.retain(|c| *c != top);
        }
        self.destroy_subtree_(top);
        self.set_head_(parent);
        Ok(true)
    }

    fn close_undo_group_(&mut self, id: UndoGroupId, amend: bool) -> Result<bool, HistoryError> {
        if self.is_undo_or_redo_in_progress {
            return Err(HistoryError::UndoRedoInProgress);
        }
        let (is_open, is_undone, parent, open_ancestor) = {
            let group = self.group_(id)?;
            (group.is_open, group.is_undone, group.parent, group.open_ancestor)
        };
        if !is_open {
            return Err(HistoryError::GroupNotOpen(id));
        }
        if is_undone {
            return Err(HistoryError::GroupUndone(id));
        }
        match self.innermost_open_group_() {
            Some(innermost) if innermost == id => {}
            Some(innermost) => return Err(HistoryError::NotFirstOpenGroup { group: id, innermost }),
            None => return Err(HistoryError::GroupNotOpen(id)),
        }

        // Nested groups between `id` and the head, outermost first.
        let mut chain = Vec::new();
        let mut current = self.head;
        while current != id {
            chain.push(current);
            match self.groups.get(&current).and_then(|g| g.parent) {
                Some(p) => current = p,
                None => break,
            }
        }
        chain.reverse();

        let mut operations = match self.groups.get_mut(&id) {
            Some(group) => std::mem::take(&mut group.operations),
            None => Vec::new(),
        };
        for nested in &chain {
            if let Some(group) = self.groups.get_mut(nested) {
                operations.append(&mut group.operations);
            }
        }
        let children = match self.groups.get_mut(&id) {
            Some(group) => std::mem::take(&mut group.children),
            None => Vec::new(),
        };
        for child in children {
            self.destroy_subtree_(child);
        }
        if let Some(group) = self.groups.get_mut(&id) {
            group.operations = operations;
            group.is_open = false;
        }
        tracing::debug!("Closed undo group {}", id);

        let is_top_level = open_ancestor.is_none();
        if amend && is_top_level {
            if let Some(parent_id) = parent {
                let can_amend = parent_id != self.root
                    && self
                        .groups
                        .get(&parent_id)
                        .is_some_and(|p| !p.is_open && p.children.len() == 1);
                if can_amend {
                    if let Some(mut group) = self.groups.remove(&id) {
                        if let Some(parent_group) = self.groups.get_mut(&parent_id) {
                            parent_group.operations.append(&mut group.operations);
                            parent_group.children.clear();
                        }
                    }
                    tracing::debug!("Amended undo group {} into {}", id, parent_id);
                    self.set_head_(parent_id);
                    return Ok(true);
                }
            }
        }

        if is_top_level {
            self.num_nodes += 1;
        }
        self.set_head_(id);
        if is_top_level {
            self.prune_();
        }
        Ok(false)
    }

    fn undo_one_(&mut self, target: &mut T) -> Result<(), HistoryError> {
        let id = self.head;
        let Some(parent) = self.groups.get(&id).and_then(|g| g.parent) else {
            return Ok(());
        };
        self.about_to_undo.emit(&id);
        self.is_undo_or_redo_in_progress = true;
        let result = self.run_operations_(id, target, Direction::Undo);
        self.is_undo_or_redo_in_progress = false;
        result?;
        if let Some(group) = self.groups.get_mut(&id) {
            group.is_undone = true;
        }
        self.undone.emit(&id);
        self.set_head_(parent);
        Ok(())
    }

    fn redo_one_(&mut self, id: UndoGroupId, target: &mut T) -> Result<(), HistoryError> {
        self.about_to_redo.emit(&id);
        self.is_undo_or_redo_in_progress = true;
        let result = self.run_operations_(id, target, Direction::Redo);
        self.is_undo_or_redo_in_progress = false;
        result?;
        if let Some(group) = self.groups.get_mut(&id) {
            group.is_undone = false;
        }
        self.redone.emit(&id);
        self.set_head_(id);
        Ok(())
    }

    fn run_operations_(
        &mut self,
        id: UndoGroupId,
        target: &mut T,
        direction: Direction,
    ) -> Result<(), HistoryError> {
        let mut operations = match self.groups.get_mut(&id) {
            Some(group) => std::mem::take(&mut group.operations),
            None => return Err(HistoryError::UnknownGroup(id)),
        };
        let mut result = Ok(());
        match direction {
            Direction::Undo => {
                for op in operations.iter_mut().rev() {
                    if let Err(e) = op.undo(target) {
                        result = Err(operation_failed(op.name(), e));
                        break;
                    }
                }
            }
            Direction::Redo => {
                for op in operations.iter_mut() {
                    if let Err(e) = op.redo(target) {
                        result = Err(operation_failed(op.name(), e));
                        break;
                    }
                }
            }
        }
        if let Some(group) = self.groups.get_mut(&id) {
            group.operations = operations;
        }
        result
    }

    fn prune_(&mut self) {
        while self.num_levels > self.max_levels {
            let Some(root_group) = self.groups.get(&self.root) else {
                tracing::error!("History root is missing while {} groups remain", self.num_nodes);
                break;
            };
            let Some(main) = root_group.main_child() else {
                tracing::error!("History root has no child while {} levels remain", self.num_levels);
                break;
            };
            if self.root == self.head {
                break;
            }
            let Some(old_root) = self.groups.remove(&self.root) else {
                break;
            };
            let mut dropped = 0;
            for branch in old_root.children.iter().skip(1) {
                dropped += self.destroy_subtree_(*branch);
            }
            if let Some(new_root) = self.groups.get_mut(&main) {
                new_root.parent = None;
                new_root.operations.clear();
            }
            self.root = main;
            self.num_nodes = self.num_nodes.saturating_sub(dropped + 1);
            self.num_levels -= 1;
            tracing::debug!("Pruned history root, new root is {}", main);
        }

        let budget = NODE_BUDGET_FACTOR * self.max_levels;
        while self.num_nodes > budget {
            let Some(leaf) = self.deepest_evictable_leaf_() else {
                break;
            };
            let parent = self.groups.get(&leaf).and_then(|g| g.parent);
            if let Some(parent_group) = parent.and_then(|p| self.groups.get_mut(&p)) {
                parent_group.children.retain(|c| *c != leaf);
            }
            self.groups.remove(&leaf);
            self.num_nodes -= 1;
            tracing::trace!("Evicted undone history branch leaf {}", leaf);
        }
    }

    /// Deepest leaf that is closed and undone; among equals the oldest branch.
    fn deepest_evictable_leaf_(&self) -> Option<UndoGroupId> {
        let mut best: Option<(usize, UndoGroupId)> = None;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(group) = self.groups.get(&id) else {
                continue;
            };
            if group.children.is_empty() {
                if id != self.root
                    && !group.is_open
                    && group.is_undone
                    && best.is_none_or(|(d, _)| depth >= d)
                {
                    best = Some((depth, id));
                }
                continue;
            }
            for child in group.children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        best.map(|(_, id)| id)
    }

    fn destroy_subtree_(&mut self, id: UndoGroupId) -> usize {
        let mut count = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(group) = self.groups.remove(&current) {
                count += 1;
                stack.extend(group.children);
            }
        }
        count
    }

    fn innermost_open_group_(&self) -> Option<UndoGroupId> {
        let mut current = Some(self.head);
        while let Some(id) = current {
            let group = self.groups.get(&id)?;
            if group.is_open {
                return Some(id);
            }
            current = group.open_ancestor;
        }
        None
    }

    fn topmost_open_group_(&self) -> Option<UndoGroupId> {
        let mut topmost = None;
        let mut current = Some(self.head);
        while let Some(id) = current {
            let Some(group) = self.groups.get(&id) else {
                break;
            };
            if group.is_open {
                topmost = Some(id);
            }
            current = group.parent;
        }
        topmost
    }

    /// Nearest ancestor-or-self of the head that is a committed step.
    fn committed_head_(&self) -> UndoGroupId {
        let mut current = self.head;
        while let Some(group) = self.groups.get(&current) {
            if !group.is_open && group.open_ancestor.is_none() {
                break;
            }
            match group.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        current
    }

    fn depth_(&self, id: UndoGroupId) -> usize {
        let mut depth = 0;
        let mut current = self.groups.get(&id).and_then(|g| g.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.groups.get(&parent).and_then(|g| g.parent);
        }
        depth
    }

    fn set_head_(&mut self, id: UndoGroupId) {
        self.head = id;
        self.num_levels = self.depth_(self.committed_head_());
        self.head_changed.emit(&id);
    }

    fn group_(&self, id: UndoGroupId) -> Result<&UndoGroup<T>, HistoryError> {
        self.groups.get(&id).ok_or(HistoryError::UnknownGroup(id))
    }
}

fn operation_failed(name: &str, error: anyhow::Error) -> HistoryError {
    tracing::warn!("Recorded operation '{}' failed: {}", name, error);
    HistoryError::OperationFailed {
        name: name.to_string(),
        reason: error.to_string(),
    }
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::with_config(&HistoryConfig::default())
    }
}

impl<T> std::fmt::Debug for History<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("root", &self.root)
            .field("head", &self.head)
            .field("num_levels", &self.num_levels)
            .field("num_nodes", &self.num_nodes)
            .field("max_levels", &self.max_levels)
            .finish()
    }
}
