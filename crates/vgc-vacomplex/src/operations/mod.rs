//! Transactional editing of a complex.
//!
//! An [`Operations`] value is one atomic edit. It locks the complex on
//! creation, every primitive called on it mutates the complex immediately,
//! and [`Operations::commit`] publishes the coalesced diff and signals.
//! Dropping it without committing restores the complex to the state it had
//! when the transaction began and emits nothing.
//!
//! Every mutation goes through [`Operations::touch`], which snapshots a node
//! the first time it is modified. The snapshots drive rollback and the
//! [`ComplexEdit`] returned by [`Operations::commit_with_undo`].

mod create;
mod cut;
mod delete;
mod glue;
mod intersect;
mod modify;
mod uncut;
mod unglue;
mod union_find;

pub use cut::{CutEdgeResult, CutFaceResult, OneCycleCutPolicy, TwoCycleCutPolicy};
pub use intersect::IntersectResult;
pub use uncut::{UncutAtKeyEdgeResult, UncutAtKeyVertexResult};

use crate::complex::{Complex, NodeCreated, NodeModified};
use crate::diff::{ComplexDiff, NodeModificationFlags};
use crate::edit::{ComplexEdit, NodeSnapshot, NodeState};
use crate::error::{VacError, VacResult};
use crate::node::{Cell, KeyEdgeData, KeyFaceData, KeyCycle, Node, NodeData, NodeKind};
use std::collections::HashMap;
use vgc_core::{Id, Vec2d};

pub struct Operations<'a> {
    complex: &'a mut Complex,
    diff: ComplexDiff,
    touched: Vec<Id>,
    before: HashMap<Id, Option<NodeSnapshot>>,
    pending_destroyed: Vec<Node>,
    /// Name of the outermost public operation currently running.
    source: Option<&'static str>,
    finished: bool,
}

impl<'a> Operations<'a> {
    /// Starts a transaction. Fails if another one is active on `complex`.
    pub fn new(complex: &'a mut Complex) -> VacResult<Self> {
        if complex.is_operation_in_progress {
            return Err(VacError::OperationInProgress);
        }
        complex.is_operation_in_progress = true;
        complex.version += 1;
        tracing::debug!("Transaction started at version {}", complex.version);
        Ok(Self {
            complex,
            diff: ComplexDiff::new(),
            touched: Vec::new(),
            before: HashMap::new(),
            pending_destroyed: Vec::new(),
            source: None,
            finished: false,
        })
    }

    pub fn complex(&self) -> &Complex {
        self.complex
    }

    pub fn root(&self) -> Id {
        self.complex.root()
    }

    /// Changes recorded so far, before compression.
    pub fn pending_diff(&self) -> &ComplexDiff {
        &self.diff
    }

    /// Publishes the transaction and returns its diff.
    pub fn commit(mut self) -> ComplexDiff {
        self.finish().0
    }

    /// Publishes the transaction and returns its diff together with an
    /// edit that can undo and redo it.
    pub fn commit_with_undo(mut self, name: impl Into<String>) -> (ComplexDiff, ComplexEdit) {
        let (diff, states) = self.finish();
        (diff, ComplexEdit::new(name.into(), states))
    }

    /// Restores the state the complex had when the transaction began.
    pub fn rollback(mut self) {
        self.rollback_();
    }

    fn finish(&mut self) -> (ComplexDiff, Vec<NodeState>) {
        self.finished = true;
        let mut diff = std::mem::take(&mut self.diff);
        diff.finalize();

        let mut states = Vec::with_capacity(self.touched.len());
        for id in std::mem::take(&mut self.touched) {
            let before = self.before.remove(&id).flatten();
            let after = NodeSnapshot::capture(self.complex, id);
            if before.is_some() || after.is_some() {
                states.push(NodeState { id, before, after });
            }
        }

        let signals = &mut self.complex.signals;
        for info in diff.created_nodes() {
            signals.node_created.emit(&NodeCreated {
                id: info.id,
                kind: info.kind,
                source_operation: info.source_operation,
            });
        }
        for node in std::mem::take(&mut self.pending_destroyed) {
            if !diff.is_transient(node.id) {
                signals.node_about_to_be_removed.emit(&node);
            }
        }
        for info in diff.modified_nodes() {
            signals.node_modified.emit(&NodeModified {
                id: info.id,
                flags: info.flags,
            });
        }

        if self.complex.diff_enabled {
            self.complex.persistent_diff.merge(diff.clone());
        }
        self.complex.is_operation_in_progress = false;
        tracing::debug!(
            "Transaction committed: {} created, {} destroyed, {} transient, {} modified",
            diff.created_nodes().len(),
            diff.destroyed_nodes().len(),
            diff.transient_nodes().len(),
            diff.modified_nodes().len()
        );
        (diff, states)
    }

    fn rollback_(&mut self) {
        self.finished = true;
        let targets: Vec<(Id, Option<&NodeSnapshot>)> = self
            .touched
            .iter()
            .map(|id| (*id, self.before.get(id).and_then(Option::as_ref)))
            .collect();
        self.complex.apply_snapshots(&targets);
        tracing::debug!("Transaction rolled back, {} nodes restored", targets.len());
        self.touched.clear();
        self.before.clear();
        self.pending_destroyed.clear();
        self.diff.clear();
        self.complex.is_operation_in_progress = false;
    }

    /// Runs a public operation, labelling the nodes it creates.
    fn run<R>(
        &mut self,
        name: &'static str,
        f: impl FnOnce(&mut Self) -> VacResult<R>,
    ) -> VacResult<R> {
        let outermost = self.source.is_none();
        if outermost {
            self.source = Some(name);
        }
        let result = f(self);
        if outermost {
            self.source = None;
        }
        if let Err(err) = &result {
            tracing::debug!("{} failed: {}", name, err);
        }
        result
    }

    // --- Snapshots --------------------------------------------------------

    /// Records the current state of `id` if this is its first modification
    /// in the transaction. Nodes that do not exist yet record `None`.
    pub(crate) fn touch(&mut self, id: Id) {
        if self.before.contains_key(&id) {
            return;
        }
        let snapshot = NodeSnapshot::capture(self.complex, id);
        self.before.insert(id, snapshot);
        self.touched.push(id);
    }

    /// Replaces node states wholesale, recording the difference.
    pub(crate) fn restore_snapshots(
        &mut self,
        targets: &[(Id, Option<&NodeSnapshot>)],
        source: &'static str,
    ) {
        for (id, _) in targets {
            self.touch(*id);
        }
        let removed = self.complex.apply_snapshots(targets);
        for (id, target) in targets {
            let current = self.before.get(id).and_then(Option::as_ref);
            match (current, target) {
                (None, Some(target)) => {
                    self.diff.on_node_created(*id, target.node.kind(), source);
                    self.record_insertion(*id);
                }
                (Some(_), None) => self.diff.on_node_destroyed(*id),
                (Some(current), Some(target)) => {
                    let flags = current.modification_flags(target);
                    if !flags.is_empty() {
                        self.diff.on_node_modified(*id, flags, None);
                    }
                    if flags.contains(NodeModificationFlags::REPARENTED) {
                        self.record_insertion(*id);
                    }
                }
                (None, None) => {}
            }
        }
        self.pending_destroyed.extend(removed);
        self.complex.version += 1;
    }

    fn record_insertion(&mut self, id: Id) {
        if let Some(node) = self.complex.nodes.get(&id) {
            if let Some(parent) = node.parent {
                self.diff.on_node_inserted(id, parent, node.next_sibling);
            }
        }
    }

    // --- Lookups ----------------------------------------------------------

    pub(crate) fn node(&self, id: Id) -> VacResult<&Node> {
        self.complex.nodes.get(&id).ok_or(VacError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: Id) -> VacResult<&mut Node> {
        if !self.complex.contains(id) {
            return Err(VacError::NodeNotFound(id));
        }
        self.touch(id);
        self.complex.nodes.get_mut(&id).ok_or(VacError::NodeNotFound(id))
    }

    pub(crate) fn kind(&self, id: Id) -> VacResult<NodeKind> {
        Ok(self.node(id)?.kind())
    }

    pub(crate) fn expect_kind(&self, id: Id, expected: NodeKind) -> VacResult<()> {
        self.complex.expect_kind(id, expected)
    }

    pub(crate) fn expect_group(&self, id: Id) -> VacResult<()> {
        if self.node(id)?.is_group() {
            Ok(())
        } else {
            Err(VacError::NotAGroup(id))
        }
    }

    pub(crate) fn parent(&self, id: Id) -> VacResult<Id> {
        self.node(id)?
            .parent
            .ok_or_else(|| VacError::InvalidInput(format!("{id} is the root group")))
    }

    pub(crate) fn cell(&self, id: Id) -> VacResult<&Cell> {
        self.node(id)?.as_cell().ok_or(VacError::NotACell(id))
    }

    pub(crate) fn cell_mut(&mut self, id: Id) -> VacResult<&mut Cell> {
        self.node_mut(id)?.as_cell_mut().ok_or(VacError::NotACell(id))
    }

    pub(crate) fn key_vertex_position(&self, id: Id) -> VacResult<Vec2d> {
        self.expect_kind(id, NodeKind::KeyVertex)?;
        self.complex
            .key_vertex_position(id)
            .ok_or(VacError::NodeNotFound(id))
    }

    pub(crate) fn key_edge(&self, id: Id) -> VacResult<&KeyEdgeData> {
        self.expect_kind(id, NodeKind::KeyEdge)?;
        self.complex.key_edge(id).ok_or(VacError::NodeNotFound(id))
    }

    pub(crate) fn key_edge_mut(&mut self, id: Id) -> VacResult<&mut KeyEdgeData> {
        self.expect_kind(id, NodeKind::KeyEdge)?;
        match &mut self.cell_mut(id)?.data {
            crate::node::CellData::KeyEdge(edge) => Ok(edge),
            _ => Err(VacError::NotACell(id)),
        }
    }

    pub(crate) fn key_face(&self, id: Id) -> VacResult<&KeyFaceData> {
        self.expect_kind(id, NodeKind::KeyFace)?;
        self.complex.key_face(id).ok_or(VacError::NodeNotFound(id))
    }

    pub(crate) fn key_face_mut(&mut self, id: Id) -> VacResult<&mut KeyFaceData> {
        self.expect_kind(id, NodeKind::KeyFace)?;
        match &mut self.cell_mut(id)?.data {
            crate::node::CellData::KeyFace(face) => Ok(face),
            _ => Err(VacError::NotACell(id)),
        }
    }

    // --- Modification records ---------------------------------------------

    pub(crate) fn on_node_modified(&mut self, id: Id, flags: NodeModificationFlags) {
        self.diff.on_node_modified(id, flags, None);
    }

    pub(crate) fn on_property_modified(&mut self, id: Id, flags: NodeModificationFlags, name: &str) {
        self.diff.on_node_modified(id, flags, Some(name));
    }

    // --- Boundary and star ------------------------------------------------

    /// Makes `bounded` depend on `bounding`. No-op if it already does.
    pub(crate) fn add_to_boundary(&mut self, bounded: Id, bounding: Id) -> VacResult<()> {
        self.cell(bounding)?;
        if self.cell(bounded)?.boundary.contains(&bounding) {
            return Ok(());
        }
        self.cell_mut(bounded)?.boundary.push(bounding);
        self.cell_mut(bounding)?.star.push(bounded);
        self.on_node_modified(bounded, NodeModificationFlags::BOUNDARY_CHANGED);
        self.on_node_modified(bounding, NodeModificationFlags::STAR_CHANGED);
        tracing::trace!("{} now bounded by {}", bounded, bounding);
        Ok(())
    }

    /// Inverse of [`Self::add_to_boundary`]. No-op if `bounded` does not
    /// depend on `bounding`.
    pub(crate) fn remove_from_boundary(&mut self, bounded: Id, bounding: Id) -> VacResult<()> {
        self.cell(bounding)?;
        if !self.cell(bounded)?.boundary.contains(&bounding) {
            return Ok(());
        }
        self.cell_mut(bounded)?.boundary.retain(|b| *b != bounding);
        self.cell_mut(bounding)?.star.retain(|s| *s != bounded);
        self.on_node_modified(bounded, NodeModificationFlags::BOUNDARY_CHANGED);
        self.on_node_modified(bounding, NodeModificationFlags::STAR_CHANGED);
        tracing::trace!("{} no longer bounded by {}", bounded, bounding);
        Ok(())
    }

    /// Drops a dying cell from the star of a surviving boundary cell.
    pub(crate) fn remove_from_star(&mut self, cell: Id, dying: Id) -> VacResult<()> {
        self.cell_mut(cell)?.star.retain(|s| *s != dying);
        self.on_node_modified(cell, NodeModificationFlags::STAR_CHANGED);
        Ok(())
    }

    /// Replaces the cycles of a face and recomputes its boundary.
    pub(crate) fn set_face_cycles(&mut self, face: Id, cycles: Vec<KeyCycle>) -> VacResult<()> {
        for cycle in &cycles {
            self.complex.validate_cycle(cycle)?;
        }
        self.key_face_mut(face)?.cycles = cycles;
        self.on_node_modified(face, NodeModificationFlags::GEOMETRY_CHANGED);
        self.rebuild_face_boundary(face)
    }

    /// Brings the boundary of a face in line with its cycles.
    pub(crate) fn rebuild_face_boundary(&mut self, face: Id) -> VacResult<()> {
        let desired = self.complex.cycles_boundary(&self.key_face(face)?.cycles);
        let current = self.cell(face)?.boundary.clone();
        for b in current.iter().filter(|b| !desired.contains(*b)) {
            self.remove_from_boundary(face, *b)?;
        }
        for b in desired {
            self.add_to_boundary(face, b)?;
        }
        Ok(())
    }

    /// Moves the endpoints of an open edge onto its vertices.
    pub(crate) fn snap_key_edge(&mut self, edge: Id) -> VacResult<()> {
        let (start, end) = {
            let data = self.key_edge(edge)?;
            (data.start, data.end)
        };
        let (Some(start), Some(end)) = (start, end) else {
            return Ok(());
        };
        let start = self.key_vertex_position(start)?;
        let end = self.key_vertex_position(end)?;
        self.key_edge_mut(edge)?.stroke.snap(start, end);
        self.on_node_modified(edge, NodeModificationFlags::GEOMETRY_CHANGED);
        Ok(())
    }

    // --- Tree -------------------------------------------------------------

    fn check_insertion(&self, parent: Id, next_sibling: Option<Id>) -> VacResult<()> {
        self.expect_group(parent)?;
        if let Some(sibling) = next_sibling {
            if self.node(sibling)?.parent != Some(parent) {
                return Err(VacError::InvalidSibling { sibling, parent });
            }
        }
        Ok(())
    }

    /// Adds a new node to the arena and links it under `parent`.
    pub(crate) fn insert_node(
        &mut self,
        data: NodeData,
        parent: Id,
        next_sibling: Option<Id>,
    ) -> VacResult<Id> {
        self.check_insertion(parent, next_sibling)?;
        let id = self.complex.ids.generate();
        if self.complex.contains(id) {
            return Err(VacError::DuplicateId(id));
        }
        self.touch(id);
        self.touch(parent);
        let node = Node::new(id, data);
        let kind = node.kind();
        self.complex.nodes.insert(id, node);
        self.link(id, parent, next_sibling);
        let source = self.source.unwrap_or("operations");
        self.diff.on_node_created(id, kind, source);
        self.diff.on_node_inserted(id, parent, next_sibling);
        self.on_node_modified(parent, NodeModificationFlags::CHILDREN_CHANGED);
        self.complex.version += 1;
        tracing::trace!("Created {:?} {} under {}", kind, id, parent);
        Ok(id)
    }

    /// Moves an existing node under `parent`, before `next_sibling`.
    pub(crate) fn move_node(&mut self, id: Id, parent: Id, next_sibling: Option<Id>) -> VacResult<()> {
        self.check_insertion(parent, next_sibling)?;
        let old_parent = self.parent(id)?;
        if next_sibling == Some(id) {
            return Ok(());
        }
        self.touch(id);
        self.touch(old_parent);
        self.touch(parent);
        self.unlink(id);
        self.link(id, parent, next_sibling);
        self.diff.on_node_inserted(id, parent, next_sibling);
        self.on_node_modified(old_parent, NodeModificationFlags::CHILDREN_CHANGED);
        self.on_node_modified(parent, NodeModificationFlags::CHILDREN_CHANGED);
        if old_parent != parent {
            self.on_node_modified(id, NodeModificationFlags::REPARENTED);
        }
        Ok(())
    }

    /// Removes a node from the arena and queues its removal notification.
    /// `unlink` is false when the parent is destroyed in the same pass.
    pub(crate) fn destroy_node(&mut self, id: Id, unlink: bool) {
        self.touch(id);
        let parent = self.complex.nodes.get(&id).and_then(|n| n.parent);
        if let (true, Some(parent)) = (unlink, parent) {
            self.touch(parent);
            self.unlink(id);
            self.on_node_modified(parent, NodeModificationFlags::CHILDREN_CHANGED);
        }
        if let Some(node) = self.complex.nodes.remove(&id) {
            self.pending_destroyed.push(node);
        }
        self.diff.on_node_destroyed(id);
        tracing::trace!("Destroyed {}", id);
    }

    /// Links an unlinked node. Callers have touched `id` and `parent`.
    fn link(&mut self, id: Id, parent: Id, next_sibling: Option<Id>) {
        let nodes = &mut self.complex.nodes;
        let previous = match next_sibling {
            Some(sibling) => nodes.get(&sibling).and_then(|n| n.previous_sibling),
            None => nodes
                .get(&parent)
                .and_then(Node::as_group)
                .and_then(|g| g.last_child),
        };
        if let Some(node) = nodes.get_mut(&id) {
            node.parent = Some(parent);
            node.previous_sibling = previous;
            node.next_sibling = next_sibling;
        }
        match previous.and_then(|p| nodes.get_mut(&p)) {
            Some(prev) => prev.next_sibling = Some(id),
            None => {
                if let Some(group) = nodes.get_mut(&parent).and_then(Node::as_group_mut) {
                    group.first_child = Some(id);
                }
            }
        }
        match next_sibling.and_then(|s| nodes.get_mut(&s)) {
            Some(next) => next.previous_sibling = Some(id),
            None => {
                if let Some(group) = nodes.get_mut(&parent).and_then(Node::as_group_mut) {
                    group.last_child = Some(id);
                }
            }
        }
        if let Some(group) = nodes.get_mut(&parent).and_then(Node::as_group_mut) {
            group.num_children += 1;
        }
    }

    /// Detaches a node from its siblings and parent, keeping its own link
    /// fields as a record of where it was.
    fn unlink(&mut self, id: Id) {
        let nodes = &mut self.complex.nodes;
        let Some((parent, previous, next)) = nodes
            .get(&id)
            .map(|n| (n.parent, n.previous_sibling, n.next_sibling))
        else {
            return;
        };
        let Some(parent) = parent else {
            return;
        };
        match previous.and_then(|p| nodes.get_mut(&p)) {
            Some(prev) => prev.next_sibling = next,
            None => {
                if let Some(group) = nodes.get_mut(&parent).and_then(Node::as_group_mut) {
                    group.first_child = next;
                }
            }
        }
        match next.and_then(|n| nodes.get_mut(&n)) {
            Some(next_node) => next_node.previous_sibling = previous,
            None => {
                if let Some(group) = nodes.get_mut(&parent).and_then(Node::as_group_mut) {
                    group.last_child = previous;
                }
            }
        }
        if let Some(group) = nodes.get_mut(&parent).and_then(Node::as_group_mut) {
            group.num_children = group.num_children.saturating_sub(1);
        }
    }
}

impl Drop for Operations<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Transaction dropped without commit, rolling back");
            self.rollback_();
        }
    }
}
