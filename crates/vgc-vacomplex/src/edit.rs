//! Recordable edits of a complex, for use with [`vgc_core::History`].

use crate::complex::Complex;
use crate::diff::{ComplexDiff, NodeModificationFlags};
use crate::error::VacResult;
use crate::node::Node;
use crate::operations::Operations;
use vgc_core::{Id, UndoOperation};

/// State of one node at a point in time, including the ordered children of
/// groups.
#[derive(Debug, Clone)]
pub struct NodeSnapshot {
    pub(crate) node: Node,
    pub(crate) children: Vec<Id>,
}

impl NodeSnapshot {
    pub(crate) fn capture(complex: &Complex, id: Id) -> Option<Self> {
        let node = complex.node(id)?.clone();
        let children = if node.is_group() {
            complex.children(id)
        } else {
            Vec::new()
        };
        Some(Self { node, children })
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// What differs between `self` and a later state of the same node.
    pub(crate) fn modification_flags(&self, later: &NodeSnapshot) -> NodeModificationFlags {
        let mut flags = NodeModificationFlags::empty();
        if self.node.parent != later.node.parent {
            flags |= NodeModificationFlags::REPARENTED;
        }
        if self.children != later.children {
            flags |= NodeModificationFlags::CHILDREN_CHANGED;
        }
        if let (Some(a), Some(b)) = (self.node.as_cell(), later.node.as_cell()) {
            if a.boundary != b.boundary {
                flags |= NodeModificationFlags::BOUNDARY_CHANGED;
            }
            if a.star != b.star {
                flags |= NodeModificationFlags::STAR_CHANGED;
            }
            if !a.data.same_content(&b.data) {
                flags |= NodeModificationFlags::GEOMETRY_CHANGED;
            }
        }
        flags
    }
}

/// Before and after state of a node touched by a transaction.
#[derive(Debug, Clone)]
pub(crate) struct NodeState {
    pub(crate) id: Id,
    pub(crate) before: Option<NodeSnapshot>,
    pub(crate) after: Option<NodeSnapshot>,
}

/// Everything one committed transaction changed, replayable in both
/// directions.
///
/// Undo and redo run inside a fresh transaction, so observers of the
/// complex receive ordinary diffs and signals.
#[derive(Debug, Clone)]
pub struct ComplexEdit {
    name: String,
    states: Vec<NodeState>,
}

impl ComplexEdit {
    pub(crate) fn new(name: String, states: Vec<NodeState>) -> Self {
        Self { name, states }
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of nodes touched by the edit.
    pub fn num_nodes(&self) -> usize {
        self.states.len()
    }

    pub fn undo_on(&self, complex: &mut Complex) -> VacResult<ComplexDiff> {
        let targets: Vec<(Id, Option<&NodeSnapshot>)> =
            self.states.iter().map(|s| (s.id, s.before.as_ref())).collect();
        replay(complex, &targets, "undo")
    }

    pub fn redo_on(&self, complex: &mut Complex) -> VacResult<ComplexDiff> {
        let targets: Vec<(Id, Option<&NodeSnapshot>)> =
            self.states.iter().map(|s| (s.id, s.after.as_ref())).collect();
        replay(complex, &targets, "redo")
    }
}

fn replay(
    complex: &mut Complex,
    targets: &[(Id, Option<&NodeSnapshot>)],
    source: &'static str,
) -> VacResult<ComplexDiff> {
    let mut ops = Operations::new(complex)?;
    ops.restore_snapshots(targets, source);
    Ok(ops.commit())
}

impl UndoOperation<Complex> for ComplexEdit {
    fn name(&self) -> &str {
        &self.name
    }

    fn undo(&mut self, complex: &mut Complex) -> anyhow::Result<()> {
        let diff = self.undo_on(complex)?;
        tracing::debug!(
            "Undid '{}' ({} created, {} destroyed, {} modified)",
            self.name,
            diff.created_nodes().len(),
            diff.destroyed_nodes().len(),
            diff.modified_nodes().len()
        );
        Ok(())
    }

    fn redo(&mut self, complex: &mut Complex) -> anyhow::Result<()> {
        let diff = self.redo_on(complex)?;
        tracing::debug!(
            "Redid '{}' ({} created, {} destroyed, {} modified)",
            self.name,
            diff.created_nodes().len(),
            diff.destroyed_nodes().len(),
            diff.modified_nodes().len()
        );
        Ok(())
    }
}
