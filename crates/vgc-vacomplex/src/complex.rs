//! The complex: an arena of groups and cells with a root group.

use crate::diff::{ComplexDiff, NodeModificationFlags};
use crate::edit::NodeSnapshot;
use crate::error::{VacError, VacResult};
use crate::node::{Cell, CellData, CellSet, GroupData, KeyCycle, KeyEdgeData, KeyFaceData, KeyHalfedge, Node, NodeData, NodeKind};
use crate::stroke::point_at_fraction;
use std::collections::{HashMap, HashSet};
use vgc_core::geometry::point_in_polygons;
use vgc_core::{ComplexConfig, Id, IdGenerator, Signal, Vec2d};

/// Payload of [`ComplexSignals::node_created`].
#[derive(Debug, Clone, PartialEq)]
pub struct NodeCreated {
    pub id: Id,
    pub kind: NodeKind,
    pub source_operation: &'static str,
}

/// Payload of [`ComplexSignals::node_modified`].
#[derive(Debug, Clone, PartialEq)]
pub struct NodeModified {
    pub id: Id,
    pub flags: NodeModificationFlags,
}

/// Notifications emitted when a transaction commits.
///
/// Handlers run synchronously while the complex is still locked by the
/// committing transaction, so they cannot start another one.
#[derive(Debug, Default)]
pub struct ComplexSignals {
    pub node_created: Signal<NodeCreated>,
    /// Receives a copy of the node taken when it left the arena, after it
    /// was unlinked from its parent. The copy still records that parent and
    /// its boundary. Emitted at commit, once the node is already gone from
    /// the complex.
    pub node_about_to_be_removed: Signal<Node>,
    pub node_modified: Signal<NodeModified>,
}

#[derive(Debug)]
pub struct Complex {
    pub(crate) nodes: HashMap<Id, Node>,
    root: Id,
    pub(crate) ids: IdGenerator,
    pub(crate) version: u64,
    pub(crate) is_operation_in_progress: bool,
    pub(crate) diff_enabled: bool,
    pub(crate) persistent_diff: ComplexDiff,
    pub signals: ComplexSignals,
}

impl Complex {
    pub fn new() -> Self {
        let mut ids = IdGenerator::default();
        let root = ids.generate();
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new(root, NodeData::Group(GroupData::default())));
        Self {
            nodes,
            root,
            ids,
            version: 0,
            is_operation_in_progress: false,
            diff_enabled: false,
            persistent_diff: ComplexDiff::new(),
            signals: ComplexSignals::default(),
        }
    }

    pub fn with_config(config: &ComplexConfig) -> Self {
        let mut complex = Self::new();
        complex.diff_enabled = config.diff_enabled;
        complex
    }

    pub fn root(&self) -> Id {
        self.root
    }

    pub fn node(&self, id: Id) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of live nodes, root included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Monotonic counter bumped by every transaction and every creation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_operation_in_progress(&self) -> bool {
        self.is_operation_in_progress
    }

    pub fn is_diff_enabled(&self) -> bool {
        self.diff_enabled
    }

    /// Enables or disables the persistent diff. Disabling clears it.
    pub fn set_diff_enabled(&mut self, enabled: bool) {
        self.diff_enabled = enabled;
        if !enabled {
            self.persistent_diff.clear();
        }
    }

    /// Returns the changes accumulated since the last call.
    pub fn take_diff(&mut self) -> ComplexDiff {
        std::mem::take(&mut self.persistent_diff)
    }

    /// All live node ids in increasing order.
    pub fn node_ids(&self) -> Vec<Id> {
        let mut ids: Vec<Id> = self.nodes.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Children of a group in sibling order. Empty for cells.
    pub fn children(&self, group: Id) -> Vec<Id> {
        let mut children = Vec::new();
        let Some(data) = self.nodes.get(&group).and_then(Node::as_group) else {
            return children;
        };
        let mut current = data.first_child;
        while let Some(id) = current {
            if children.len() > self.nodes.len() {
                tracing::error!("Sibling cycle detected under group {}", group);
                break;
            }
            children.push(id);
            current = self.nodes.get(&id).and_then(|n| n.next_sibling);
        }
        children
    }

    /// Returns true if `ancestor` is `node` or one of its ancestors.
    pub fn is_descendant(&self, node: Id, ancestor: Id) -> bool {
        let mut current = Some(node);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                break;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    pub fn cell(&self, id: Id) -> Option<&Cell> {
        self.nodes.get(&id).and_then(Node::as_cell)
    }

    pub fn key_vertex_position(&self, id: Id) -> Option<Vec2d> {
        self.cell(id)?.as_key_vertex().map(|v| v.position())
    }

    pub fn key_edge(&self, id: Id) -> Option<&KeyEdgeData> {
        self.cell(id)?.as_key_edge()
    }

    pub fn key_face(&self, id: Id) -> Option<&KeyFaceData> {
        self.cell(id)?.as_key_face()
    }

    pub fn halfedge_start_vertex(&self, halfedge: KeyHalfedge) -> Option<Id> {
        let edge = self.key_edge(halfedge.edge)?;
        if halfedge.direction {
            edge.start
        } else {
            edge.end
        }
    }

    pub fn halfedge_end_vertex(&self, halfedge: KeyHalfedge) -> Option<Id> {
        self.halfedge_start_vertex(halfedge.opposite())
    }

    /// Samples of the edge in the traversal direction of the halfedge.
    pub fn halfedge_samples(&self, halfedge: KeyHalfedge) -> Vec<Vec2d> {
        let Some(edge) = self.key_edge(halfedge.edge) else {
            return Vec::new();
        };
        let mut samples = edge.stroke.sample();
        if !halfedge.direction {
            samples.reverse();
        }
        samples
    }

    /// Closed polygon approximating a cycle, without a repeated last point.
    pub fn cycle_polygon(&self, cycle: &KeyCycle) -> Vec<Vec2d> {
        match cycle {
            KeyCycle::Steiner(v) => self.key_vertex_position(*v).into_iter().collect(),
            KeyCycle::Halfedges(halfedges) => {
                let mut polygon: Vec<Vec2d> = Vec::new();
                for h in halfedges {
                    for p in self.halfedge_samples(*h) {
                        if polygon.last() != Some(&p) {
                            polygon.push(p);
                        }
                    }
                }
                if polygon.len() > 1 && polygon.first() == polygon.last() {
                    polygon.pop();
                }
                polygon
            }
        }
    }

    /// A point lying on the cycle, away from its vertices when possible.
    pub fn cycle_sample_point(&self, cycle: &KeyCycle) -> Option<Vec2d> {
        match cycle {
            KeyCycle::Steiner(v) => self.key_vertex_position(*v),
            KeyCycle::Halfedges(halfedges) => {
                let samples = self.halfedge_samples(*halfedges.first()?);
                Some(point_at_fraction(&samples, 0.5))
            }
        }
    }

    /// Even-odd containment test against the halfedge cycles of a face.
    pub fn face_contains_point(&self, face: Id, point: Vec2d) -> bool {
        let Some(data) = self.key_face(face) else {
            return false;
        };
        let polygons: Vec<Vec<Vec2d>> = data
            .cycles
            .iter()
            .filter(|c| c.steiner_vertex().is_none())
            .map(|c| self.cycle_polygon(c))
            .collect();
        point_in_polygons(point, &polygons)
    }

    /// Checks that a cycle is a closed walk over existing cells.
    pub fn validate_cycle(&self, cycle: &KeyCycle) -> VacResult<()> {
        match cycle {
            KeyCycle::Steiner(v) => self.expect_kind(*v, NodeKind::KeyVertex),
            KeyCycle::Halfedges(halfedges) => {
                let Some(first) = halfedges.first() else {
                    return Err(VacError::InvalidCycle("empty halfedge cycle".to_string()));
                };
                for h in halfedges {
                    self.expect_kind(h.edge, NodeKind::KeyEdge)?;
                }
                let closed = self.key_edge(first.edge).is_some_and(KeyEdgeData::is_closed);
                if closed {
                    if halfedges.iter().any(|h| h != first) {
                        return Err(VacError::InvalidCycle(format!(
                            "closed edge {} cannot be mixed with other halfedges",
                            first.edge
                        )));
                    }
                    return Ok(());
                }
                for (i, h) in halfedges.iter().enumerate() {
                    let next = halfedges[(i + 1) % halfedges.len()];
                    if self.key_edge(h.edge).is_some_and(KeyEdgeData::is_closed) {
                        return Err(VacError::InvalidCycle(format!(
                            "closed edge {} cannot be mixed with other halfedges",
                            h.edge
                        )));
                    }
                    if self.halfedge_end_vertex(*h) != self.halfedge_start_vertex(next) {
                        return Err(VacError::InvalidCycle(format!(
                            "halfedge of {} does not end where halfedge of {} starts",
                            h.edge, next.edge
                        )));
                    }
                }
                Ok(())
            }
        }
    }

    /// Cells referenced by a list of cycles, in first-use order.
    pub fn cycles_boundary(&self, cycles: &[KeyCycle]) -> CellSet {
        let mut boundary = CellSet::new();
        let mut push = |id: Id| {
            if !boundary.contains(&id) {
                boundary.push(id);
            }
        };
        for cycle in cycles {
            match cycle {
                KeyCycle::Steiner(v) => push(*v),
                KeyCycle::Halfedges(halfedges) => {
                    for h in halfedges {
                        push(h.edge);
                        if let Some(edge) = self.key_edge(h.edge) {
                            if let Some(v) = edge.start {
                                push(v);
                            }
                            if let Some(v) = edge.end {
                                push(v);
                            }
                        }
                    }
                }
            }
        }
        boundary
    }

    pub(crate) fn expect_kind(&self, id: Id, expected: NodeKind) -> VacResult<()> {
        let node = self.nodes.get(&id).ok_or(VacError::NodeNotFound(id))?;
        let actual = node.kind();
        if actual != expected {
            return Err(VacError::WrongCellType { id, expected, actual });
        }
        Ok(())
    }

    /// Verifies the tree links, boundary/star symmetry, and cell data.
    pub fn check_invariants(&self) -> VacResult<()> {
        let fail = |msg: String| Err(VacError::Inconsistent(msg));
        let Some(root) = self.nodes.get(&self.root) else {
            return fail(format!("root {} is missing", self.root));
        };
        if !root.is_group() || root.parent.is_some() {
            return fail("root must be a parentless group".to_string());
        }

        let mut reachable = 1;
        for (id, node) in &self.nodes {
            if let Some(group) = node.as_group() {
                let mut previous = None;
                let mut count = 0;
                let mut current = group.first_child;
                while let Some(child_id) = current {
                    let Some(child) = self.nodes.get(&child_id) else {
                        return fail(format!("group {id} links to missing child {child_id}"));
                    };
                    if child.parent != Some(*id) {
                        return fail(format!("child {child_id} does not point back to group {id}"));
                    }
                    if child.previous_sibling != previous {
                        return fail(format!("broken previous sibling link at {child_id}"));
                    }
                    count += 1;
                    if count > self.nodes.len() {
                        return fail(format!("sibling cycle under group {id}"));
                    }
                    previous = Some(child_id);
                    current = child.next_sibling;
                }
                if previous != group.last_child || count != group.num_children {
                    return fail(format!("children bookkeeping of group {id} is stale"));
                }
                reachable += count;
            }

            let Some(cell) = node.as_cell() else {
                continue;
            };
            let unique: HashSet<&Id> = cell.boundary.iter().collect();
            if unique.len() != cell.boundary.len() {
                return fail(format!("duplicate boundary entry in {id}"));
            }
            for b in &cell.boundary {
                match self.cell(*b) {
                    None => return fail(format!("{id} has dangling boundary cell {b}")),
                    Some(bc) if !bc.star.contains(id) => {
                        return fail(format!("{id} is bounded by {b} but missing from its star"))
                    }
                    _ => {}
                }
            }
            for s in &cell.star {
                match self.cell(*s) {
                    None => return fail(format!("{id} has dangling star cell {s}")),
                    Some(sc) if !sc.boundary.contains(id) => {
                        return fail(format!("{s} is in the star of {id} but not bounded by it"))
                    }
                    _ => {}
                }
            }
            match &cell.data {
                CellData::KeyVertex(_) => {}
                CellData::KeyEdge(edge) => {
                    if edge.start.is_some() != edge.end.is_some() {
                        return fail(format!("edge {id} has a single end vertex"));
                    }
                    let expected: CellSet = edge.start.into_iter().chain(edge.end).collect();
                    if !same_set(&expected, &cell.boundary) {
                        return fail(format!("boundary of edge {id} does not match its vertices"));
                    }
                }
                CellData::KeyFace(face) => {
                    for cycle in &face.cycles {
                        self.validate_cycle(cycle)?;
                    }
                    if !same_set(&self.cycles_boundary(&face.cycles), &cell.boundary) {
                        return fail(format!("boundary of face {id} does not match its cycles"));
                    }
                }
                CellData::InbetweenVertex(v) => {
                    if !same_set(&[v.before, v.after], &cell.boundary) {
                        return fail(format!("boundary of inbetween vertex {id} is stale"));
                    }
                }
            }
        }
        if reachable != self.nodes.len() {
            return fail(format!(
                "{} nodes are not reachable from the root",
                self.nodes.len() - reachable
            ));
        }
        Ok(())
    }

    /// Writes node states back without recording anything.
    ///
    /// `None` removes the node. Group snapshots carry their ordered
    /// children, which are relinked after every node has been written.
    /// Returns the removed nodes.
    pub(crate) fn apply_snapshots(&mut self, states: &[(Id, Option<&NodeSnapshot>)]) -> Vec<Node> {
        let mut removed = Vec::new();
        for (id, state) in states {
            if state.is_none() {
                if let Some(node) = self.nodes.remove(id) {
                    removed.push(node);
                }
            }
        }
        for (id, state) in states {
            if let Some(snapshot) = state {
                self.ids.reserve(*id);
                self.nodes.insert(*id, snapshot.node.clone());
            }
        }
        for (id, state) in states {
            if let Some(snapshot) = state {
                if snapshot.node.is_group() {
                    self.relink_children(*id, &snapshot.children);
                }
            }
        }
        removed
    }

    fn relink_children(&mut self, group: Id, children: &[Id]) {
        let mut previous = None;
        for (i, child) in children.iter().enumerate() {
            match self.nodes.get_mut(child) {
                Some(node) => {
                    node.parent = Some(group);
                    node.previous_sibling = previous;
                    node.next_sibling = children.get(i + 1).copied();
                }
                None => tracing::error!("Cannot relink missing child {} of group {}", child, group),
            }
            previous = Some(*child);
        }
        if let Some(data) = self.nodes.get_mut(&group).and_then(Node::as_group_mut) {
            data.first_child = children.first().copied();
            data.last_child = children.last().copied();
            data.num_children = children.len();
        }
    }
}

impl Default for Complex {
    fn default() -> Self {
        Self::new()
    }
}

fn same_set(a: &[Id], b: &[Id]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x))
}
