//! Nodes of the complex: groups and cells.
//!
//! Nodes live in an arena owned by [`Complex`](crate::Complex) and refer to
//! each other by [`Id`]. Sibling order is an intrusive doubly linked list
//! stored in the `previous_sibling`/`next_sibling` fields, with first/last
//! pointers held by the parent group.

use crate::stroke::StrokeGeometry;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use vgc_core::{Id, Vec2d};

/// Ordered set of cell ids. Most cells have a handful of boundary cells.
pub type CellSet = SmallVec<[Id; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Group,
    KeyVertex,
    KeyEdge,
    KeyFace,
    InbetweenVertex,
}

impl NodeKind {
    pub fn is_cell(self) -> bool {
        self != NodeKind::Group
    }

    pub fn is_vertex(self) -> bool {
        matches!(self, NodeKind::KeyVertex | NodeKind::InbetweenVertex)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: Id,
    pub(crate) parent: Option<Id>,
    pub(crate) previous_sibling: Option<Id>,
    pub(crate) next_sibling: Option<Id>,
    pub(crate) data: NodeData,
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Group(GroupData),
    Cell(Cell),
}

impl Node {
    pub(crate) fn new(id: Id, data: NodeData) -> Self {
        Self {
            id,
            parent: None,
            previous_sibling: None,
            next_sibling: None,
            data,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Parent group; `None` only for the root.
    pub fn parent(&self) -> Option<Id> {
        self.parent
    }

    pub fn previous_sibling(&self) -> Option<Id> {
        self.previous_sibling
    }

    pub fn next_sibling(&self) -> Option<Id> {
        self.next_sibling
    }

    pub fn kind(&self) -> NodeKind {
        match &self.data {
            NodeData::Group(_) => NodeKind::Group,
            NodeData::Cell(cell) => cell.kind(),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.data, NodeData::Group(_))
    }

    pub fn as_group(&self) -> Option<&GroupData> {
        match &self.data {
            NodeData::Group(group) => Some(group),
            NodeData::Cell(_) => None,
        }
    }

    pub fn as_cell(&self) -> Option<&Cell> {
        match &self.data {
            NodeData::Cell(cell) => Some(cell),
            NodeData::Group(_) => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut GroupData> {
        match &mut self.data {
            NodeData::Group(group) => Some(group),
            NodeData::Cell(_) => None,
        }
    }

    pub(crate) fn as_cell_mut(&mut self) -> Option<&mut Cell> {
        match &mut self.data {
            NodeData::Cell(cell) => Some(cell),
            NodeData::Group(_) => None,
        }
    }
}

/// Children bookkeeping of a group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupData {
    pub(crate) first_child: Option<Id>,
    pub(crate) last_child: Option<Id>,
    pub(crate) num_children: usize,
}

impl GroupData {
    pub fn first_child(&self) -> Option<Id> {
        self.first_child
    }

    pub fn last_child(&self) -> Option<Id> {
        self.last_child
    }

    pub fn num_children(&self) -> usize {
        self.num_children
    }
}

/// A topological cell.
///
/// `boundary` lists the cells this cell depends on and `star` the cells
/// depending on it. The two relations are kept symmetric by the operations.
#[derive(Debug, Clone)]
pub struct Cell {
    pub(crate) boundary: CellSet,
    pub(crate) star: CellSet,
    pub(crate) data: CellData,
}

impl Cell {
    pub(crate) fn new(data: CellData) -> Self {
        Self {
            boundary: CellSet::new(),
            star: CellSet::new(),
            data,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match &self.data {
            CellData::KeyVertex(_) => NodeKind::KeyVertex,
            CellData::KeyEdge(_) => NodeKind::KeyEdge,
            CellData::KeyFace(_) => NodeKind::KeyFace,
            CellData::InbetweenVertex(_) => NodeKind::InbetweenVertex,
        }
    }

    pub fn boundary(&self) -> &[Id] {
        &self.boundary
    }

    pub fn star(&self) -> &[Id] {
        &self.star
    }

    pub fn data(&self) -> &CellData {
        &self.data
    }

    pub fn as_key_vertex(&self) -> Option<&KeyVertexData> {
        match &self.data {
            CellData::KeyVertex(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_key_edge(&self) -> Option<&KeyEdgeData> {
        match &self.data {
            CellData::KeyEdge(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_key_face(&self) -> Option<&KeyFaceData> {
        match &self.data {
            CellData::KeyFace(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_inbetween_vertex(&self) -> Option<&InbetweenVertexData> {
        match &self.data {
            CellData::InbetweenVertex(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CellData {
    KeyVertex(KeyVertexData),
    KeyEdge(KeyEdgeData),
    KeyFace(KeyFaceData),
    InbetweenVertex(InbetweenVertexData),
}

impl CellData {
    /// Compares the geometric and cycle content, ignoring boundary and star.
    pub(crate) fn same_content(&self, other: &CellData) -> bool {
        match (self, other) {
            (CellData::KeyVertex(a), CellData::KeyVertex(b)) => a.position == b.position,
            (CellData::KeyEdge(a), CellData::KeyEdge(b)) => {
                a.start == b.start
                    && a.end == b.end
                    && a.stroke.model_name() == b.stroke.model_name()
                    && a.stroke.width() == b.stroke.width()
                    && a.stroke.sample() == b.stroke.sample()
            }
            (CellData::KeyFace(a), CellData::KeyFace(b)) => a.cycles == b.cycles,
            (CellData::InbetweenVertex(a), CellData::InbetweenVertex(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyVertexData {
    pub(crate) position: Vec2d,
}

impl KeyVertexData {
    pub fn position(&self) -> Vec2d {
        self.position
    }
}

/// An edge between two key vertices, or a closed loop without vertices.
#[derive(Debug, Clone)]
pub struct KeyEdgeData {
    pub(crate) start: Option<Id>,
    pub(crate) end: Option<Id>,
    pub(crate) stroke: Box<dyn StrokeGeometry>,
}

impl KeyEdgeData {
    pub fn start_vertex(&self) -> Option<Id> {
        self.start
    }

    pub fn end_vertex(&self) -> Option<Id> {
        self.end
    }

    pub fn is_closed(&self) -> bool {
        self.start.is_none()
    }

    pub fn stroke(&self) -> &dyn StrokeGeometry {
        self.stroke.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyFaceData {
    pub(crate) cycles: Vec<KeyCycle>,
}

impl KeyFaceData {
    pub fn cycles(&self) -> &[KeyCycle] {
        &self.cycles
    }
}

/// A vertex interpolated between two key vertices at different times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InbetweenVertexData {
    pub(crate) before: Id,
    pub(crate) after: Id,
}

impl InbetweenVertexData {
    pub fn before_vertex(&self) -> Id {
        self.before
    }

    pub fn after_vertex(&self) -> Id {
        self.after
    }
}

/// An edge traversed in a given direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyHalfedge {
    pub edge: Id,
    /// True when the edge is traversed from start to end.
    pub direction: bool,
}

impl KeyHalfedge {
    pub const fn new(edge: Id, direction: bool) -> Self {
        Self { edge, direction }
    }

    pub fn opposite(self) -> Self {
        Self {
            edge: self.edge,
            direction: !self.direction,
        }
    }
}

/// One boundary component of a face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyCycle {
    /// A single vertex inside the face.
    Steiner(Id),
    /// A closed walk of halfedges. Either a single closed edge repeated, or
    /// open halfedges where each one ends where the next one starts.
    Halfedges(Vec<KeyHalfedge>),
}

impl KeyCycle {
    pub fn steiner_vertex(&self) -> Option<Id> {
        match self {
            KeyCycle::Steiner(v) => Some(*v),
            KeyCycle::Halfedges(_) => None,
        }
    }

    pub fn halfedges(&self) -> &[KeyHalfedge] {
        match self {
            KeyCycle::Steiner(_) => &[],
            KeyCycle::Halfedges(h) => h,
        }
    }

    /// The same walk in the opposite direction.
    pub fn reversed(&self) -> KeyCycle {
        match self {
            KeyCycle::Steiner(v) => KeyCycle::Steiner(*v),
            KeyCycle::Halfedges(h) => {
                KeyCycle::Halfedges(h.iter().rev().map(|h| h.opposite()).collect())
            }
        }
    }

    pub fn uses_edge(&self, edge: Id) -> bool {
        self.halfedges().iter().any(|h| h.edge == edge)
    }
}
