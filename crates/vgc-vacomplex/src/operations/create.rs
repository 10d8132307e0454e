//! Creation primitives.
//!
//! Every created node is fully linked when the call returns: inserted in the
//! tree at the requested position and registered in the star of each of its
//! boundary cells.

use super::Operations;
use crate::error::{VacError, VacResult};
use crate::node::{
    Cell, CellData, GroupData, InbetweenVertexData, KeyCycle, KeyEdgeData, KeyFaceData,
    KeyVertexData, NodeData, NodeKind,
};
use crate::stroke::StrokeGeometry;
use vgc_core::{Id, Vec2d};

impl Operations<'_> {
    /// Creates an empty group under `parent`, before `next_sibling` or last.
    pub fn create_group(&mut self, parent: Id, next_sibling: Option<Id>) -> VacResult<Id> {
        self.run("create_group", |ops| {
            ops.insert_node(NodeData::Group(GroupData::default()), parent, next_sibling)
        })
    }

    pub fn create_key_vertex(
        &mut self,
        position: Vec2d,
        parent: Id,
        next_sibling: Option<Id>,
    ) -> VacResult<Id> {
        self.run("create_key_vertex", |ops| {
            ops.create_cell(
                CellData::KeyVertex(KeyVertexData { position }),
                &[],
                parent,
                next_sibling,
            )
        })
    }

    /// Creates an edge from `start` to `end`. The stroke endpoints are
    /// snapped onto the vertex positions.
    pub fn create_key_open_edge(
        &mut self,
        start: Id,
        end: Id,
        stroke: Box<dyn StrokeGeometry>,
        parent: Id,
        next_sibling: Option<Id>,
    ) -> VacResult<Id> {
        self.run("create_key_open_edge", |ops| {
            ops.create_key_open_edge_(start, end, stroke, parent, next_sibling)
        })
    }

    pub fn create_key_closed_edge(
        &mut self,
        stroke: Box<dyn StrokeGeometry>,
        parent: Id,
        next_sibling: Option<Id>,
    ) -> VacResult<Id> {
        self.run("create_key_closed_edge", |ops| {
            ops.create_key_closed_edge_(stroke, parent, next_sibling)
        })
    }

    /// Creates a face bounded by `cycles`. An empty list is a face covering
    /// the whole plane.
    pub fn create_key_face(
        &mut self,
        cycles: Vec<KeyCycle>,
        parent: Id,
        next_sibling: Option<Id>,
    ) -> VacResult<Id> {
        self.run("create_key_face", |ops| {
            ops.create_key_face_(cycles, parent, next_sibling)
        })
    }

    /// Creates a vertex interpolating between two distinct key vertices.
    pub fn create_inbetween_vertex(
        &mut self,
        before: Id,
        after: Id,
        parent: Id,
        next_sibling: Option<Id>,
    ) -> VacResult<Id> {
        self.run("create_inbetween_vertex", |ops| {
            ops.expect_kind(before, NodeKind::KeyVertex)?;
            ops.expect_kind(after, NodeKind::KeyVertex)?;
            if before == after {
                return Err(VacError::InvalidInput(
                    "an inbetween vertex needs two distinct key vertices".to_string(),
                ));
            }
            ops.create_cell(
                CellData::InbetweenVertex(InbetweenVertexData { before, after }),
                &[before, after],
                parent,
                next_sibling,
            )
        })
    }

    pub(crate) fn create_key_open_edge_(
        &mut self,
        start: Id,
        end: Id,
        mut stroke: Box<dyn StrokeGeometry>,
        parent: Id,
        next_sibling: Option<Id>,
    ) -> VacResult<Id> {
        let start_position = self.key_vertex_position(start)?;
        let end_position = self.key_vertex_position(end)?;
        if stroke.is_closed() {
            return Err(VacError::InvalidInput(
                "an open edge needs an open stroke".to_string(),
            ));
        }
        stroke.snap(start_position, end_position);
        let data = KeyEdgeData {
            start: Some(start),
            end: Some(end),
            stroke,
        };
        self.create_cell(CellData::KeyEdge(data), &[start, end], parent, next_sibling)
    }

    pub(crate) fn create_key_closed_edge_(
        &mut self,
        stroke: Box<dyn StrokeGeometry>,
        parent: Id,
        next_sibling: Option<Id>,
    ) -> VacResult<Id> {
        if !stroke.is_closed() {
            return Err(VacError::InvalidInput(
                "a closed edge needs a closed stroke".to_string(),
            ));
        }
        let data = KeyEdgeData {
            start: None,
            end: None,
            stroke,
        };
        self.create_cell(CellData::KeyEdge(data), &[], parent, next_sibling)
    }

    pub(crate) fn create_key_face_(
        &mut self,
        cycles: Vec<KeyCycle>,
        parent: Id,
        next_sibling: Option<Id>,
    ) -> VacResult<Id> {
        for cycle in &cycles {
            self.complex.validate_cycle(cycle)?;
        }
        let boundary = self.complex.cycles_boundary(&cycles);
        self.create_cell(
            CellData::KeyFace(KeyFaceData { cycles }),
            &boundary,
            parent,
            next_sibling,
        )
    }

    pub(crate) fn create_key_vertex_(
        &mut self,
        position: Vec2d,
        parent: Id,
        next_sibling: Option<Id>,
    ) -> VacResult<Id> {
        self.create_cell(
            CellData::KeyVertex(KeyVertexData { position }),
            &[],
            parent,
            next_sibling,
        )
    }

    fn create_cell(
        &mut self,
        data: CellData,
        boundary: &[Id],
        parent: Id,
        next_sibling: Option<Id>,
    ) -> VacResult<Id> {
        for b in boundary {
            self.cell(*b)?;
        }
        let id = self.insert_node(NodeData::Cell(Cell::new(data)), parent, next_sibling)?;
        for b in boundary {
            self.add_to_boundary(id, *b)?;
        }
        Ok(id)
    }
}
