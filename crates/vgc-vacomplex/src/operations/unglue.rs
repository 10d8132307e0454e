//! Ungluing: splitting a shared cell into one copy per independent use.

use super::union_find::DisjointSets;
use super::Operations;
use crate::diff::NodeModificationFlags;
use crate::error::VacResult;
use crate::node::{CellData, KeyCycle, KeyHalfedge, NodeKind};
use vgc_core::Id;

/// One end of an edge: the edge and whether it is its start.
type EdgeEnd = (Id, bool);

impl Operations<'_> {
    /// Splits each vertex into one vertex per independent use.
    ///
    /// Edge ends that follow each other through the vertex in a face cycle
    /// count as one use; each Steiner cycle is a use of its own. Returns,
    /// per input vertex, the vertices replacing it, or the vertex itself
    /// when it has at most one use.
    pub fn unglue_key_vertices(&mut self, vertices: &[Id]) -> VacResult<Vec<Vec<Id>>> {
        self.run("unglue_key_vertices", |ops| {
            let mut result = Vec::with_capacity(vertices.len());
            for v in vertices {
                result.push(ops.unglue_key_vertex(*v)?);
            }
            Ok(result)
        })
    }

    /// Splits each edge into one edge per halfedge use in face cycles.
    /// End vertices stay shared.
    pub fn unglue_key_edges(&mut self, edges: &[Id]) -> VacResult<Vec<Vec<Id>>> {
        self.run("unglue_key_edges", |ops| {
            let mut result = Vec::with_capacity(edges.len());
            for e in edges {
                result.push(ops.unglue_key_edge(*e)?);
            }
            Ok(result)
        })
    }

    fn unglue_key_vertex(&mut self, vertex: Id) -> VacResult<Vec<Id>> {
        let position = self.key_vertex_position(vertex)?;
        let star = self.cell(vertex)?.star.to_vec();

        let mut ends: Vec<EdgeEnd> = Vec::new();
        let mut steiner_uses: Vec<(Id, usize)> = Vec::new();
        let mut faces = Vec::new();
        let mut inbetweens = Vec::new();
        for s in &star {
            match self.kind(*s)? {
                NodeKind::KeyEdge => {
                    let edge = self.key_edge(*s)?;
                    if edge.start == Some(vertex) {
                        ends.push((*s, true));
                    }
                    if edge.end == Some(vertex) {
                        ends.push((*s, false));
                    }
                }
                NodeKind::KeyFace => {
                    for (i, cycle) in self.key_face(*s)?.cycles.iter().enumerate() {
                        if *cycle == KeyCycle::Steiner(vertex) {
                            steiner_uses.push((*s, i));
                        }
                    }
                    faces.push(*s);
                }
                NodeKind::InbetweenVertex => inbetweens.push(*s),
                _ => {}
            }
        }

        let mut sets = DisjointSets::new(ends.len());
        let index = |end: EdgeEnd| ends.iter().position(|x| *x == end);
        for face in &faces {
            for cycle in &self.key_face(*face)?.cycles {
                let halfedges = cycle.halfedges();
                for (i, h) in halfedges.iter().enumerate() {
                    let next = halfedges[(i + 1) % halfedges.len()];
                    let arriving = (h.edge, !h.direction);
                    let leaving = (next.edge, next.direction);
                    if let (Some(a), Some(b)) = (index(arriving), index(leaving)) {
                        sets.union(a, b);
                    }
                }
            }
        }
        let classes = sets.classes();
        if classes.len() + steiner_uses.len() <= 1 {
            return Ok(vec![vertex]);
        }

        let parent = self.parent(vertex)?;
        let mut created = Vec::with_capacity(classes.len() + steiner_uses.len());
        let mut touched_edges = Vec::new();
        for class in &classes {
            let new_vertex = self.create_key_vertex_(position, parent, Some(vertex))?;
            for i in class {
                let (edge, is_start) = ends[*i];
                let data = self.key_edge_mut(edge)?;
                if is_start {
                    data.start = Some(new_vertex);
                } else {
                    data.end = Some(new_vertex);
                }
                if !touched_edges.contains(&edge) {
                    touched_edges.push(edge);
                }
            }
            created.push(new_vertex);
        }
        for (face, i) in &steiner_uses {
            let new_vertex = self.create_key_vertex_(position, parent, Some(vertex))?;
            self.key_face_mut(*face)?.cycles[*i] = KeyCycle::Steiner(new_vertex);
            created.push(new_vertex);
        }

        for edge in touched_edges {
            let (start, end) = {
                let data = self.key_edge(edge)?;
                (data.start, data.end)
            };
            for v in [start, end].into_iter().flatten() {
                self.add_to_boundary(edge, v)?;
            }
            self.remove_from_boundary(edge, vertex)?;
        }
        for face in &faces {
            self.rebuild_face_boundary(*face)?;
        }
        if let Some(first) = created.first().copied() {
            for inbetween in inbetweens {
                if let CellData::InbetweenVertex(data) = &mut self.cell_mut(inbetween)?.data {
                    if data.before == vertex {
                        data.before = first;
                    }
                    if data.after == vertex {
                        data.after = first;
                    }
                }
                self.remove_from_boundary(inbetween, vertex)?;
                self.add_to_boundary(inbetween, first)?;
            }
        }

        self.hard_delete_(&[vertex], false)?;
        tracing::debug!("Unglued vertex {} into {} vertices", vertex, created.len());
        Ok(created)
    }

    fn unglue_key_edge(&mut self, edge: Id) -> VacResult<Vec<Id>> {
        let (start, end, stroke) = {
            let data = self.key_edge(edge)?;
            (data.start, data.end, data.stroke.clone())
        };
        let mut uses: Vec<(Id, usize, usize)> = Vec::new();
        for face in self.cell(edge)?.star.to_vec() {
            for (i, cycle) in self.key_face(face)?.cycles.iter().enumerate() {
                for (j, h) in cycle.halfedges().iter().enumerate() {
                    if h.edge == edge {
                        uses.push((face, i, j));
                    }
                }
            }
        }
        if uses.len() <= 1 {
            return Ok(vec![edge]);
        }

        let parent = self.parent(edge)?;
        let mut created = Vec::with_capacity(uses.len());
        let mut faces = Vec::new();
        for (face, i, j) in uses {
            let copy = match (start, end) {
                (Some(start), Some(end)) => {
                    self.create_key_open_edge_(start, end, stroke.clone(), parent, Some(edge))?
                }
                _ => self.create_key_closed_edge_(stroke.clone(), parent, Some(edge))?,
            };
            if let KeyCycle::Halfedges(halfedges) = &mut self.key_face_mut(face)?.cycles[i] {
                halfedges[j] = KeyHalfedge::new(copy, halfedges[j].direction);
            }
            self.on_node_modified(face, NodeModificationFlags::GEOMETRY_CHANGED);
            if !faces.contains(&face) {
                faces.push(face);
            }
            created.push(copy);
        }
        for face in faces {
            self.rebuild_face_boundary(face)?;
        }
        self.hard_delete_(&[edge], false)?;
        tracing::debug!("Unglued edge {} into {} edges", edge, created.len());
        Ok(created)
    }
}
