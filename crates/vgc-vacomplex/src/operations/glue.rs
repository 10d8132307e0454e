//! Gluing: merging several cells into one shared cell.

use super::union_find::DisjointSets;
use super::Operations;
use crate::error::{VacError, VacResult};
use crate::node::{CellData, KeyCycle, KeyHalfedge, NodeKind};
use crate::stroke::{average_closed_strokes, average_open_strokes, StrokeGeometry};
use vgc_core::{Id, Vec2d};

impl Operations<'_> {
    /// Replaces `vertices` by a single new vertex at `position`.
    ///
    /// Every cell using one of the vertices uses the new vertex instead, and
    /// incident edges are snapped onto it. A single vertex is returned as is.
    pub fn glue_key_vertices(&mut self, vertices: &[Id], position: Vec2d) -> VacResult<Id> {
        self.run("glue_key_vertices", |ops| ops.glue_key_vertices_(vertices, position))
    }

    /// Replaces open edges by a single edge, given as halfedges so that
    /// their relative orientation is known. End vertices are glued first:
    /// all start vertices together, and all end vertices together.
    pub fn glue_key_open_edges(&mut self, halfedges: &[KeyHalfedge]) -> VacResult<Id> {
        self.run("glue_key_open_edges", |ops| ops.glue_key_open_edges_(halfedges))
    }

    /// Replaces closed edges by a single closed edge. `u_offsets` gives, for
    /// each edge, the arc-length fraction where the merged parametrization
    /// starts; an empty slice means zero for all.
    pub fn glue_key_closed_edges(&mut self, halfedges: &[KeyHalfedge], u_offsets: &[f64]) -> VacResult<Id> {
        self.run("glue_key_closed_edges", |ops| {
            ops.glue_key_closed_edges_(halfedges, u_offsets)
        })
    }

    pub(crate) fn glue_key_vertices_(&mut self, vertices: &[Id], position: Vec2d) -> VacResult<Id> {
        let vertices = dedup(vertices);
        for v in &vertices {
            self.expect_kind(*v, NodeKind::KeyVertex)?;
        }
        let Some(&first) = vertices.first() else {
            return Err(VacError::InvalidInput("nothing to glue".to_string()));
        };
        if vertices.len() == 1 {
            return Ok(first);
        }
        let parent = self.parent(first)?;
        let glued = self.create_key_vertex_(position, parent, Some(first))?;
        for v in &vertices {
            self.substitute_key_vertex(*v, glued)?;
        }
        self.hard_delete_(&vertices, false)?;
        tracing::debug!("Glued {} vertices into {}", vertices.len(), glued);
        Ok(glued)
    }

    fn glue_key_open_edges_(&mut self, halfedges: &[KeyHalfedge]) -> VacResult<Id> {
        let edges = self.check_glued_edges(halfedges, false)?;
        if edges.len() == 1 {
            return Ok(edges[0]);
        }

        // Vertex classes: every start with the first start, every end with
        // the first end. A class may contain both when edges form loops.
        let mut vertices: Vec<Id> = Vec::new();
        let mut ends = Vec::with_capacity(halfedges.len());
        for h in halfedges {
            let start = self.halfedge_vertex(*h, true)?;
            let end = self.halfedge_vertex(*h, false)?;
            for v in [start, end] {
                if !vertices.contains(&v) {
                    vertices.push(v);
                }
            }
            ends.push((start, end));
        }
        let index = |v: Id| vertices.iter().position(|x| *x == v).unwrap_or(0);
        let mut sets = DisjointSets::new(vertices.len());
        for (start, end) in &ends[1..] {
            sets.union(index(ends[0].0), index(*start));
            sets.union(index(ends[0].1), index(*end));
        }
        let start_root = sets.find(index(ends[0].0));
        let end_root = sets.find(index(ends[0].1));
        let start_class: Vec<Id> = (0..vertices.len())
            .filter(|i| sets.find(*i) == start_root)
            .map(|i| vertices[i])
            .collect();
        let end_class: Vec<Id> = (0..vertices.len())
            .filter(|i| sets.find(*i) == end_root)
            .map(|i| vertices[i])
            .collect();

        let glued_start = self.glue_vertex_class(&start_class)?;
        let glued_end = if start_root == end_root {
            glued_start
        } else {
            self.glue_vertex_class(&end_class)?
        };

        let stroke = {
            let mut inputs: Vec<(&dyn StrokeGeometry, bool)> = Vec::new();
            for h in halfedges {
                inputs.push((self.key_edge(h.edge)?.stroke.as_ref(), h.direction));
            }
            average_open_strokes(&inputs)
                .ok_or_else(|| VacError::InvalidInput("no stroke to average".to_string()))?
        };
        let parent = self.parent(edges[0])?;
        let glued = self.create_key_open_edge_(glued_start, glued_end, stroke, parent, Some(edges[0]))?;
        for h in halfedges {
            self.substitute_key_edge(h.edge, KeyHalfedge::new(glued, h.direction))?;
        }
        self.hard_delete_(&edges, false)?;
        tracing::debug!("Glued {} open edges into {}", edges.len(), glued);
        Ok(glued)
    }

    fn glue_key_closed_edges_(&mut self, halfedges: &[KeyHalfedge], u_offsets: &[f64]) -> VacResult<Id> {
        let edges = self.check_glued_edges(halfedges, true)?;
        if !u_offsets.is_empty() && u_offsets.len() != halfedges.len() {
            return Err(VacError::InvalidInput(format!(
                "expected {} parametrization offsets, got {}",
                halfedges.len(),
                u_offsets.len()
            )));
        }
        if edges.len() == 1 {
            return Ok(edges[0]);
        }
        let stroke = {
            let mut inputs: Vec<(&dyn StrokeGeometry, bool, f64)> = Vec::new();
            for (i, h) in halfedges.iter().enumerate() {
                let offset = u_offsets.get(i).copied().unwrap_or(0.0);
                inputs.push((self.key_edge(h.edge)?.stroke.as_ref(), h.direction, offset));
            }
            average_closed_strokes(&inputs)
                .ok_or_else(|| VacError::InvalidInput("no stroke to average".to_string()))?
        };
        let parent = self.parent(edges[0])?;
        let glued = self.create_key_closed_edge_(stroke, parent, Some(edges[0]))?;
        for h in halfedges {
            self.substitute_key_edge(h.edge, KeyHalfedge::new(glued, h.direction))?;
        }
        self.hard_delete_(&edges, false)?;
        tracing::debug!("Glued {} closed edges into {}", edges.len(), glued);
        Ok(glued)
    }

    /// Validates glue inputs and returns the edges in order.
    fn check_glued_edges(&self, halfedges: &[KeyHalfedge], closed: bool) -> VacResult<Vec<Id>> {
        if halfedges.is_empty() {
            return Err(VacError::InvalidInput("nothing to glue".to_string()));
        }
        let edges: Vec<Id> = halfedges.iter().map(|h| h.edge).collect();
        if dedup(&edges).len() != edges.len() {
            return Err(VacError::InvalidInput("an edge is listed twice".to_string()));
        }
        for e in &edges {
            if self.key_edge(*e)?.is_closed() != closed {
                let expected = if closed { "closed" } else { "open" };
                return Err(VacError::InvalidInput(format!("edge {e} is not {expected}")));
            }
        }
        Ok(edges)
    }

    fn glue_vertex_class(&mut self, class: &[Id]) -> VacResult<Id> {
        if let [single] = class {
            return Ok(*single);
        }
        let mut sum = Vec2d::ZERO;
        for v in class {
            sum += self.key_vertex_position(*v)?;
        }
        self.glue_key_vertices_(class, sum / class.len() as f64)
    }

    pub(crate) fn halfedge_vertex(&self, halfedge: KeyHalfedge, start: bool) -> VacResult<Id> {
        let vertex = if start {
            self.complex.halfedge_start_vertex(halfedge)
        } else {
            self.complex.halfedge_end_vertex(halfedge)
        };
        vertex.ok_or_else(|| VacError::InvalidInput(format!("edge {} is closed", halfedge.edge)))
    }

    /// Makes every cell using `old` use `new` instead.
    pub(crate) fn substitute_key_vertex(&mut self, old: Id, new: Id) -> VacResult<()> {
        let star = self.cell(old)?.star.to_vec();
        for s in star {
            match &mut self.cell_mut(s)?.data {
                CellData::KeyEdge(edge) => {
                    if edge.start == Some(old) {
                        edge.start = Some(new);
                    }
                    if edge.end == Some(old) {
                        edge.end = Some(new);
                    }
                }
                CellData::KeyFace(face) => {
                    for cycle in &mut face.cycles {
                        if *cycle == KeyCycle::Steiner(old) {
                            *cycle = KeyCycle::Steiner(new);
                        }
                    }
                }
                CellData::InbetweenVertex(vertex) => {
                    if vertex.before == old {
                        vertex.before = new;
                    }
                    if vertex.after == old {
                        vertex.after = new;
                    }
                }
                CellData::KeyVertex(_) => {}
            }
            self.remove_from_boundary(s, old)?;
            self.add_to_boundary(s, new)?;
            if self.kind(s)? == NodeKind::KeyEdge {
                self.snap_key_edge(s)?;
            }
        }
        Ok(())
    }

    /// Makes every face using `old` use `new` instead. `new.direction` is
    /// false when `old` runs against the new edge.
    pub(crate) fn substitute_key_edge(&mut self, old: Id, new: KeyHalfedge) -> VacResult<()> {
        let star = self.cell(old)?.star.to_vec();
        for s in star {
            if let CellData::KeyFace(face) = &mut self.cell_mut(s)?.data {
                for cycle in &mut face.cycles {
                    if let KeyCycle::Halfedges(halfedges) = cycle {
                        for h in halfedges.iter_mut().filter(|h| h.edge == old) {
                            *h = KeyHalfedge::new(new.edge, h.direction == new.direction);
                        }
                    }
                }
            }
            self.remove_from_boundary(s, old)?;
            self.add_to_boundary(s, new.edge)?;
        }
        Ok(())
    }
}

pub(crate) fn dedup(ids: &[Id]) -> Vec<Id> {
    let mut out: Vec<Id> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}
