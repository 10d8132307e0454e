//! Planar insertion of edges into a group.

use std::collections::HashMap;

use super::cut::{OneCycleCutPolicy, TwoCycleCutPolicy};
use super::glue::dedup;
use super::union_find::DisjointSets;
use super::Operations;
use crate::error::{VacError, VacResult};
use crate::intersector::SegmentIntersector;
use crate::node::NodeKind;
use crate::stroke::{cut_parameter_index, point_at_fraction, prepare_cut_parameters, CurveParameter};
use vgc_core::{Id, Vec2d};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntersectResult {
    /// Vertices at crossings, coincident ones glued together.
    pub vertices: Vec<Id>,
    /// Edges replacing the input edges, in input order.
    pub edges: Vec<Id>,
    /// Faces of the group produced by cutting them with the new edges.
    pub faces: Vec<Id>,
}

/// Cut applied to one edge during an intersection.
struct EdgeCut {
    prepared: Vec<CurveParameter>,
    num_segments: usize,
    vertices: Vec<Id>,
    pieces: Vec<Id>,
}

impl Operations<'_> {
    /// Cuts `edges` and the key edges of `group` wherever they cross, and
    /// glues the crossing vertices.
    ///
    /// With `intersect_faces`, every resulting piece then cuts the faces of
    /// the group containing its midpoint. Faces the piece cannot cut, for
    /// example because its ends are not on their boundary, are left alone.
    pub fn intersect_with_group(
        &mut self,
        edges: &[Id],
        group: Id,
        intersect_faces: bool,
    ) -> VacResult<IntersectResult> {
        self.run("intersect_with_group", |ops| {
            ops.intersect_with_group_(edges, group, intersect_faces)
        })
    }

    fn intersect_with_group_(
        &mut self,
        edges: &[Id],
        group: Id,
        intersect_faces: bool,
    ) -> VacResult<IntersectResult> {
        let inputs = dedup(edges);
        for e in &inputs {
            self.expect_kind(*e, NodeKind::KeyEdge)?;
        }
        self.expect_group(group)?;
        let others: Vec<Id> = self
            .complex
            .children(group)
            .into_iter()
            .filter(|c| !inputs.contains(c) && self.complex.key_edge(*c).is_some())
            .collect();
        let all: Vec<Id> = inputs.iter().chain(&others).copied().collect();

        let mut intersector = SegmentIntersector::new();
        for e in &all {
            let data = self.key_edge(*e)?;
            intersector.add_polyline(data.stroke.sample(), data.is_closed());
        }
        let crossings = intersector.compute(inputs.len());

        let mut params: Vec<Vec<CurveParameter>> = vec![Vec::new(); all.len()];
        for crossing in &crossings {
            params[crossing.first.0].push(crossing.first.1);
            params[crossing.second.0].push(crossing.second.1);
        }
        let mut cuts: Vec<Option<EdgeCut>> = Vec::with_capacity(all.len());
        for (edge, edge_params) in all.iter().zip(&params) {
            if edge_params.is_empty() {
                cuts.push(None);
                continue;
            }
            let (num_segments, closed) = {
                let data = self.key_edge(*edge)?;
                (data.stroke.sample().len().saturating_sub(1), data.is_closed())
            };
            let prepared = prepare_cut_parameters(edge_params, num_segments, closed);
            let result = self.cut_edge_(*edge, edge_params)?;
            cuts.push(Some(EdgeCut {
                prepared,
                num_segments,
                vertices: result.vertices,
                pieces: result.edges,
            }));
        }

        let vertex_at = |(index, param): (usize, CurveParameter)| -> Option<Id> {
            let cut = cuts.get(index)?.as_ref()?;
            let i = cut_parameter_index(&cut.prepared, param, cut.num_segments)?;
            cut.vertices.get(i).copied()
        };
        let mut vertices: Vec<Id> = Vec::new();
        let mut indices: HashMap<Id, usize> = HashMap::new();
        let mut pairs = Vec::with_capacity(crossings.len());
        for crossing in &crossings {
            let (Some(a), Some(b)) = (vertex_at(crossing.first), vertex_at(crossing.second)) else {
                tracing::warn!("No cut vertex found for crossing at {:?}", crossing.position);
                continue;
            };
            let [ia, ib] = [a, b].map(|v| {
                *indices.entry(v).or_insert_with(|| {
                    vertices.push(v);
                    vertices.len() - 1
                })
            });
            pairs.push((ia, ib));
        }
        let mut sets = DisjointSets::new(vertices.len());
        for (a, b) in &pairs {
            sets.union(*a, *b);
        }
        let mut glued = Vec::new();
        for class in sets.classes() {
            let members: Vec<Id> = class.iter().map(|i| vertices[*i]).collect();
            if let [single] = members[..] {
                glued.push(single);
                continue;
            }
            let mut sum = Vec2d::ZERO;
            for v in &members {
                sum += self.key_vertex_position(*v)?;
            }
            glued.push(self.glue_key_vertices_(&members, sum / members.len() as f64)?);
        }

        let mut result_edges = Vec::new();
        for (edge, cut) in inputs.iter().zip(&cuts) {
            match cut {
                Some(cut) => result_edges.extend(cut.pieces.iter().copied()),
                None => result_edges.push(*edge),
            }
        }

        let mut faces = Vec::new();
        if intersect_faces {
            for edge in &result_edges {
                faces.extend(self.cut_group_faces_with_edge(group, *edge)?);
            }
            faces.retain(|f| self.complex.contains(*f));
            faces = dedup(&faces);
        }

        tracing::debug!(
            "Intersected {} edges with group {}: {} crossings, {} faces",
            inputs.len(),
            group,
            crossings.len(),
            faces.len()
        );
        Ok(IntersectResult {
            vertices: glued,
            edges: result_edges,
            faces,
        })
    }

    /// Cuts the faces of `group` that contain the midpoint of `edge`.
    ///
    /// Containment is tested on a single point of the edge, which is enough
    /// for the pieces produced by an intersection since they do not cross
    /// any other edge of the group.
    fn cut_group_faces_with_edge(&mut self, group: Id, edge: Id) -> VacResult<Vec<Id>> {
        let midpoint = point_at_fraction(&self.key_edge(edge)?.stroke.sample(), 0.5);
        let candidates: Vec<Id> = self
            .complex
            .children(group)
            .into_iter()
            .filter(|c| self.complex.key_face(*c).is_some() && self.complex.face_contains_point(*c, midpoint))
            .collect();
        let mut faces = Vec::new();
        for face in candidates {
            match self.cut_glue_face_with_edge_(face, edge, OneCycleCutPolicy::Auto, TwoCycleCutPolicy::Auto) {
                Ok(cut) => faces.extend(cut.faces),
                Err(VacError::InvalidCut(reason)) => {
                    tracing::debug!("Face {} not cut by edge {}: {}", face, edge, reason);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(faces)
    }
}
