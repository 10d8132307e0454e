//! Cutting: splitting edges at curve parameters and faces along edges.

use super::Operations;
use crate::complex::Complex;
use crate::error::{VacError, VacResult};
use crate::node::{KeyCycle, KeyHalfedge, NodeKind};
use crate::stroke::{position_at, prepare_cut_parameters, CurveParameter};
use serde::{Deserialize, Serialize};
use std::iter;
use vgc_core::geometry::{point_in_polygons, signed_area};
use vgc_core::{Id, Vec2d};

/// How to cut a face along an edge joining two vertices of the same cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OneCycleCutPolicy {
    /// Same as [`OneCycleCutPolicy::Disk`].
    #[default]
    Auto,
    /// Two faces, one on each side of the edge.
    Disk,
    /// One face whose cycle uses the edge twice in the same direction.
    Mobius,
    /// One face with two cycles, each using the edge once.
    Torus,
}

/// How to orient two cycles merged by an edge joining them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TwoCycleCutPolicy {
    /// Reverses the end cycle when both cycles turn the same way.
    #[default]
    Auto,
    ReverseNone,
    ReverseStart,
    ReverseEnd,
    ReverseBoth,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CutEdgeResult {
    /// New vertices in parameter order.
    pub vertices: Vec<Id>,
    /// Pieces in stroke order. Only the input edge when nothing was cut.
    pub edges: Vec<Id>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CutFaceResult {
    /// Faces covering the region of the cut face.
    pub faces: Vec<Id>,
}

/// Where a cutting edge attaches to the cycles of a face.
enum FaceCut {
    /// Closed edge: no attachment.
    Hole,
    /// Both ends on cycle `cycle`. `p` walks the cycle from the start vertex
    /// to the end vertex, `q` from the end vertex back.
    OneCycle {
        cycle: usize,
        p: Vec<KeyHalfedge>,
        q: Vec<KeyHalfedge>,
    },
    /// Ends on two cycles, each rotated to begin at the attachment vertex.
    TwoCycles {
        start_cycle: usize,
        end_cycle: usize,
        rs: Vec<KeyHalfedge>,
        rt: Vec<KeyHalfedge>,
    },
}

impl Operations<'_> {
    /// Splits an edge at the given parameters.
    ///
    /// Parameters are normalized and deduplicated, and for open edges the
    /// ones at either end are ignored. A new vertex is created at each
    /// remaining parameter, and faces using the edge use the pieces instead.
    pub fn cut_edge(&mut self, edge: Id, params: &[CurveParameter]) -> VacResult<CutEdgeResult> {
        self.run("cut_edge", |ops| ops.cut_edge_(edge, params))
    }

    /// Adds `vertex` to `face` as a Steiner cycle.
    pub fn cut_glue_face_with_vertex(&mut self, face: Id, vertex: Id) -> VacResult<()> {
        self.run("cut_glue_face_with_vertex", |ops| {
            ops.expect_kind(vertex, NodeKind::KeyVertex)?;
            let mut cycles = ops.key_face(face)?.cycles.clone();
            cycles.push(KeyCycle::Steiner(vertex));
            ops.set_face_cycles(face, cycles)
        })
    }

    /// Cuts `face` along `edge`, whose end vertices must lie on the face
    /// boundary. A closed edge cuts a hole and fills it with a new face.
    ///
    /// Nothing is modified when the edge cannot cut the face.
    pub fn cut_glue_face_with_edge(
        &mut self,
        face: Id,
        edge: Id,
        one_cycle_policy: OneCycleCutPolicy,
        two_cycle_policy: TwoCycleCutPolicy,
    ) -> VacResult<CutFaceResult> {
        self.run("cut_glue_face_with_edge", |ops| {
            ops.cut_glue_face_with_edge_(face, edge, one_cycle_policy, two_cycle_policy)
        })
    }

    pub(crate) fn cut_edge_(&mut self, edge: Id, params: &[CurveParameter]) -> VacResult<CutEdgeResult> {
        let data = self.key_edge(edge)?;
        let closed = data.is_closed();
        let (start, end) = (data.start, data.end);
        let samples = data.stroke.sample();
        let params = prepare_cut_parameters(params, samples.len().saturating_sub(1), closed);
        if params.is_empty() {
            return Ok(CutEdgeResult {
                vertices: Vec::new(),
                edges: vec![edge],
            });
        }
        let pieces = if closed {
            data.stroke.split_closed(&params)
        } else {
            data.stroke.split_open(&params)
        };
        let positions: Vec<Vec2d> = params.iter().map(|p| position_at(&samples, *p)).collect();

        let parent = self.parent(edge)?;
        let mut vertices = Vec::with_capacity(positions.len());
        for position in positions {
            vertices.push(self.create_key_vertex_(position, parent, Some(edge))?);
        }
        let chain: Vec<Id> = match (start, end) {
            (Some(start), Some(end)) => iter::once(start)
                .chain(vertices.iter().copied())
                .chain(iter::once(end))
                .collect(),
            _ => vertices.iter().copied().chain(vertices.first().copied()).collect(),
        };
        let mut edges = Vec::with_capacity(pieces.len());
        for (piece, ends) in pieces.into_iter().zip(chain.windows(2)) {
            edges.push(self.create_key_open_edge_(ends[0], ends[1], piece, parent, Some(edge))?);
        }

        let forward: Vec<KeyHalfedge> = edges.iter().map(|e| KeyHalfedge::new(*e, true)).collect();
        let backward = reversed_path(&forward);
        for face in self.cell(edge)?.star.to_vec() {
            let cycles = self
                .key_face(face)?
                .cycles
                .iter()
                .map(|cycle| match cycle {
                    KeyCycle::Halfedges(halfedges) => KeyCycle::Halfedges(
                        halfedges
                            .iter()
                            .flat_map(|h| match (h.edge == edge, h.direction) {
                                (false, _) => vec![*h],
                                (true, true) => forward.clone(),
                                (true, false) => backward.clone(),
                            })
                            .collect(),
                    ),
                    steiner => steiner.clone(),
                })
                .collect();
            self.set_face_cycles(face, cycles)?;
        }
        self.hard_delete_(&[edge], false)?;
        tracing::debug!("Cut edge {} into {} pieces", edge, edges.len());
        Ok(CutEdgeResult { vertices, edges })
    }

    pub(crate) fn cut_glue_face_with_edge_(
        &mut self,
        face: Id,
        edge: Id,
        one_cycle_policy: OneCycleCutPolicy,
        two_cycle_policy: TwoCycleCutPolicy,
    ) -> VacResult<CutFaceResult> {
        let plan = self.plan_face_cut(face, edge)?;
        let parent = self.parent(face)?;
        let next_sibling = self.node(face)?.next_sibling;
        let mut cycles = self.key_face(face)?.cycles.clone();
        let e = KeyHalfedge::new(edge, true);

        let faces = match plan {
            FaceCut::Hole => {
                let inner_cycle = KeyCycle::Halfedges(vec![e]);
                let polygon = self.complex.cycle_polygon(&inner_cycle);
                let (contained, mut outer): (Vec<KeyCycle>, Vec<KeyCycle>) = cycles
                    .into_iter()
                    .partition(|c| cycle_is_inside(self.complex, c, &polygon));
                outer.push(KeyCycle::Halfedges(vec![e.opposite()]));
                self.set_face_cycles(face, outer)?;
                let inner_cycles = iter::once(inner_cycle).chain(contained).collect();
                let inner = self.create_key_face_(inner_cycles, parent, next_sibling)?;
                vec![face, inner]
            }
            FaceCut::OneCycle { cycle, p, q } => match one_cycle_policy {
                OneCycleCutPolicy::Auto | OneCycleCutPolicy::Disk => {
                    let first = KeyCycle::Halfedges(p.into_iter().chain(iter::once(e.opposite())).collect());
                    let second = KeyCycle::Halfedges(q.into_iter().chain(iter::once(e)).collect());
                    cycles.remove(cycle);
                    let polygon = self.complex.cycle_polygon(&first);
                    let (in_first, in_second): (Vec<KeyCycle>, Vec<KeyCycle>) = cycles
                        .into_iter()
                        .partition(|c| cycle_is_inside(self.complex, c, &polygon));
                    let first_cycles = iter::once(first).chain(in_first).collect();
                    let second_cycles = iter::once(second).chain(in_second).collect();
                    let a = self.create_key_face_(first_cycles, parent, Some(face))?;
                    let b = self.create_key_face_(second_cycles, parent, Some(face))?;
                    self.hard_delete_(&[face], false)?;
                    vec![a, b]
                }
                OneCycleCutPolicy::Mobius => {
                    let mut halfedges = p;
                    halfedges.push(e.opposite());
                    halfedges.extend(reversed_path(&q));
                    halfedges.push(e.opposite());
                    cycles[cycle] = KeyCycle::Halfedges(halfedges);
                    self.set_face_cycles(face, cycles)?;
                    vec![face]
                }
                OneCycleCutPolicy::Torus => {
                    cycles[cycle] = KeyCycle::Halfedges(p.into_iter().chain(iter::once(e.opposite())).collect());
                    cycles.insert(cycle + 1, KeyCycle::Halfedges(q.into_iter().chain(iter::once(e)).collect()));
                    self.set_face_cycles(face, cycles)?;
                    vec![face]
                }
            },
            FaceCut::TwoCycles {
                start_cycle,
                end_cycle,
                rs,
                rt,
            } => {
                let (reverse_start, reverse_end) = match two_cycle_policy {
                    TwoCycleCutPolicy::Auto => {
                        let start_area = signed_area(&self.complex.cycle_polygon(&cycles[start_cycle]));
                        let end_area = signed_area(&self.complex.cycle_polygon(&cycles[end_cycle]));
                        (false, start_area * end_area > 0.0)
                    }
                    TwoCycleCutPolicy::ReverseNone => (false, false),
                    TwoCycleCutPolicy::ReverseStart => (true, false),
                    TwoCycleCutPolicy::ReverseEnd => (false, true),
                    TwoCycleCutPolicy::ReverseBoth => (true, true),
                };
                let mut halfedges = if reverse_start { reversed_path(&rs) } else { rs };
                halfedges.push(e);
                halfedges.extend(if reverse_end { reversed_path(&rt) } else { rt });
                halfedges.push(e.opposite());
                cycles[start_cycle] = KeyCycle::Halfedges(halfedges);
                cycles.remove(end_cycle);
                self.set_face_cycles(face, cycles)?;
                vec![face]
            }
        };
        tracing::debug!("Cut face {} with edge {} into {:?}", face, edge, faces);
        Ok(CutFaceResult { faces })
    }

    /// Locates the edge ends on the face boundary without modifying anything.
    fn plan_face_cut(&self, face: Id, edge: Id) -> VacResult<FaceCut> {
        let cycles = &self.key_face(face)?.cycles;
        let data = self.key_edge(edge)?;
        if self.cell(face)?.boundary.contains(&edge) {
            return Err(VacError::InvalidCut(format!("edge {edge} already bounds face {face}")));
        }
        let (Some(start), Some(end)) = (data.start, data.end) else {
            return Ok(FaceCut::Hole);
        };

        let mut rotations: Vec<(usize, Vec<KeyHalfedge>)> = cycles
            .iter()
            .enumerate()
            .filter_map(|(i, c)| rotate_to_vertex(self.complex, c, start).map(|r| (i, r)))
            .collect();
        if rotations.is_empty() {
            return Err(VacError::InvalidCut(format!(
                "start vertex {start} is not on the boundary of face {face}"
            )));
        }
        for (cycle, rotated) in &rotations {
            let split = if start == end {
                Some(0)
            } else {
                rotated
                    .iter()
                    .position(|h| self.complex.halfedge_start_vertex(*h) == Some(end))
            };
            if let Some(j) = split {
                return Ok(FaceCut::OneCycle {
                    cycle: *cycle,
                    p: rotated[..j].to_vec(),
                    q: rotated[j..].to_vec(),
                });
            }
        }
        let (start_cycle, rs) = rotations.swap_remove(0);
        let found = cycles
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != start_cycle)
            .find_map(|(i, c)| rotate_to_vertex(self.complex, c, end).map(|r| (i, r)));
        let Some((end_cycle, rt)) = found else {
            return Err(VacError::InvalidCut(format!(
                "end vertex {end} is not on the boundary of face {face}"
            )));
        };
        Ok(FaceCut::TwoCycles {
            start_cycle,
            end_cycle,
            rs,
            rt,
        })
    }
}

/// The cycle as a closed walk starting at `vertex`, or `None` if the cycle
/// does not go through it. Steiner cycles give an empty walk.
fn rotate_to_vertex(complex: &Complex, cycle: &KeyCycle, vertex: Id) -> Option<Vec<KeyHalfedge>> {
    match cycle {
        KeyCycle::Steiner(v) => (*v == vertex).then(Vec::new),
        KeyCycle::Halfedges(halfedges) => {
            let i = halfedges
                .iter()
                .position(|h| complex.halfedge_start_vertex(*h) == Some(vertex))?;
            Some(halfedges[i..].iter().chain(&halfedges[..i]).copied().collect())
        }
    }
}

pub(crate) fn reversed_path(halfedges: &[KeyHalfedge]) -> Vec<KeyHalfedge> {
    halfedges.iter().rev().map(|h| h.opposite()).collect()
}

fn cycle_is_inside(complex: &Complex, cycle: &KeyCycle, polygon: &Vec<Vec2d>) -> bool {
    complex
        .cycle_sample_point(cycle)
        .is_some_and(|p| point_in_polygons(p, std::slice::from_ref(polygon)))
}
