//! Uncutting: merging cells separated by a vertex or an edge.
//!
//! Not every configuration can be uncut. Unsupported ones are reported
//! through `success == false` and leave the complex untouched, while
//! invalid input still fails with an error.

use super::cut::reversed_path;
use super::Operations;
use crate::error::VacResult;
use crate::node::{CellData, KeyCycle, KeyHalfedge, NodeKind};
use crate::stroke::{close_open_stroke, join_open_strokes};
use vgc_core::Id;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UncutAtKeyVertexResult {
    pub success: bool,
    /// Edge replacing the two edges joined at the vertex.
    pub result_edge: Option<Id>,
    /// Face that lost the vertex as a Steiner cycle.
    pub result_face: Option<Id>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UncutAtKeyEdgeResult {
    pub success: bool,
    /// Face covering both sides of the removed edge.
    pub result_face: Option<Id>,
}

/// A halfedge of a cycle after joining two edges.
#[derive(Clone, Copy)]
enum Joined {
    Keep(KeyHalfedge),
    /// The joined edge, in this direction.
    New(bool),
}

enum PlannedCycle {
    Unchanged(KeyCycle),
    Joined(Vec<Joined>),
}

impl Operations<'_> {
    /// Removes `vertex` by merging what it separates: two edges meeting
    /// there, the two ends of a loop edge, or a Steiner cycle.
    pub fn uncut_at_key_vertex(&mut self, vertex: Id) -> VacResult<UncutAtKeyVertexResult> {
        self.run("uncut_at_key_vertex", |ops| ops.uncut_at_key_vertex_(vertex))
    }

    /// Removes `edge` by merging the two face sides it separates. The edge
    /// must be used exactly twice by face cycles.
    pub fn uncut_at_key_edge(&mut self, edge: Id) -> VacResult<UncutAtKeyEdgeResult> {
        self.run("uncut_at_key_edge", |ops| ops.uncut_at_key_edge_(edge))
    }

    fn uncut_at_key_vertex_(&mut self, vertex: Id) -> VacResult<UncutAtKeyVertexResult> {
        self.expect_kind(vertex, NodeKind::KeyVertex)?;
        let star = self.cell(vertex)?.star.to_vec();
        let mut ends: Vec<(Id, bool)> = Vec::new();
        let mut steiner_uses: Vec<(Id, usize)> = Vec::new();
        for s in &star {
            match self.cell(*s)?.data() {
                CellData::KeyEdge(edge) => {
                    if edge.start == Some(vertex) {
                        ends.push((*s, true));
                    }
                    if edge.end == Some(vertex) {
                        ends.push((*s, false));
                    }
                }
                CellData::KeyFace(face) => {
                    for (i, cycle) in face.cycles.iter().enumerate() {
                        if *cycle == KeyCycle::Steiner(vertex) {
                            steiner_uses.push((*s, i));
                        }
                    }
                }
                CellData::InbetweenVertex(_) => {
                    return Ok(vertex_uncut_failed(vertex, "an inbetween vertex depends on it"));
                }
                CellData::KeyVertex(_) => {}
            }
        }

        match (ends.as_slice(), steiner_uses.as_slice()) {
            ([], [(face, i)]) => self.remove_steiner_cycle(vertex, *face, *i),
            ([(e1, _), (e2, _)], []) if e1 == e2 => self.close_loop_edge(vertex, *e1),
            ([first, second], []) => self.join_edges(vertex, *first, *second),
            _ => Ok(vertex_uncut_failed(vertex, "it does not separate exactly two uses")),
        }
    }

    fn remove_steiner_cycle(&mut self, vertex: Id, face: Id, cycle: usize) -> VacResult<UncutAtKeyVertexResult> {
        let mut cycles = self.key_face(face)?.cycles.clone();
        cycles.remove(cycle);
        self.set_face_cycles(face, cycles)?;
        self.hard_delete_(&[vertex], false)?;
        Ok(UncutAtKeyVertexResult {
            success: true,
            result_edge: None,
            result_face: Some(face),
        })
    }

    fn close_loop_edge(&mut self, vertex: Id, edge: Id) -> VacResult<UncutAtKeyVertexResult> {
        let faces = self.cell(edge)?.star.to_vec();
        for face in &faces {
            for cycle in &self.key_face(*face)?.cycles {
                let halfedges = cycle.halfedges();
                if halfedges.iter().any(|h| h.edge == edge) && halfedges.iter().any(|h| *h != halfedges[0]) {
                    return Ok(vertex_uncut_failed(vertex, "a cycle uses its loop edge both ways"));
                }
            }
        }

        let stroke = close_open_stroke(self.key_edge(edge)?.stroke.as_ref());
        let parent = self.parent(edge)?;
        let closed = self.create_key_closed_edge_(stroke, parent, Some(edge))?;
        for face in faces {
            let cycles = self
                .key_face(face)?
                .cycles
                .iter()
                .map(|cycle| match cycle {
                    KeyCycle::Halfedges(halfedges) => KeyCycle::Halfedges(
                        halfedges
                            .iter()
                            .map(|h| if h.edge == edge { KeyHalfedge::new(closed, h.direction) } else { *h })
                            .collect(),
                    ),
                    steiner => steiner.clone(),
                })
                .collect();
            self.set_face_cycles(face, cycles)?;
        }
        self.hard_delete_(&[edge, vertex], false)?;
        Ok(UncutAtKeyVertexResult {
            success: true,
            result_edge: Some(closed),
            result_face: None,
        })
    }

    fn join_edges(
        &mut self,
        vertex: Id,
        (e1, vertex_starts_e1): (Id, bool),
        (e2, vertex_starts_e2): (Id, bool),
    ) -> VacResult<UncutAtKeyVertexResult> {
        // h1 arrives at the vertex, h2 leaves it.
        let h1 = KeyHalfedge::new(e1, !vertex_starts_e1);
        let h2 = KeyHalfedge::new(e2, vertex_starts_e2);

        let mut faces: Vec<Id> = Vec::new();
        for e in [e1, e2] {
            for f in self.cell(e)?.star.iter() {
                if !faces.contains(f) {
                    faces.push(*f);
                }
            }
        }
        let mut plans = Vec::with_capacity(faces.len());
        for face in &faces {
            let mut planned = Vec::new();
            for cycle in &self.key_face(*face)?.cycles {
                let halfedges = cycle.halfedges();
                if !halfedges.iter().any(|h| h.edge == e1 || h.edge == e2) {
                    planned.push(PlannedCycle::Unchanged(cycle.clone()));
                    continue;
                }
                let Some(joined) = join_pairs(halfedges, h1, h2) else {
                    return Ok(vertex_uncut_failed(vertex, "a face cycle does not go straight through it"));
                };
                planned.push(PlannedCycle::Joined(joined));
            }
            plans.push((*face, planned));
        }

        let stroke = join_open_strokes(&[
            (self.key_edge(e1)?.stroke.as_ref(), h1.direction),
            (self.key_edge(e2)?.stroke.as_ref(), h2.direction),
        ]);
        let start = self.halfedge_vertex(h1, true)?;
        let end = self.halfedge_vertex(h2, false)?;
        let parent = self.parent(e1)?;
        let joined_edge = self.create_key_open_edge_(start, end, stroke, parent, Some(e1))?;
        for (face, planned) in plans {
            let cycles = planned
                .into_iter()
                .map(|p| match p {
                    PlannedCycle::Unchanged(cycle) => cycle,
                    PlannedCycle::Joined(steps) => KeyCycle::Halfedges(
                        steps
                            .into_iter()
                            .map(|s| match s {
                                Joined::Keep(h) => h,
                                Joined::New(direction) => KeyHalfedge::new(joined_edge, direction),
                            })
                            .collect(),
                    ),
                })
                .collect();
            self.set_face_cycles(face, cycles)?;
        }
        self.hard_delete_(&[e1, e2, vertex], false)?;
        tracing::debug!("Joined edges {} and {} into {}", e1, e2, joined_edge);
        Ok(UncutAtKeyVertexResult {
            success: true,
            result_edge: Some(joined_edge),
            result_face: None,
        })
    }

    fn uncut_at_key_edge_(&mut self, edge: Id) -> VacResult<UncutAtKeyEdgeResult> {
        let start = self.key_edge(edge)?.start;
        let mut uses: Vec<(Id, usize, usize)> = Vec::new();
        for face in self.cell(edge)?.star.iter() {
            for (i, cycle) in self.key_face(*face)?.cycles.iter().enumerate() {
                for (j, h) in cycle.halfedges().iter().enumerate() {
                    if h.edge == edge {
                        uses.push((*face, i, j));
                    }
                }
            }
        }
        let [(f1, c1, i1), (f2, c2, i2)] = uses[..] else {
            tracing::debug!("Cannot uncut at edge {}: used {} times", edge, uses.len());
            return Ok(UncutAtKeyEdgeResult::default());
        };

        let result_face = if f1 == f2 && c1 == c2 {
            let mut cycles = self.key_face(f1)?.cycles.clone();
            let rotated = rotate(cycles[c1].halfedges(), i1);
            let j = (i2 + rotated.len() - i1) % rotated.len();
            let (h1, h2) = (rotated[0], rotated[j]);
            let x = rotated[1..j].to_vec();
            let y = rotated[j + 1..].to_vec();
            let replacement: Vec<KeyCycle> = if h2 == h1.opposite() {
                let end = self.complex.halfedge_end_vertex(h1);
                let begin = self.complex.halfedge_start_vertex(h1);
                make_cycle(x, end).into_iter().chain(make_cycle(y, begin)).collect()
            } else {
                let mut merged = x;
                merged.extend(reversed_path(&y));
                make_cycle(merged, start).into_iter().collect()
            };
            cycles.remove(c1);
            for (k, cycle) in replacement.into_iter().enumerate() {
                cycles.insert(c1 + k, cycle);
            }
            self.set_face_cycles(f1, cycles)?;
            f1
        } else {
            let first = rotate(self.key_face(f1)?.cycles[c1].halfedges(), i1);
            let second = rotate(self.key_face(f2)?.cycles[c2].halfedges(), i2);
            let mut merged = first[1..].to_vec();
            if second[0] == first[0].opposite() {
                merged.extend_from_slice(&second[1..]);
            } else {
                merged.extend(reversed_path(&second[1..]));
            }
            let merged = make_cycle(merged, start);

            if f1 == f2 {
                let mut cycles = Vec::new();
                for (i, cycle) in self.key_face(f1)?.cycles.iter().enumerate() {
                    if i == c1 {
                        cycles.extend(merged.clone());
                    } else if i != c2 {
                        cycles.push(cycle.clone());
                    }
                }
                self.set_face_cycles(f1, cycles)?;
                f1
            } else {
                let others = |cycles: &[KeyCycle], skip: usize| -> Vec<KeyCycle> {
                    cycles
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != skip)
                        .map(|(_, c)| c.clone())
                        .collect()
                };
                let mut cycles = others(&self.key_face(f1)?.cycles, c1);
                cycles.extend(others(&self.key_face(f2)?.cycles, c2));
                cycles.extend(merged);
                let parent = self.parent(f1)?;
                let face = self.create_key_face_(cycles, parent, Some(f1))?;
                self.hard_delete_(&[f1, f2], false)?;
                face
            }
        };
        self.hard_delete_(&[edge], false)?;
        tracing::debug!("Uncut at edge {}, result face {}", edge, result_face);
        Ok(UncutAtKeyEdgeResult {
            success: true,
            result_face: Some(result_face),
        })
    }
}

fn vertex_uncut_failed(vertex: Id, reason: &str) -> UncutAtKeyVertexResult {
    tracing::debug!("Cannot uncut at vertex {}: {}", vertex, reason);
    UncutAtKeyVertexResult::default()
}

/// Replaces every `h1, h2` pair of a cycle by the joined edge forward, and
/// every reversed pair by the joined edge backward. Fails if the cycle uses
/// either edge outside such a pair.
fn join_pairs(halfedges: &[KeyHalfedge], h1: KeyHalfedge, h2: KeyHalfedge) -> Option<Vec<Joined>> {
    let (back1, back2) = (h1.opposite(), h2.opposite());
    let n = halfedges.len();
    // Start away from the second halfedge of a pair.
    let start = halfedges.iter().position(|h| *h != h2 && *h != back1)?;
    let mut joined = Vec::with_capacity(n);
    let mut k = 0;
    while k < n {
        let h = halfedges[(start + k) % n];
        let next = halfedges[(start + k + 1) % n];
        if h == h1 && next == h2 && k + 1 < n {
            joined.push(Joined::New(true));
            k += 2;
        } else if h == back2 && next == back1 && k + 1 < n {
            joined.push(Joined::New(false));
            k += 2;
        } else if h.edge == h1.edge || h.edge == h2.edge {
            return None;
        } else {
            joined.push(Joined::Keep(h));
            k += 1;
        }
    }
    Some(joined)
}

fn rotate(halfedges: &[KeyHalfedge], first: usize) -> Vec<KeyHalfedge> {
    halfedges[first..].iter().chain(&halfedges[..first]).copied().collect()
}

/// A cycle from a walk, or the Steiner vertex where an empty walk stands.
fn make_cycle(halfedges: Vec<KeyHalfedge>, vertex_if_empty: Option<Id>) -> Option<KeyCycle> {
    if halfedges.is_empty() {
        vertex_if_empty.map(KeyCycle::Steiner)
    } else {
        Some(KeyCycle::Halfedges(halfedges))
    }
}
