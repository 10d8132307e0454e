//! Batch intersection of sampled polylines.

use crate::stroke::CurveParameter;
use vgc_core::geometry::{segment_intersection, EPSILON};
use vgc_core::{Rect2d, Vec2d};

/// A crossing between two polylines, or a polyline and itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineIntersection {
    pub position: Vec2d,
    /// Polyline index and location on it.
    pub first: (usize, CurveParameter),
    pub second: (usize, CurveParameter),
}

#[derive(Debug)]
struct Polyline {
    points: Vec<Vec2d>,
    closed: bool,
    bounds: Rect2d,
}

impl Polyline {
    fn num_segments(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    fn segment_bounds(&self, i: usize) -> Rect2d {
        Rect2d::from_points(&self.points[i..i + 2])
    }

    /// Canonical form: segment joints belong to the next segment, and the
    /// end of a closed polyline is its start.
    fn normalize(&self, param: CurveParameter) -> CurveParameter {
        let n = self.num_segments();
        let p = param.normalized(n);
        if self.closed && p.segment_index + 1 == n && p.u >= 1.0 {
            CurveParameter::new(0, 0.0)
        } else {
            p
        }
    }

    fn is_open_endpoint(&self, p: CurveParameter) -> bool {
        let n = self.num_segments();
        !self.closed
            && ((p.segment_index == 0 && p.u <= EPSILON)
                || (p.segment_index + 1 == n && p.u >= 1.0 - EPSILON))
    }

    /// Whether segments `a < b` share a joint.
    fn are_adjacent(&self, a: usize, b: usize) -> bool {
        b == a + 1 || (self.closed && a == 0 && b + 1 == self.num_segments())
    }
}

/// Collects polylines, then finds where they cross.
///
/// Polylines are given as samples; closed ones repeat their first sample
/// at the end.
#[derive(Debug, Default)]
pub struct SegmentIntersector {
    polylines: Vec<Polyline>,
}

impl SegmentIntersector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a polyline and returns its index.
    pub fn add_polyline(&mut self, points: Vec<Vec2d>, closed: bool) -> usize {
        let bounds = Rect2d::from_points(&points);
        self.polylines.push(Polyline {
            points,
            closed,
            bounds,
        });
        self.polylines.len() - 1
    }

    pub fn num_polylines(&self) -> usize {
        self.polylines.len()
    }

    /// Intersections involving at least one of the first `num_subjects`
    /// polylines, including self-intersections of those. Polylines added
    /// after them are only tested against them.
    ///
    /// Crossings at the endpoints of open polylines are not reported, and
    /// a crossing through a joint between two segments is reported once.
    pub fn compute(&self, num_subjects: usize) -> Vec<PolylineIntersection> {
        let mut result: Vec<PolylineIntersection> = Vec::new();
        for i in 0..num_subjects.min(self.polylines.len()) {
            for j in i..self.polylines.len() {
                let (a, b) = (&self.polylines[i], &self.polylines[j]);
                if !a.bounds.intersects(&b.bounds) {
                    continue;
                }
                for sa in 0..a.num_segments() {
                    let first_b = if i == j { sa + 1 } else { 0 };
                    for sb in first_b..b.num_segments() {
                        if i == j && a.are_adjacent(sa, sb) {
                            continue;
                        }
                        if !a.segment_bounds(sa).intersects(&b.segment_bounds(sb)) {
                            continue;
                        }
                        let Some((ta, tb)) = segment_intersection(
                            a.points[sa],
                            a.points[sa + 1],
                            b.points[sb],
                            b.points[sb + 1],
                        ) else {
                            continue;
                        };
                        let pa = a.normalize(CurveParameter::new(sa, ta));
                        let pb = b.normalize(CurveParameter::new(sb, tb));
                        // TODO: handle T-junctions
                        if a.is_open_endpoint(pa) || b.is_open_endpoint(pb) {
                            continue;
                        }
                        let found = PolylineIntersection {
                            position: a.points[sa].lerp(a.points[sa + 1], ta),
                            first: (i, pa),
                            second: (j, pb),
                        };
                        if !result.iter().any(|r| same_crossing(r, &found)) {
                            result.push(found);
                        }
                    }
                }
            }
        }
        tracing::trace!(
            "Found {} intersections among {} polylines",
            result.len(),
            self.polylines.len()
        );
        result
    }
}

fn same_crossing(a: &PolylineIntersection, b: &PolylineIntersection) -> bool {
    let near = |x: &(usize, CurveParameter), y: &(usize, CurveParameter)| {
        x.0 == y.0 && x.1.segment_index == y.1.segment_index && (x.1.u - y.1.u).abs() < EPSILON
    };
    near(&a.first, &b.first) && near(&a.second, &b.second)
}
