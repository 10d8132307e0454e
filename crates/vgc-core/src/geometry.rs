//! 2D geometry primitives used by the topological engine.
//!
//! Only what the engine needs is provided here: vectors, axis-aligned
//! rectangles, and a few polyline/polygon predicates. Curve sampling lives
//! with the stroke models.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// Tolerance used by the polyline predicates.
pub const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2d {
    pub x: f64,
    pub y: f64,
}

impl Vec2d {
    pub const ZERO: Vec2d = Vec2d { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Vec2d) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product.
    pub fn det(self, other: Vec2d) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn distance_to(self, other: Vec2d) -> f64 {
        (other - self).length()
    }

    pub fn lerp(self, other: Vec2d, t: f64) -> Vec2d {
        self + (other - self) * t
    }

    pub fn is_near(self, other: Vec2d, tolerance: f64) -> bool {
        self.distance_to(other) <= tolerance
    }
}

impl Add for Vec2d {
    type Output = Vec2d;
    fn add(self, rhs: Vec2d) -> Vec2d {
        Vec2d::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2d {
    fn add_assign(&mut self, rhs: Vec2d) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2d {
    type Output = Vec2d;
    fn sub(self, rhs: Vec2d) -> Vec2d {
        Vec2d::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2d {
    fn sub_assign(&mut self, rhs: Vec2d) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Vec2d {
    type Output = Vec2d;
    fn mul(self, rhs: f64) -> Vec2d {
        Vec2d::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Vec2d {
    type Output = Vec2d;
    fn div(self, rhs: f64) -> Vec2d {
        Vec2d::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Vec2d {
    type Output = Vec2d;
    fn neg(self) -> Vec2d {
        Vec2d::new(-self.x, -self.y)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect2d {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect2d {
    /// The empty rectangle: unioning anything into it yields that thing.
    pub const EMPTY: Rect2d = Rect2d {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec2d>) -> Self {
        points
            .into_iter()
            .fold(Rect2d::EMPTY, |r, p| r.united_with_point(*p))
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn width(&self) -> f64 {
        (self.max_x - self.min_x).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max_y - self.min_y).max(0.0)
    }

    pub fn united_with_point(self, p: Vec2d) -> Self {
        Self {
            min_x: self.min_x.min(p.x),
            min_y: self.min_y.min(p.y),
            max_x: self.max_x.max(p.x),
            max_y: self.max_y.max(p.y),
        }
    }

    pub fn united(self, other: Rect2d) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Closed-interval overlap test.
    pub fn intersects(&self, other: &Rect2d) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    pub fn contains_point(&self, p: Vec2d) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Total length of an open polyline.
pub fn polyline_length(points: &[Vec2d]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(w[1])).sum()
}

/// Signed area of a closed polygon; positive when counter-clockwise.
pub fn signed_area(polygon: &[Vec2d]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        sum += a.det(b);
    }
    sum * 0.5
}

/// Even-odd containment test over a set of closed polygons.
pub fn point_in_polygons(point: Vec2d, polygons: &[Vec<Vec2d>]) -> bool {
    let mut inside = false;
    for polygon in polygons {
        let n = polygon.len();
        if n < 3 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (polygon[i], polygon[j]);
            if (a.y > point.y) != (b.y > point.y) {
                let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
                if point.x < x {
                    inside = !inside;
                }
            }
            j = i;
        }
    }
    inside
}

/// Intersection of segments `[a0, a1]` and `[b0, b1]`.
///
/// Returns the parameters `(ta, tb)` in `[0, 1]` of the crossing point along
/// each segment. Parallel and collinear segments report no intersection.
pub fn segment_intersection(a0: Vec2d, a1: Vec2d, b0: Vec2d, b1: Vec2d) -> Option<(f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;
    let denom = da.det(db);
    if denom.abs() < EPSILON {
        return None;
    }
    let w = b0 - a0;
    let ta = w.det(db) / denom;
    let tb = w.det(da) / denom;
    let range = -EPSILON..=1.0 + EPSILON;
    if range.contains(&ta) && range.contains(&tb) {
        Some((ta.clamp(0.0, 1.0), tb.clamp(0.0, 1.0)))
    } else {
        None
    }
}
