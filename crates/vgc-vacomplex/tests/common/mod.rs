#![allow(dead_code)]

use vgc_core::{Id, Vec2d};
use vgc_vacomplex::{Complex, KeyCycle, KeyHalfedge, LineStroke, Operations, StrokeGeometry};

pub fn v(x: f64, y: f64) -> Vec2d {
    Vec2d::new(x, y)
}

pub fn line(p: Vec2d, q: Vec2d) -> Box<dyn StrokeGeometry> {
    Box::new(LineStroke::new(p, q, 1.0))
}

/// Creates two vertices and a straight edge between them under the root.
pub fn free_edge(ops: &mut Operations<'_>, p: Vec2d, q: Vec2d) -> Id {
    let root = ops.root();
    let a = ops.create_key_vertex(p, root, None).unwrap();
    let b = ops.create_key_vertex(q, root, None).unwrap();
    ops.create_key_open_edge(a, b, line(p, q), root, None).unwrap()
}

/// Counter-clockwise square of side `size` at the origin, filled.
pub struct Square {
    pub corners: [Id; 4],
    pub sides: [Id; 4],
    pub face: Id,
}

pub fn square(ops: &mut Operations<'_>, size: f64) -> Square {
    let root = ops.root();
    let points = [v(0.0, 0.0), v(size, 0.0), v(size, size), v(0.0, size)];
    let corners = points.map(|p| ops.create_key_vertex(p, root, None).unwrap());
    let sides = [0, 1, 2, 3].map(|i| {
        let j = (i + 1) % 4;
        ops.create_key_open_edge(corners[i], corners[j], line(points[i], points[j]), root, None)
            .unwrap()
    });
    let cycle = KeyCycle::Halfedges(sides.iter().map(|e| KeyHalfedge::new(*e, true)).collect());
    let face = ops.create_key_face(vec![cycle], root, None).unwrap();
    Square {
        corners,
        sides,
        face,
    }
}

/// Debug rendering of every node, ordered by id. Two complexes with equal
/// dumps have identical content.
pub fn dump(complex: &Complex) -> Vec<String> {
    complex
        .node_ids()
        .into_iter()
        .filter_map(|id| complex.node(id))
        .map(|node| format!("{node:?}"))
        .collect()
}
