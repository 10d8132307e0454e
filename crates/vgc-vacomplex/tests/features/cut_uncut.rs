use crate::common::{free_edge, line, square, v};
use vgc_core::Id;
use vgc_vacomplex::{
    Complex, CurveParameter, KeyHalfedge, OneCycleCutPolicy, Operations, PolylineStroke,
    TwoCycleCutPolicy,
};

fn sorted_edges(complex: &Complex, face: Id) -> Vec<Id> {
    let mut edges: Vec<Id> = complex.key_face(face).unwrap().cycles()[0]
        .halfedges()
        .iter()
        .map(|h| h.edge)
        .collect();
    edges.sort();
    edges
}

#[test]
fn test_cut_then_uncut_square_face() {
    let mut complex = Complex::new();
    let mut ops = Operations::new(&mut complex).unwrap();
    let sq = square(&mut ops, 10.0);
    let root = ops.root();
    let diagonal = ops
        .create_key_open_edge(sq.corners[0], sq.corners[2], line(v(0.0, 0.0), v(10.0, 10.0)), root, None)
        .unwrap();
    let cut = ops
        .cut_glue_face_with_edge(sq.face, diagonal, OneCycleCutPolicy::Auto, TwoCycleCutPolicy::Auto)
        .unwrap();
    ops.commit();

    assert_eq!(cut.faces.len(), 2);
    assert!(!complex.contains(sq.face));
    assert!(complex.face_contains_point(cut.faces[0], v(7.0, 2.0)) != complex.face_contains_point(cut.faces[1], v(7.0, 2.0)));
    let mut star = complex.cell(diagonal).unwrap().star().to_vec();
    star.sort();
    let mut expected = cut.faces.clone();
    expected.sort();
    assert_eq!(star, expected);
    complex.check_invariants().unwrap();

    let mut ops = Operations::new(&mut complex).unwrap();
    let uncut = ops.uncut_at_key_edge(diagonal).unwrap();
    ops.commit();

    assert!(uncut.success);
    let merged = uncut.result_face.unwrap();
    assert!(!complex.contains(diagonal));
    assert!(cut.faces.iter().all(|f| !complex.contains(*f)));
    let mut sides = sq.sides.to_vec();
    sides.sort();
    assert_eq!(sorted_edges(&complex, merged), sides);
    assert!(complex.face_contains_point(merged, v(7.0, 2.0)));
    assert!(complex.face_contains_point(merged, v(2.0, 7.0)));
    complex.check_invariants().unwrap();
}

#[test]
fn test_hole_cut_and_uncut() {
    let mut complex = Complex::new();
    let mut ops = Operations::new(&mut complex).unwrap();
    let sq = square(&mut ops, 10.0);
    let root = ops.root();
    let ring = PolylineStroke::closed(vec![v(3.0, 3.0), v(7.0, 3.0), v(7.0, 7.0), v(3.0, 7.0)], 1.0);
    let ring = ops.create_key_closed_edge(Box::new(ring), root, None).unwrap();
    let cut = ops
        .cut_glue_face_with_edge(sq.face, ring, OneCycleCutPolicy::Auto, TwoCycleCutPolicy::Auto)
        .unwrap();
    ops.commit();

    assert_eq!(cut.faces.len(), 2);
    let (outer, inner) = (cut.faces[0], cut.faces[1]);
    assert_eq!(outer, sq.face);
    assert_eq!(complex.key_face(outer).unwrap().cycles().len(), 2);
    assert!(complex.face_contains_point(outer, v(1.0, 1.0)));
    assert!(!complex.face_contains_point(outer, v(5.0, 5.0)));
    assert!(complex.face_contains_point(inner, v(5.0, 5.0)));
    assert_eq!(
        complex.key_face(inner).unwrap().cycles()[0].halfedges(),
        &[KeyHalfedge::new(ring, true)]
    );
    complex.check_invariants().unwrap();

    let mut ops = Operations::new(&mut complex).unwrap();
    let uncut = ops.uncut_at_key_edge(ring).unwrap();
    ops.commit();

    assert!(uncut.success);
    let merged = uncut.result_face.unwrap();
    assert!(!complex.contains(ring));
    assert!(!complex.contains(inner));
    assert_eq!(complex.key_face(merged).unwrap().cycles().len(), 1);
    assert!(complex.face_contains_point(merged, v(5.0, 5.0)));
    complex.check_invariants().unwrap();
}

#[test]
fn test_cut_then_uncut_free_edge() {
    let mut complex = Complex::new();
    let mut ops = Operations::new(&mut complex).unwrap();
    let edge = free_edge(&mut ops, v(0.0, 0.0), v(8.0, 0.0));
    let (start, end) = {
        let data = ops.complex().key_edge(edge).unwrap();
        (data.start_vertex().unwrap(), data.end_vertex().unwrap())
    };
    let cut = ops
        .cut_edge(edge, &[CurveParameter::new(0, 0.25), CurveParameter::new(0, 0.75)])
        .unwrap();
    assert_eq!(cut.vertices.len(), 2);
    assert_eq!(cut.edges.len(), 3);
    assert_eq!(ops.complex().key_vertex_position(cut.vertices[0]), Some(v(2.0, 0.0)));
    assert_eq!(ops.complex().key_vertex_position(cut.vertices[1]), Some(v(6.0, 0.0)));

    let first = ops.uncut_at_key_vertex(cut.vertices[0]).unwrap();
    assert!(first.success);
    let second = ops.uncut_at_key_vertex(cut.vertices[1]).unwrap();
    assert!(second.success);
    ops.commit();

    let joined = second.result_edge.unwrap();
    let data = complex.key_edge(joined).unwrap();
    assert_eq!(data.start_vertex(), Some(start));
    assert_eq!(data.end_vertex(), Some(end));
    let samples = data.stroke().sample();
    assert_eq!(samples.first(), Some(&v(0.0, 0.0)));
    assert_eq!(samples.last(), Some(&v(8.0, 0.0)));
    assert_eq!(complex.cell(start).unwrap().star(), &[joined]);
    complex.check_invariants().unwrap();
}

#[test]
fn test_cut_closed_edge_then_uncut_restores_loop() {
    let mut complex = Complex::new();
    let mut ops = Operations::new(&mut complex).unwrap();
    let root = ops.root();
    let ring = PolylineStroke::closed(vec![v(0.0, 0.0), v(4.0, 0.0), v(4.0, 4.0), v(0.0, 4.0)], 1.0);
    let ring = ops.create_key_closed_edge(Box::new(ring), root, None).unwrap();
    let cut = ops.cut_edge(ring, &[CurveParameter::new(1, 0.5)]).unwrap();
    assert_eq!(cut.edges.len(), 1);
    let piece = ops.complex().key_edge(cut.edges[0]).unwrap();
    assert_eq!(piece.start_vertex(), Some(cut.vertices[0]));
    assert_eq!(piece.end_vertex(), Some(cut.vertices[0]));

    let uncut = ops.uncut_at_key_vertex(cut.vertices[0]).unwrap();
    ops.commit();

    assert!(uncut.success);
    let closed = uncut.result_edge.unwrap();
    assert!(complex.key_edge(closed).unwrap().is_closed());
    assert!(!complex.contains(cut.vertices[0]));
    complex.check_invariants().unwrap();
}
