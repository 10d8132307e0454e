use crate::common::{free_edge, line, square, v};
use vgc_vacomplex::{Complex, KeyCycle, KeyHalfedge, Operations, VacError};

#[test]
fn test_glue_then_unglue_vertices() {
    let mut complex = Complex::new();
    let mut ops = Operations::new(&mut complex).unwrap();
    let left = free_edge(&mut ops, v(0.0, 0.0), v(4.0, 1.0));
    let right = free_edge(&mut ops, v(6.0, -1.0), v(10.0, 0.0));
    let a = ops.complex().key_edge(left).unwrap().end_vertex().unwrap();
    let b = ops.complex().key_edge(right).unwrap().start_vertex().unwrap();

    let glued = ops.glue_key_vertices(&[a, b], v(5.0, 0.0)).unwrap();
    assert_eq!(ops.complex().cell(glued).unwrap().star().len(), 2);
    assert!(!ops.complex().contains(a));
    assert!(!ops.complex().contains(b));
    assert_eq!(
        ops.complex().key_edge(left).unwrap().stroke().sample().last(),
        Some(&v(5.0, 0.0))
    );

    let split = ops.unglue_key_vertices(&[glued]).unwrap();
    ops.commit();

    assert_eq!(split.len(), 1);
    assert_eq!(split[0].len(), 2);
    assert!(!complex.contains(glued));
    assert_eq!(complex.key_edge(left).unwrap().end_vertex(), Some(split[0][0]));
    assert_eq!(complex.key_edge(right).unwrap().start_vertex(), Some(split[0][1]));
    for vertex in &split[0] {
        assert_eq!(complex.key_vertex_position(*vertex), Some(v(5.0, 0.0)));
        assert_eq!(complex.cell(*vertex).unwrap().star().len(), 1);
    }
    complex.check_invariants().unwrap();
}

#[test]
fn test_glue_then_unglue_edges_between_faces() {
    let mut complex = Complex::new();
    let mut ops = Operations::new(&mut complex).unwrap();
    let root = ops.root();
    // Two triangles drawn apart, sharing the segment from (0,0) to (4,0).
    let a0 = ops.create_key_vertex(v(0.0, 0.0), root, None).unwrap();
    let a1 = ops.create_key_vertex(v(4.0, 0.0), root, None).unwrap();
    let top = ops.create_key_vertex(v(2.0, 3.0), root, None).unwrap();
    let base_up = ops.create_key_open_edge(a0, a1, line(v(0.0, 0.0), v(4.0, 0.0)), root, None).unwrap();
    let up1 = ops.create_key_open_edge(a1, top, line(v(4.0, 0.0), v(2.0, 3.0)), root, None).unwrap();
    let up2 = ops.create_key_open_edge(top, a0, line(v(2.0, 3.0), v(0.0, 0.0)), root, None).unwrap();
    let upper = ops
        .create_key_face(
            vec![KeyCycle::Halfedges(vec![
                KeyHalfedge::new(base_up, true),
                KeyHalfedge::new(up1, true),
                KeyHalfedge::new(up2, true),
            ])],
            root,
            None,
        )
        .unwrap();
    let b0 = ops.create_key_vertex(v(0.0, 0.0), root, None).unwrap();
    let b1 = ops.create_key_vertex(v(4.0, 0.0), root, None).unwrap();
    let bottom = ops.create_key_vertex(v(2.0, -3.0), root, None).unwrap();
    let base_down = ops.create_key_open_edge(b1, b0, line(v(4.0, 0.0), v(0.0, 0.0)), root, None).unwrap();
    let down1 = ops.create_key_open_edge(b0, bottom, line(v(0.0, 0.0), v(2.0, -3.0)), root, None).unwrap();
    let down2 = ops.create_key_open_edge(bottom, b1, line(v(2.0, -3.0), v(4.0, 0.0)), root, None).unwrap();
    let lower = ops
        .create_key_face(
            vec![KeyCycle::Halfedges(vec![
                KeyHalfedge::new(base_down, true),
                KeyHalfedge::new(down1, true),
                KeyHalfedge::new(down2, true),
            ])],
            root,
            None,
        )
        .unwrap();

    let shared = ops
        .glue_key_open_edges(&[KeyHalfedge::new(base_up, true), KeyHalfedge::new(base_down, false)])
        .unwrap();
    {
        let complex = ops.complex();
        let star = complex.cell(shared).unwrap().star();
        assert!(star.contains(&upper) && star.contains(&lower));
        assert_eq!(
            complex.key_face(lower).unwrap().cycles()[0].halfedges()[0],
            KeyHalfedge::new(shared, false)
        );
        complex.check_invariants().unwrap();
    }

    let copies = ops.unglue_key_edges(&[shared]).unwrap();
    ops.commit();

    assert_eq!(copies[0].len(), 2);
    assert!(!complex.contains(shared));
    let upper_edge = complex.key_face(upper).unwrap().cycles()[0].halfedges()[0].edge;
    let lower_edge = complex.key_face(lower).unwrap().cycles()[0].halfedges()[0].edge;
    assert_ne!(upper_edge, lower_edge);
    assert!(copies[0].contains(&upper_edge) && copies[0].contains(&lower_edge));
    complex.check_invariants().unwrap();
}

#[test]
fn test_glue_closed_edges_of_two_rings() {
    let mut complex = Complex::new();
    let mut ops = Operations::new(&mut complex).unwrap();
    let root = ops.root();
    let ring = |size: f64| {
        vgc_vacomplex::PolylineStroke::closed(
            vec![v(0.0, 0.0), v(size, 0.0), v(size, size), v(0.0, size)],
            1.0,
        )
    };
    let e1 = ops.create_key_closed_edge(Box::new(ring(10.0)), root, None).unwrap();
    let e2 = ops.create_key_closed_edge(Box::new(ring(12.0)), root, None).unwrap();
    let glued = ops
        .glue_key_closed_edges(&[KeyHalfedge::new(e1, true), KeyHalfedge::new(e2, true)], &[0.0, 0.0])
        .unwrap();
    ops.commit();

    assert!(!complex.contains(e1) && !complex.contains(e2));
    let edge = complex.key_edge(glued).unwrap();
    assert!(edge.is_closed());
    assert_eq!(edge.stroke().sample()[1], v(11.0, 0.0));
    complex.check_invariants().unwrap();
}

#[test]
fn test_glue_mismatched_edges_is_rejected() {
    let mut complex = Complex::new();
    let mut ops = Operations::new(&mut complex).unwrap();
    let sq = square(&mut ops, 4.0);
    let root = ops.root();
    let ring = vgc_vacomplex::PolylineStroke::closed(vec![v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)], 1.0);
    let closed = ops.create_key_closed_edge(Box::new(ring), root, None).unwrap();
    let err = ops
        .glue_key_open_edges(&[KeyHalfedge::new(sq.sides[0], true), KeyHalfedge::new(closed, true)])
        .unwrap_err();
    assert!(matches!(err, VacError::WrongCellType { .. } | VacError::InvalidInput(_)));
}

#[test]
fn test_glue_disjoint_open_edges() {
    let mut complex = Complex::new();
    let mut ops = Operations::new(&mut complex).unwrap();
    let e1 = free_edge(&mut ops, v(0.0, 0.0), v(10.0, 0.0));
    let e2 = free_edge(&mut ops, v(0.0, 2.0), v(10.0, 2.0));
    ops.commit();
    let old_vertices: Vec<_> = [e1, e2]
        .iter()
        .flat_map(|e| complex.cell(*e).unwrap().boundary().to_vec())
        .collect();

    let mut ops = Operations::new(&mut complex).unwrap();
    let glued = ops
        .glue_key_open_edges(&[KeyHalfedge::new(e1, true), KeyHalfedge::new(e2, true)])
        .unwrap();
    let diff = ops.commit();

    for id in [e1, e2] {
        assert!(!complex.contains(id));
        assert!(diff.was_destroyed(id) || diff.is_transient(id));
        assert!(!diff.was_created(id));
    }
    for id in old_vertices {
        assert!(!complex.contains(id));
    }
    let edge = complex.key_edge(glued).unwrap();
    let start = edge.start_vertex().unwrap();
    let end = edge.end_vertex().unwrap();
    assert_ne!(start, end);
    assert_eq!(complex.key_vertex_position(start), Some(v(0.0, 1.0)));
    assert_eq!(complex.key_vertex_position(end), Some(v(10.0, 1.0)));
    assert_eq!(complex.cell(glued).unwrap().boundary().len(), 2);
    complex.check_invariants().unwrap();
}
