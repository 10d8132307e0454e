use crate::common::{dump, free_edge, square, v};
use vgc_vacomplex::{Complex, NodeKind, Operations};

#[test]
fn test_grid_of_strokes_meets_at_four_vertices() {
    let mut complex = Complex::new();
    let mut ops = Operations::new(&mut complex).unwrap();
    let root = ops.root();
    let strokes = [
        free_edge(&mut ops, v(0.0, 3.0), v(9.0, 3.0)),
        free_edge(&mut ops, v(0.0, 6.0), v(9.0, 6.0)),
        free_edge(&mut ops, v(3.0, 0.0), v(3.0, 9.0)),
        free_edge(&mut ops, v(6.0, 0.0), v(6.0, 9.0)),
    ];
    let result = ops.intersect_with_group(&strokes, root, false).unwrap();
    ops.commit();

    assert_eq!(result.vertices.len(), 4);
    assert_eq!(result.edges.len(), 12);
    let mut positions: Vec<(i64, i64)> = result
        .vertices
        .iter()
        .map(|id| {
            let p = complex.key_vertex_position(*id).unwrap();
            (p.x.round() as i64, p.y.round() as i64)
        })
        .collect();
    positions.sort();
    assert_eq!(positions, vec![(3, 3), (3, 6), (6, 3), (6, 6)]);
    for id in &result.vertices {
        assert_eq!(complex.cell(*id).unwrap().star().len(), 4);
    }
    for stroke in strokes {
        assert!(!complex.contains(stroke));
    }
    complex.check_invariants().unwrap();
}

#[test]
fn test_other_groups_are_not_intersected() {
    let mut complex = Complex::new();
    let mut ops = Operations::new(&mut complex).unwrap();
    let root = ops.root();
    let layer = ops.create_group(root, None).unwrap();
    let a = ops.create_key_vertex(v(5.0, -5.0), layer, None).unwrap();
    let b = ops.create_key_vertex(v(5.0, 5.0), layer, None).unwrap();
    let hidden = ops
        .create_key_open_edge(a, b, crate::common::line(v(5.0, -5.0), v(5.0, 5.0)), layer, None)
        .unwrap();
    let stroke = free_edge(&mut ops, v(0.0, 0.0), v(10.0, 0.0));
    let result = ops.intersect_with_group(&[stroke], root, true).unwrap();
    ops.commit();

    assert!(result.vertices.is_empty());
    assert_eq!(result.edges, vec![stroke]);
    assert!(complex.contains(hidden));
}

#[test]
fn test_intersection_is_one_undoable_step() {
    let mut complex = Complex::new();
    let mut ops = Operations::new(&mut complex).unwrap();
    let sq = square(&mut ops, 10.0);
    ops.commit();
    let before = dump(&complex);

    let mut ops = Operations::new(&mut complex).unwrap();
    let root = ops.root();
    let stroke = free_edge(&mut ops, v(5.0, -5.0), v(5.0, 15.0));
    let result = ops.intersect_with_group(&[stroke], root, true).unwrap();
    let (diff, edit) = ops.commit_with_undo("Draw across");

    assert_eq!(result.faces.len(), 2);
    assert!(diff.was_destroyed(sq.face));
    assert!(diff.was_destroyed(sq.sides[0]) && diff.was_destroyed(sq.sides[2]));
    let faces: Vec<_> = complex
        .node_ids()
        .into_iter()
        .filter(|id| complex.node(*id).is_some_and(|n| n.kind() == NodeKind::KeyFace))
        .collect();
    assert_eq!(faces.len(), 2);
    complex.check_invariants().unwrap();

    edit.undo_on(&mut complex).unwrap();
    assert_eq!(dump(&complex), before);
    complex.check_invariants().unwrap();
}
