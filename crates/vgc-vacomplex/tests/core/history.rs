use crate::common::{dump, free_edge, square, v};
use vgc_core::History;
use vgc_vacomplex::{
    Complex, ComplexEdit, CurveParameter, OneCycleCutPolicy, Operations, TwoCycleCutPolicy,
};

/// Runs `f` as one transaction recorded in its own undo group.
fn record<F>(history: &mut History<Complex>, complex: &mut Complex, name: &str, f: F)
where
    F: FnOnce(&mut Operations<'_>),
{
    let group = history.create_undo_group(name).unwrap();
    let edit = transaction(complex, name, f);
    history.push_operation(edit).unwrap();
    history.close_undo_group(group).unwrap();
}

fn transaction<F>(complex: &mut Complex, name: &str, f: F) -> ComplexEdit
where
    F: FnOnce(&mut Operations<'_>),
{
    let mut ops = Operations::new(complex).unwrap();
    f(&mut ops);
    ops.commit_with_undo(name).1
}

#[test]
fn test_undo_redo_restores_identical_states() {
    let mut complex = Complex::new();
    let mut history = History::new(10);
    let empty = dump(&complex);

    let mut face = None;
    let mut diagonal = None;
    record(&mut history, &mut complex, "Draw square", |ops| {
        let sq = square(ops, 10.0);
        let root = ops.root();
        face = Some(sq.face);
        diagonal = Some(
            ops.create_key_open_edge(
                sq.corners[0],
                sq.corners[2],
                crate::common::line(v(0.0, 0.0), v(10.0, 10.0)),
                root,
                None,
            )
            .unwrap(),
        );
    });
    let drawn = dump(&complex);

    record(&mut history, &mut complex, "Split square", |ops| {
        let result = ops
            .cut_glue_face_with_edge(
                face.unwrap(),
                diagonal.unwrap(),
                OneCycleCutPolicy::Auto,
                TwoCycleCutPolicy::Auto,
            )
            .unwrap();
        assert_eq!(result.faces.len(), 2);
    });
    let split = dump(&complex);
    complex.check_invariants().unwrap();

    assert!(history.undo(&mut complex).unwrap());
    assert_eq!(dump(&complex), drawn);
    assert!(history.undo(&mut complex).unwrap());
    assert_eq!(dump(&complex), empty);
    assert!(!history.undo(&mut complex).unwrap());

    assert!(history.redo(&mut complex).unwrap());
    assert_eq!(dump(&complex), drawn);
    assert!(history.redo(&mut complex).unwrap());
    assert_eq!(dump(&complex), split);
    complex.check_invariants().unwrap();
}

#[test]
fn test_undo_emits_ordinary_diffs() {
    let mut complex = Complex::new();
    let mut edge = None;
    let edit = transaction(&mut complex, "Draw", |ops| {
        edge = Some(free_edge(ops, v(0.0, 0.0), v(4.0, 0.0)));
    });
    assert_eq!(edit.num_nodes(), 4);

    let diff = edit.undo_on(&mut complex).unwrap();
    assert_eq!(diff.destroyed_nodes().len(), 3);
    assert!(diff.was_destroyed(edge.unwrap()));
    assert_eq!(complex.num_nodes(), 1);

    let diff = edit.redo_on(&mut complex).unwrap();
    assert_eq!(diff.created_nodes().len(), 3);
    assert!(diff.created_nodes().iter().all(|c| c.source_operation == "redo"));
    complex.check_invariants().unwrap();
}

#[test]
fn test_amend_merges_into_previous_step() {
    let mut complex = Complex::new();
    let mut history = History::new(10);
    let mut edge = None;
    record(&mut history, &mut complex, "Draw", |ops| {
        edge = Some(free_edge(ops, v(0.0, 0.0), v(10.0, 0.0)));
    });
    let start = complex.key_edge(edge.unwrap()).unwrap().start_vertex().unwrap();

    // Dragging a vertex amends the drawing step with every move.
    for x in 1..4 {
        let group = history.create_undo_group("Drag").unwrap();
        let edit = transaction(&mut complex, "Drag", |ops| {
            ops.set_key_vertex_position(start, v(0.0, f64::from(x))).unwrap();
        });
        history.push_operation(edit).unwrap();
        assert!(history.amend_undo_group(group).unwrap());
    }
    assert_eq!(complex.key_vertex_position(start), Some(v(0.0, 3.0)));
    assert_eq!(history.num_levels(), 1);

    assert!(history.undo(&mut complex).unwrap());
    assert_eq!(complex.num_nodes(), 1);
    assert!(history.redo(&mut complex).unwrap());
    assert_eq!(complex.key_vertex_position(start), Some(v(0.0, 3.0)));
    assert_eq!(complex.key_edge(edge.unwrap()).unwrap().stroke().sample()[0], v(0.0, 3.0));
}

#[test]
fn test_pruned_steps_cannot_be_undone() {
    let mut complex = Complex::new();
    let mut history = History::new(2);
    let mut edge = None;
    record(&mut history, &mut complex, "Draw", |ops| {
        edge = Some(free_edge(ops, v(0.0, 0.0), v(9.0, 0.0)));
    });
    let drawn = dump(&complex);
    let mut target = edge.unwrap();
    for _ in 0..2 {
        record(&mut history, &mut complex, "Cut", |ops| {
            let cut = ops.cut_edge(target, &[CurveParameter::new(0, 0.5)]).unwrap();
            assert_eq!(cut.edges.len(), 2);
            target = cut.edges[0];
        });
    }
    assert_eq!(history.num_levels(), 2);

    assert!(history.undo(&mut complex).unwrap());
    assert!(history.undo(&mut complex).unwrap());
    assert_eq!(dump(&complex), drawn);
    assert!(!history.undo(&mut complex).unwrap());
    assert_eq!(dump(&complex), drawn);
}

#[test]
fn test_undo_groups_step_back_in_order() {
    let mut complex = Complex::new();
    let mut history = History::new(10);
    let root_group = history.root();

    let mut v1 = None;
    record(&mut history, &mut complex, "A", |ops| {
        let root = ops.root();
        v1 = Some(ops.create_key_vertex(v(0.0, 0.0), root, None).unwrap());
    });
    let a = history.head();
    let mut v2 = None;
    record(&mut history, &mut complex, "B", |ops| {
        let root = ops.root();
        v2 = Some(ops.create_key_vertex(v(1.0, 0.0), root, None).unwrap());
    });
    let (v1, v2) = (v1.unwrap(), v2.unwrap());

    history.undo(&mut complex).unwrap();
    assert!(complex.contains(v1) && !complex.contains(v2));
    assert_eq!(history.head(), a);
    history.undo(&mut complex).unwrap();
    assert!(!complex.contains(v1));
    assert_eq!(history.head(), root_group);

    history.redo(&mut complex).unwrap();
    history.redo(&mut complex).unwrap();
    assert_eq!(complex.children(complex.root()), vec![v1, v2]);
}
