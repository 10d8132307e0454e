use crate::common::{dump, line};
use proptest::prelude::*;
use vgc_core::{Id, Vec2d};
use vgc_vacomplex::{
    Complex, ComplexEdit, CurveParameter, KeyCycle, KeyHalfedge, NodeKind, Operations, VacResult,
};

#[derive(Debug, Clone)]
enum Edit {
    AddVertex(i32, i32),
    AddEdge(usize, usize),
    AddFace(usize),
    Cut(usize, f64),
    Glue(usize, usize),
    Unglue(usize),
    Move(usize, i32, i32),
    Delete(usize, bool),
    UncutVertex(usize),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        3 => (-20..20i32, -20..20i32).prop_map(|(x, y)| Edit::AddVertex(x, y)),
        3 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Edit::AddEdge(a, b)),
        1 => any::<usize>().prop_map(Edit::AddFace),
        2 => (any::<usize>(), 0.1..0.9f64).prop_map(|(e, u)| Edit::Cut(e, u)),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Edit::Glue(a, b)),
        1 => any::<usize>().prop_map(Edit::Unglue),
        1 => (any::<usize>(), -20..20i32, -20..20i32).prop_map(|(i, x, y)| Edit::Move(i, x, y)),
        1 => (any::<usize>(), any::<bool>()).prop_map(|(i, iso)| Edit::Delete(i, iso)),
        1 => any::<usize>().prop_map(Edit::UncutVertex),
    ]
}

fn of_kind(complex: &Complex, kind: NodeKind) -> Vec<Id> {
    complex
        .node_ids()
        .into_iter()
        .filter(|id| complex.node(*id).is_some_and(|n| n.kind() == kind))
        .collect()
}

fn pick(ids: &[Id], index: usize) -> Option<Id> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[index % ids.len()])
    }
}

fn position(complex: &Complex, vertex: Id) -> Vec2d {
    complex.key_vertex_position(vertex).unwrap_or(Vec2d::ZERO)
}

fn apply(ops: &mut Operations<'_>, edit: &Edit) -> VacResult<()> {
    let complex = ops.complex();
    let root = complex.root();
    let vertices = of_kind(complex, NodeKind::KeyVertex);
    let edges = of_kind(complex, NodeKind::KeyEdge);
    let cells: Vec<Id> = complex.node_ids().into_iter().filter(|id| *id != root).collect();
    match *edit {
        Edit::AddVertex(x, y) => {
            ops.create_key_vertex(Vec2d::new(f64::from(x), f64::from(y)), root, None)?;
        }
        Edit::AddEdge(a, b) => {
            if let (Some(a), Some(b)) = (pick(&vertices, a), pick(&vertices, b)) {
                let stroke = line(position(complex, a), position(complex, b));
                ops.create_key_open_edge(a, b, stroke, root, None)?;
            }
        }
        Edit::AddFace(e) => {
            if let Some(e) = pick(&edges, e) {
                let cycle = if complex.key_edge(e).is_some_and(|d| d.is_closed()) {
                    KeyCycle::Halfedges(vec![KeyHalfedge::new(e, true)])
                } else {
                    KeyCycle::Halfedges(vec![KeyHalfedge::new(e, true), KeyHalfedge::new(e, false)])
                };
                ops.create_key_face(vec![cycle], root, None)?;
            }
        }
        Edit::Cut(e, u) => {
            if let Some(e) = pick(&edges, e) {
                ops.cut_edge(e, &[CurveParameter::new(0, u)])?;
            }
        }
        Edit::Glue(a, b) => {
            if let (Some(a), Some(b)) = (pick(&vertices, a), pick(&vertices, b)) {
                let target = position(complex, a);
                ops.glue_key_vertices(&[a, b], target)?;
            }
        }
        Edit::Unglue(a) => {
            if let Some(a) = pick(&vertices, a) {
                ops.unglue_key_vertices(&[a])?;
            }
        }
        Edit::Move(i, x, y) => {
            if let Some(a) = pick(&vertices, i) {
                ops.set_key_vertex_position(a, Vec2d::new(f64::from(x), f64::from(y)))?;
            }
        }
        Edit::Delete(i, isolated) => {
            if let Some(id) = pick(&cells, i) {
                ops.hard_delete(&[id], isolated)?;
            }
        }
        Edit::UncutVertex(i) => {
            if let Some(a) = pick(&vertices, i) {
                ops.uncut_at_key_vertex(a)?;
            }
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn random_edits_keep_boundary_and_star_symmetric(
        edits in prop::collection::vec(edit(), 1..40),
    ) {
        let mut complex = Complex::new();
        let mut states = vec![dump(&complex)];
        let mut recorded: Vec<ComplexEdit> = Vec::new();

        for e in &edits {
            let mut ops = Operations::new(&mut complex).unwrap();
            match apply(&mut ops, e) {
                Ok(()) => {
                    let (_, undo) = ops.commit_with_undo("random edit");
                    recorded.push(undo);
                    states.push(dump(&complex));
                }
                Err(_) => {
                    ops.rollback();
                    prop_assert_eq!(&dump(&complex), states.last().unwrap());
                }
            }
            prop_assert!(complex.check_invariants().is_ok(), "{:?}", complex.check_invariants());
        }

        // Walking the edits back visits every recorded state in reverse.
        while let Some(undo) = recorded.pop() {
            states.pop();
            undo.undo_on(&mut complex).unwrap();
            prop_assert_eq!(&dump(&complex), states.last().unwrap());
            prop_assert!(complex.check_invariants().is_ok());
        }
        prop_assert_eq!(complex.num_nodes(), 1);
    }
}
