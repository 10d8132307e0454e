use proptest::prelude::*;
use vgc_core::{ClosureOperation, History};

#[derive(Debug, Clone)]
enum Step {
    Commit(i32),
    Undo,
    Redo,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..100i32).prop_map(Step::Commit),
        Just(Step::Undo),
        Just(Step::Redo),
    ]
}

proptest! {
    #[test]
    fn history_matches_linear_model(
        steps in prop::collection::vec(step(), 0..60),
        max_levels in 1usize..6,
    ) {
        let mut history: History<Vec<i32>> = History::new(max_levels);
        let mut doc = Vec::new();
        // Entries below `floor` were pruned and can no longer be undone.
        let mut floor = 0usize;
        let mut redo_depth = 0usize;

        for s in steps {
            match s {
                Step::Commit(v) => {
                    let g = history.create_undo_group("commit").unwrap();
                    doc.push(v);
                    history.push_operation(ClosureOperation::new(
                        "push",
                        |d: &mut Vec<i32>| {
                            d.pop();
                        },
                        move |d: &mut Vec<i32>| d.push(v),
                    )).unwrap();
                    history.close_undo_group(g).unwrap();
                    redo_depth = 0;
                    if doc.len() - floor > max_levels {
                        floor = doc.len() - max_levels;
                    }
                }
                Step::Undo => {
                    let before = doc.len();
                    let did = history.undo(&mut doc).unwrap();
                    prop_assert_eq!(did, before > floor);
                    if did {
                        redo_depth += 1;
                    }
                }
                Step::Redo => {
                    let did = history.redo(&mut doc).unwrap();
                    prop_assert_eq!(did, redo_depth > 0);
                    if did {
                        redo_depth -= 1;
                    }
                }
            }
            prop_assert!(doc.len() >= floor);
            prop_assert_eq!(history.num_levels(), doc.len() - floor);
            prop_assert!(history.num_nodes() <= 4 * max_levels);
        }
    }
}
