use std::cell::RefCell;
use std::rc::Rc;
use vgc_core::{ClosureOperation, History, HistoryError, UndoGroupId, UndoOperation};

type Doc = Vec<String>;

fn append(history: &mut History<Doc>, doc: &mut Doc, text: &str) {
    doc.push(text.to_string());
    let redo_text = text.to_string();
    history
        .push_operation(ClosureOperation::new(
            format!("append {text}"),
            |d: &mut Doc| {
                d.pop();
            },
            move |d: &mut Doc| d.push(redo_text.clone()),
        ))
        .unwrap();
}

fn commit(history: &mut History<Doc>, doc: &mut Doc, text: &str) -> UndoGroupId {
    let group = history.create_undo_group(text).unwrap();
    append(history, doc, text);
    history.close_undo_group(group).unwrap();
    group
}

struct Failing;

impl UndoOperation<Doc> for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn undo(&mut self, _target: &mut Doc) -> anyhow::Result<()> {
        anyhow::bail!("cannot revert")
    }

    fn redo(&mut self, _target: &mut Doc) -> anyhow::Result<()> {
        Ok(())
    }
}

#[test]
fn test_new_history_is_empty() {
    let history: History<Doc> = History::new(50);
    assert_eq!(history.head(), history.root());
    assert!(!history.can_undo());
    assert!(!history.can_redo());
    assert_eq!(history.num_levels(), 0);
    assert_eq!(history.num_nodes(), 0);
}

#[test]
fn test_undo_redo_linear() {
    let mut history = History::new(50);
    let mut doc = Doc::new();
    let a = commit(&mut history, &mut doc, "A");
    let b = commit(&mut history, &mut doc, "B");
    assert_eq!(history.head(), b);

    assert!(history.undo(&mut doc).unwrap());
    assert_eq!(doc, vec!["A"]);
    assert_eq!(history.head(), a);
    assert!(history.group(b).unwrap().is_undone());

    assert!(history.undo(&mut doc).unwrap());
    assert!(doc.is_empty());
    assert_eq!(history.head(), history.root());
    assert!(!history.undo(&mut doc).unwrap());

    assert!(history.redo(&mut doc).unwrap());
    assert!(history.redo(&mut doc).unwrap());
    assert_eq!(doc, vec!["A", "B"]);
    assert_eq!(history.head(), b);
    assert!(!history.redo(&mut doc).unwrap());
}

#[test]
fn test_operations_undone_in_reverse_order() {
    let mut history = History::new(50);
    let mut doc = Doc::new();
    let group = history.create_undo_group("two").unwrap();
    append(&mut history, &mut doc, "x");
    append(&mut history, &mut doc, "y");
    history.close_undo_group(group).unwrap();
    assert_eq!(history.group(group).unwrap().num_operations(), 2);

    history.undo(&mut doc).unwrap();
    assert!(doc.is_empty());
    history.redo(&mut doc).unwrap();
    assert_eq!(doc, vec!["x", "y"]);
}

#[test]
fn test_new_edit_after_undo_creates_branch() {
    let mut history = History::new(50);
    let mut doc = Doc::new();
    let a = commit(&mut history, &mut doc, "A");
    let b = commit(&mut history, &mut doc, "B");
    history.undo(&mut doc).unwrap();
    let c = commit(&mut history, &mut doc, "C");

    let children = history.group(a).unwrap().children().to_vec();
    assert_eq!(children, vec![c, b]);
    assert_eq!(history.group(a).unwrap().main_child(), Some(c));
    assert_eq!(doc, vec!["A", "C"]);

    history.undo(&mut doc).unwrap();
    history.redo(&mut doc).unwrap();
    assert_eq!(doc, vec!["A", "C"]);
}

#[test]
fn test_go_to_switches_branch() {
    let mut history = History::new(50);
    let mut doc = Doc::new();
    let a = commit(&mut history, &mut doc, "A");
    let b = commit(&mut history, &mut doc, "B");
    history.undo(&mut doc).unwrap();
    let c = commit(&mut history, &mut doc, "C");

    history.go_to(b, &mut doc).unwrap();
    assert_eq!(doc, vec!["A", "B"]);
    assert_eq!(history.head(), b);
    assert_eq!(history.group(a).unwrap().main_child(), Some(b));
    assert!(history.group(c).unwrap().is_undone());

    history.go_to(history.root(), &mut doc).unwrap();
    assert!(doc.is_empty());
    history.redo(&mut doc).unwrap();
    history.redo(&mut doc).unwrap();
    assert_eq!(doc, vec!["A", "B"]);
}

#[test]
fn test_nested_groups_hoist_into_outer() {
    let mut history = History::new(50);
    let mut doc = Doc::new();
    let outer = history.create_undo_group("outer").unwrap();
    let inner1 = history.create_undo_group("inner1").unwrap();
    append(&mut history, &mut doc, "1");
    history.close_undo_group(inner1).unwrap();
    let inner2 = history.create_undo_group("inner2").unwrap();
    append(&mut history, &mut doc, "2");
    history.close_undo_group(inner2).unwrap();
    assert_eq!(history.num_nodes(), 0);

    history.close_undo_group(outer).unwrap();
    assert_eq!(history.head(), outer);
    assert!(!history.contains(inner1));
    assert!(!history.contains(inner2));
    assert_eq!(history.group(outer).unwrap().num_operations(), 2);
    assert_eq!(history.num_nodes(), 1);
    assert_eq!(history.num_levels(), 1);

    history.undo(&mut doc).unwrap();
    assert!(doc.is_empty());
}

#[test]
fn test_cannot_nest_under_group_with_operations() {
    let mut history = History::new(50);
    let mut doc = Doc::new();
    let group = history.create_undo_group("busy").unwrap();
    append(&mut history, &mut doc, "x");
    let err = history.create_undo_group("nested").unwrap_err();
    assert_eq!(err, HistoryError::NestedInNonEmptyGroup { parent: group });
}

#[test]
fn test_close_requires_innermost_open_group() {
    let mut history: History<Doc> = History::new(50);
    let outer = history.create_undo_group("outer").unwrap();
    let inner = history.create_undo_group("inner").unwrap();
    let err = history.close_undo_group(outer).unwrap_err();
    assert_eq!(
        err,
        HistoryError::NotFirstOpenGroup {
            group: outer,
            innermost: inner
        }
    );
    history.close_undo_group(inner).unwrap();
    assert_eq!(
        history.close_undo_group(inner).unwrap_err(),
        HistoryError::GroupNotOpen(inner)
    );
    history.close_undo_group(outer).unwrap();
}

#[test]
fn test_push_without_open_group_fails() {
    let mut history: History<Doc> = History::new(50);
    let err = history
        .push_operation(ClosureOperation::new("noop", |_: &mut Doc| {}, |_: &mut Doc| {}))
        .unwrap_err();
    assert!(matches!(err, HistoryError::NoOpenGroup(_)));
}

#[test]
fn test_amend_merges_into_previous_step() {
    let mut history = History::new(50);
    let mut doc = Doc::new();
    let g = commit(&mut history, &mut doc, "A");
    let h = history.create_undo_group("B").unwrap();
    append(&mut history, &mut doc, "B");
    assert!(history.amend_undo_group(h).unwrap());

    assert_eq!(history.head(), g);
    assert!(!history.contains(h));
    assert_eq!(history.num_levels(), 1);
    assert_eq!(history.num_nodes(), 1);

    history.undo(&mut doc).unwrap();
    assert!(doc.is_empty());
    assert_eq!(history.head(), history.root());
}

#[test]
fn test_amend_degrades_to_close_when_branch_exists() {
    let mut history = History::new(50);
    let mut doc = Doc::new();
    let a = commit(&mut history, &mut doc, "A");
    commit(&mut history, &mut doc, "B");
    history.undo(&mut doc).unwrap();

    let c = history.create_undo_group("C").unwrap();
    append(&mut history, &mut doc, "C");
    assert!(!history.amend_undo_group(c).unwrap());
    assert_eq!(history.head(), c);
    assert_eq!(history.group(a).unwrap().children().len(), 2);
}

#[test]
fn test_amend_into_root_degrades_to_close() {
    let mut history = History::new(50);
    let mut doc = Doc::new();
    let g = history.create_undo_group("first").unwrap();
    append(&mut history, &mut doc, "x");
    assert!(!history.amend_undo_group(g).unwrap());
    assert_eq!(history.head(), g);
    assert_eq!(history.num_levels(), 1);
}

#[test]
fn test_abort_discards_open_groups() {
    let mut history = History::new(50);
    let mut doc = Doc::new();
    let a = commit(&mut history, &mut doc, "A");
    let outer = history.create_undo_group("drag").unwrap();
    let inner = history.create_undo_group("step").unwrap();
    append(&mut history, &mut doc, "moved");
    history.close_undo_group(inner).unwrap();

    assert!(history.abort(&mut doc).unwrap());
    assert_eq!(doc, vec!["A"]);
    assert_eq!(history.head(), a);
    assert!(!history.contains(outer));
    assert!(!history.has_open_groups());
    assert_eq!(history.num_nodes(), 1);
    assert!(!history.abort(&mut doc).unwrap());
}

#[test]
fn test_undo_with_open_group_undoes_it_whole() {
    let mut history = History::new(50);
    let mut doc = Doc::new();
    let a = commit(&mut history, &mut doc, "A");
    let open = history.create_undo_group("in progress").unwrap();
    append(&mut history, &mut doc, "x");
    append(&mut history, &mut doc, "y");

    assert!(history.undo(&mut doc).unwrap());
    assert_eq!(doc, vec!["A"]);
    assert_eq!(history.head(), a);
    assert!(!history.group(open).unwrap().is_open());
    assert!(history.group(open).unwrap().is_undone());
}

#[test]
fn test_redo_with_open_group_is_rejected() {
    let mut history = History::new(50);
    let mut doc = Doc::new();
    commit(&mut history, &mut doc, "A");
    history.undo(&mut doc).unwrap();
    history.create_undo_group("open").unwrap();
    assert_eq!(
        history.redo(&mut doc).unwrap_err(),
        HistoryError::OpenGroupsPending("redo")
    );
}

#[test]
fn test_pruning_keeps_reachable_chain() {
    let mut history = History::new(3);
    let mut doc = Doc::new();
    let mut groups = Vec::new();
    for i in 0..6 {
        groups.push(commit(&mut history, &mut doc, &i.to_string()));
    }
    assert_eq!(history.num_levels(), 3);
    assert_eq!(history.num_nodes(), 3);
    assert_eq!(history.root(), groups[2]);

    let mut undone = 0;
    while history.undo(&mut doc).unwrap() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert_eq!(doc, vec!["0", "1", "2"]);
    assert_eq!(history.head(), history.root());
}

#[test]
fn test_node_budget_evicts_undone_branches() {
    let mut history = History::new(2);
    let mut doc = Doc::new();
    let a = commit(&mut history, &mut doc, "A");
    // Each round leaves an undone leaf under `a`.
    for i in 0..10 {
        commit(&mut history, &mut doc, &format!("b{i}"));
        history.undo(&mut doc).unwrap();
    }
    assert!(history.num_nodes() <= 4 * history.max_levels());
    assert_eq!(history.head(), a);
    assert!(!history.group(a).unwrap().is_undone());

    history.undo(&mut doc).unwrap();
    assert!(doc.is_empty());
}

#[test]
fn test_set_max_levels_prunes_immediately() {
    let mut history = History::new(10);
    let mut doc = Doc::new();
    for i in 0..5 {
        commit(&mut history, &mut doc, &i.to_string());
    }
    history.set_max_levels(2);
    assert_eq!(history.num_levels(), 2);
    assert_eq!(history.num_nodes(), 2);
}

#[test]
fn test_failed_operation_reports_error() {
    let mut history = History::new(10);
    let mut doc = Doc::new();
    let group = history.create_undo_group("bad").unwrap();
    history.push_operation(Failing).unwrap();
    history.close_undo_group(group).unwrap();

    let err = history.undo(&mut doc).unwrap_err();
    assert!(matches!(err, HistoryError::OperationFailed { ref name, .. } if name == "failing"));
    assert!(!history.is_undo_or_redo_in_progress());
    assert_eq!(history.head(), group);
}

#[test]
fn test_signals_report_traversal() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut history = History::new(10);
    let mut doc = Doc::new();
    let a = commit(&mut history, &mut doc, "A");

    let l = log.clone();
    history
        .about_to_undo
        .connect(move |id| l.borrow_mut().push(format!("about_to_undo {id}")));
    let l = log.clone();
    history
        .undone
        .connect(move |id| l.borrow_mut().push(format!("undone {id}")));
    let l = log.clone();
    history
        .redone
        .connect(move |id| l.borrow_mut().push(format!("redone {id}")));
    let l = log.clone();
    history
        .head_changed
        .connect(move |id| l.borrow_mut().push(format!("head {id}")));

    history.undo(&mut doc).unwrap();
    history.redo(&mut doc).unwrap();

    let root = history.root();
    assert_eq!(
        *log.borrow(),
        vec![
            format!("about_to_undo {a}"),
            format!("undone {a}"),
            format!("head {root}"),
            format!("redone {a}"),
            format!("head {a}"),
        ]
    );
}
