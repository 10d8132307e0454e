use std::cell::Cell;
use std::rc::Rc;
use vgc_core::Signal;

#[test]
fn test_disconnected_handler_is_not_called() {
    let hits = Rc::new(Cell::new(0));
    let mut signal: Signal<()> = Signal::new();

    let h = hits.clone();
    let id = signal.connect(move |_| h.set(h.get() + 1));
    signal.emit(&());
    signal.disconnect(id);
    signal.emit(&());

    assert_eq!(hits.get(), 1);
}

#[test]
fn test_handlers_can_accumulate_state() {
    let total = Rc::new(Cell::new(0));
    let mut signal: Signal<i32> = Signal::new();
    let t = total.clone();
    signal.connect(move |v| t.set(t.get() + v));

    for v in 1..=4 {
        signal.emit(&v);
    }
    assert_eq!(total.get(), 10);
}
