//! Tests for ResourceBin.

use super::*;
use crate::host::{Scheduler, Signal};
use std::cell::Cell;

struct CountingObject {
    disposed: Rc<Cell<u32>>,
}

impl Dispose for CountingObject {
    fn dispose(&self) {
        self.disposed.set(self.disposed.get() + 1);
    }
}

#[test]
fn test_dispose_runs_in_insertion_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut bin = ResourceBin::new();

    for label in ["first", "second", "third"] {
        let order = order.clone();
        bin.add_fn(move || order.borrow_mut().push(label));
    }

    bin.dispose();
    assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    assert!(bin.is_empty());
}

#[test]
fn test_dispose_twice_equals_once() {
    let calls = Rc::new(Cell::new(0));
    let objects = Rc::new(Cell::new(0));
    let mut bin = ResourceBin::new();

    let sink = calls.clone();
    bin.add_fn(move || sink.set(sink.get() + 1));
    bin.add_disposable(Disposable::Object(Box::new(CountingObject {
        disposed: objects.clone(),
    })));

    bin.dispose();
    bin.dispose();

    assert_eq!(calls.get(), 1);
    assert_eq!(objects.get(), 1);
}

#[test]
fn test_dispose_empty_bin_is_noop() {
    let mut bin = ResourceBin::new();
    assert!(bin.is_empty());
    bin.dispose();
    assert!(bin.is_empty());
    assert_eq!(bin.len(), 0);
}

#[test]
fn test_each_category_has_its_own_release() {
    let signal = Signal::<()>::new();
    let scheduler = Scheduler::new();
    let fired = Rc::new(Cell::new(0));
    let job_ran = Rc::new(Cell::new(false));
    let mut bin = ResourceBin::new();

    let sink = fired.clone();
    let connection = bin.add(signal.connect(move |_| sink.set(sink.get() + 1)));
    let flag = job_ran.clone();
    let task = bin.add(scheduler.defer(move || flag.set(true)));
    assert_eq!(bin.len(), 2);

    bin.dispose();

    signal.fire(&());
    scheduler.resume_deferred();

    assert!(!connection.is_connected());
    assert!(task.is_cancelled());
    assert_eq!(fired.get(), 0);
    assert!(!job_ran.get());
}

#[test]
fn test_add_all_keeps_batch_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut bin = ResourceBin::new();

    let handles = (0..4).map(|i| {
        let order = order.clone();
        Disposable::callback(move || order.borrow_mut().push(i))
    });
    bin.add_all(handles);
    bin.dispose();

    assert_eq!(*order.borrow(), vec![0, 1, 2, 3]);
}

#[test]
fn test_drop_disposes_remaining_handles() {
    let calls = Rc::new(Cell::new(0));
    {
        let mut bin = ResourceBin::new();
        let sink = calls.clone();
        bin.add_fn(move || sink.set(sink.get() + 1));
    }
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_prune_drops_only_settled_tasks() {
    let scheduler = Scheduler::new();
    let released = Rc::new(Cell::new(0));
    let mut bin = ResourceBin::new();

    let done = bin.add(scheduler.defer(|| {}));
    scheduler.resume_deferred();
    let pending = bin.add(scheduler.defer(|| {}));
    let sink = released.clone();
    bin.add_fn(move || sink.set(sink.get() + 1));
    let dropped = bin.add(scheduler.defer(|| {}));
    dropped.cancel();

    assert_eq!(bin.prune_settled_tasks(), 2);
    assert_eq!(bin.len(), 2);
    assert!(done.is_finished());

    bin.dispose();
    assert!(pending.is_cancelled());
    assert_eq!(released.get(), 1);
    assert_eq!(scheduler.resume_deferred(), 0);
}
