//! Signal / Connection - single-threaded notification channel
//!
//! fire() снимает snapshot списка handlers до вызова: handler может
//! connect/disconnect внутри fire без RefCell конфликтов. Handler,
//! отключённый во время fire, больше не вызывается.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type Handler<T> = Rc<dyn Fn(&T)>;

struct Slot<T> {
    id: u64,
    connected: Rc<Cell<bool>>,
    handler: Handler<T>,
}

struct SlotList<T> {
    next_id: u64,
    slots: Vec<Slot<T>>,
}

pub struct Signal<T> {
    slots: Rc<RefCell<SlotList<T>>>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self {
            slots: Rc::new(RefCell::new(SlotList {
                next_id: 0,
                slots: Vec::new(),
            })),
        }
    }
}

impl<T: 'static> Signal<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, handler: impl Fn(&T) + 'static) -> Connection {
        let connected = Rc::new(Cell::new(true));

        let id = {
            let mut list = self.slots.borrow_mut();
            let id = list.next_id;
            list.next_id += 1;
            list.slots.push(Slot {
                id,
                connected: connected.clone(),
                handler: Rc::new(handler),
            });
            id
        };

        let weak: Weak<RefCell<SlotList<T>>> = Rc::downgrade(&self.slots);
        Connection::new(connected, move || {
            if let Some(slots) = weak.upgrade() {
                slots.borrow_mut().slots.retain(|slot| slot.id != id);
            }
        })
    }

    pub fn fire(&self, value: &T) {
        let snapshot: Vec<(Rc<Cell<bool>>, Handler<T>)> = self
            .slots
            .borrow()
            .slots
            .iter()
            .map(|slot| (slot.connected.clone(), slot.handler.clone()))
            .collect();

        for (connected, handler) in snapshot {
            if connected.get() {
                handler(value);
            }
        }
    }

    pub fn connection_count(&self) -> usize {
        self.slots.borrow().slots.len()
    }
}

/// Handle подписки. Clone разделяет одно и то же состояние.
#[derive(Clone)]
pub struct Connection {
    connected: Rc<Cell<bool>>,
    detach: Rc<RefCell<Option<Box<dyn FnOnce()>>>>,
}

impl Connection {
    fn new(connected: Rc<Cell<bool>>, detach: impl FnOnce() + 'static) -> Self {
        Self {
            connected,
            detach: Rc::new(RefCell::new(Some(Box::new(detach)))),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    /// Idempotent
    pub fn disconnect(&self) {
        self.connected.set(false);
        let detach = self.detach.borrow_mut().take();
        if let Some(detach) = detach {
            detach();
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.connected.get())
            .finish()
    }
}
