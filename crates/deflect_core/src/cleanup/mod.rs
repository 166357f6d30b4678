//! ResourceBin - упорядоченный контейнер cleanup handles
//!
//! Каждый component владеет одним bin. Всё, что живёт ровно столько же,
//! сколько component (подписки, deferred tasks, unregister callbacks,
//! дочерние components), кладётся сюда и освобождается одним `dispose()`.
//!
//! Инварианты:
//! - FIFO: handles освобождаются в порядке добавления
//! - каждый handle освобождается не больше одного раза
//! - после `dispose()` bin пуст, повторный `dispose()` - no-op

use std::cell::RefCell;
use std::rc::Rc;

use crate::host::{Connection, TaskHandle};

/// Объект с собственной процедурой освобождения (components и т.п.)
pub trait Dispose {
    fn dispose(&self);
}

/// Закрытый набор категорий handles, по одному поведению на вариант
pub enum Disposable {
    /// Вызвать
    Callback(Box<dyn FnOnce()>),
    /// Отписаться
    Connection(Connection),
    /// Отменить deferred job
    Task(TaskHandle),
    /// Вызвать `Dispose::dispose`
    Object(Box<dyn Dispose>),
}

impl Disposable {
    pub fn callback(f: impl FnOnce() + 'static) -> Self {
        Disposable::Callback(Box::new(f))
    }

    pub fn dispose(self) {
        match self {
            Disposable::Callback(f) => f(),
            Disposable::Connection(connection) => connection.disconnect(),
            Disposable::Task(task) => task.cancel(),
            Disposable::Object(object) => object.dispose(),
        }
    }
}

impl From<Connection> for Disposable {
    fn from(connection: Connection) -> Self {
        Disposable::Connection(connection)
    }
}

impl From<TaskHandle> for Disposable {
    fn from(task: TaskHandle) -> Self {
        Disposable::Task(task)
    }
}

impl std::fmt::Debug for Disposable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Disposable::Callback(_) => "Callback",
            Disposable::Connection(_) => "Connection",
            Disposable::Task(_) => "Task",
            Disposable::Object(_) => "Object",
        };
        f.write_str(tag)
    }
}

#[derive(Default, Debug)]
pub struct ResourceBin {
    handles: Vec<Disposable>,
}

/// Bin, в который пишут callbacks (session-level bindings)
pub type SharedBin = Rc<RefCell<ResourceBin>>;

impl ResourceBin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавляет handle в хвост и возвращает его же
    pub fn add<H>(&mut self, handle: H) -> H
    where
        H: Clone + Into<Disposable>,
    {
        self.handles.push(handle.clone().into());
        handle
    }

    pub fn add_fn(&mut self, f: impl FnOnce() + 'static) {
        self.handles.push(Disposable::callback(f));
    }

    pub fn add_disposable(&mut self, disposable: Disposable) {
        self.handles.push(disposable);
    }

    pub fn add_all(&mut self, handles: impl IntoIterator<Item = Disposable>) {
        self.handles.extend(handles);
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Выкидывает task handles, которым больше нечего отменять (job уже
    /// запущен или отменён). Остальные handles сохраняют порядок.
    pub fn prune_settled_tasks(&mut self) -> usize {
        let before = self.handles.len();
        self.handles.retain(|handle| {
            !matches!(handle, Disposable::Task(task) if task.is_finished() || task.is_cancelled())
        });
        before - self.handles.len()
    }

    /// Забирает список целиком; handles, добавленные во время обхода,
    /// попадают в уже пустой bin и ждут следующего `dispose()`.
    pub fn dispose(&mut self) {
        let handles = std::mem::take(&mut self.handles);
        for handle in handles {
            handle.dispose();
        }
    }
}

impl Drop for ResourceBin {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod bin_tests;
