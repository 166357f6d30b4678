//! Component - disposable behavior unit, привязанный к одному host-объекту
//!
//! Lifecycle:
//! 1. bind: вычисляем cached поля (может упасть → ничего не зарегистрировано)
//! 2. подписки через bin + `destroying` → self-destroy
//! 3. register (unregister кладётся в тот же bin)
//!
//! `destroy()` идемпотентен: его зовут и `destroying` signal, и parent cascade.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::cleanup::{Dispose, Disposable, ResourceBin};
use crate::host::{InstanceId, InstanceRef};

pub struct ComponentCore {
    instance: InstanceRef,
    bin: RefCell<ResourceBin>,
    destroyed: Cell<bool>,
}

impl ComponentCore {
    pub fn new(instance: &InstanceRef) -> Self {
        Self {
            instance: instance.clone(),
            bin: RefCell::new(ResourceBin::new()),
            destroyed: Cell::new(false),
        }
    }

    pub fn instance(&self) -> &InstanceRef {
        &self.instance
    }

    /// Кладёт handle в bin. После destroy handle освобождается сразу -
    /// подписка на мёртвый component не переживёт вызов.
    pub fn keep(&self, handle: impl Into<Disposable>) {
        let handle = handle.into();
        if self.destroyed.get() {
            handle.dispose();
            return;
        }
        self.bin.borrow_mut().add_disposable(handle);
    }

    pub fn keep_fn(&self, f: impl FnOnce() + 'static) {
        self.keep(Disposable::callback(f));
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        // Bin вынимаем до dispose: handles могут снова дёрнуть destroy()
        let mut bin = self.bin.take();
        bin.dispose();
    }
}

pub trait Component: 'static {
    fn core(&self) -> &ComponentCore;

    fn instance(&self) -> &InstanceRef {
        self.core().instance()
    }

    fn id(&self) -> InstanceId {
        self.core().instance().id()
    }

    fn destroy(&self) {
        self.core().destroy();
    }

    fn is_destroyed(&self) -> bool {
        self.core().is_destroyed()
    }
}

impl<T: Component> Dispose for Rc<T> {
    fn dispose(&self) {
        self.destroy();
    }
}

/// Подписывает component на `destroying` своего объекта
pub fn destroy_on_destroying<C: Component>(component: &Rc<C>) {
    let weak = Rc::downgrade(component);
    let connection = component.instance().destroying.connect(move |_| {
        if let Some(component) = weak.upgrade() {
            component.destroy();
        }
    });
    component.core().keep(connection);
}
