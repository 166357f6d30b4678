//! Registry - индекс активных components одного типа
//!
//! Вставка при bind, удаление только через bin компонента (никаких
//! sweep'ов). BTreeMap по InstanceId → итерация в порядке создания.

use std::cell::RefCell;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::component::Component;
use crate::error::{DeflectError, Result};
use crate::host::InstanceId;
use crate::logger;

pub struct Registry<T> {
    label: &'static str,
    entries: RefCell<BTreeMap<InstanceId, Rc<T>>>,
}

impl<T: Component> Registry<T> {
    pub fn new(label: &'static str) -> Rc<Self> {
        Rc::new(Self {
            label,
            entries: RefCell::new(BTreeMap::new()),
        })
    }

    /// Регистрирует component; unregister кладётся в его bin.
    ///
    /// Один id - один component: дубликат не вытесняет текущий entry,
    /// а уничтожается сам (вне borrow) и возвращается `AlreadyTracked`.
    pub fn register(self: &Rc<Self>, component: &Rc<T>) -> Result<()> {
        let id = component.id();
        let inserted = match self.entries.borrow_mut().entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(component.clone());
                true
            }
        };

        if !inserted {
            component.destroy();
            return Err(DeflectError::AlreadyTracked {
                kind: self.label,
                instance: component.instance().name().to_string(),
            });
        }

        logger::log(&format!(
            "📋 Registered {} {:?} ({})",
            self.label,
            id,
            component.instance().name()
        ));

        let weak = Rc::downgrade(self);
        component.core().keep_fn(move || {
            if let Some(registry) = weak.upgrade() {
                registry.unregister(id);
            }
        });

        Ok(())
    }

    fn unregister(&self, id: InstanceId) {
        // Снятый entry дропается уже после borrow
        let removed = self.entries.borrow_mut().remove(&id);
        if removed.is_some() {
            logger::log(&format!("🗑️ Unregistered {} {:?}", self.label, id));
        }
    }

    pub fn get(&self, id: InstanceId) -> Option<Rc<T>> {
        self.entries.borrow().get(&id).cloned()
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.entries.borrow().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Копия текущих entries: безопасно итерировать, даже если обход
    /// уничтожает components
    pub fn snapshot(&self) -> Vec<Rc<T>> {
        self.entries.borrow().values().cloned().collect()
    }

    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<Rc<T>> {
        self.entries
            .borrow()
            .values()
            .find(|component| predicate(component))
            .cloned()
    }

    pub fn destroy_all(&self) {
        for component in self.snapshot() {
            component.destroy();
        }
    }
}
