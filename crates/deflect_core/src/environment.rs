//! Environment settings, которые зеркалятся в ядро (сейчас только гравитация)

use std::cell::Cell;
use std::rc::Rc;

use crate::cleanup::ResourceBin;
use crate::host::InstanceRef;
use crate::logger;

/// Значение по умолчанию, если окружение не выставило атрибут
pub const DEFAULT_GRAVITY: f32 = 9.81;

/// Process-wide gravity scalar. Обновляется на каждую notification,
/// солвер читает его при каждом вызове.
#[derive(Clone, Debug)]
pub struct Gravity(Rc<Cell<f32>>);

impl Default for Gravity {
    fn default() -> Self {
        Self(Rc::new(Cell::new(DEFAULT_GRAVITY)))
    }
}

impl Gravity {
    pub fn get(&self) -> f32 {
        self.0.get()
    }

    /// Подписка на атрибут `attribute` у `root`. Неверный тип - warning,
    /// значение не меняется.
    pub fn bind(root: &InstanceRef, attribute: &str, bin: &mut ResourceBin) -> Self {
        let gravity = Gravity::default();
        gravity.read_from(root, attribute);

        let handler_gravity = gravity.clone();
        let weak_root = Rc::downgrade(root);
        let attribute = attribute.to_string();
        bin.add(root.attribute_changed.connect(move |changed: &String| {
            if *changed != attribute {
                return;
            }
            if let Some(root) = weak_root.upgrade() {
                handler_gravity.read_from(&root, &attribute);
            }
        }));

        gravity
    }

    fn read_from(&self, root: &InstanceRef, attribute: &str) {
        match root.attribute_as::<f64>(attribute) {
            Ok(Some(value)) => {
                self.0.set(value as f32);
                logger::log(&format!("🌍 Gravity = {}", value));
            }
            Ok(None) => {}
            Err(err) => logger::log_warning(&format!("⚠️ Gravity ignored: {}", err)),
        }
    }
}
