//! Host boundary - дерево внешних объектов окружения
//!
//! Ядро не владеет симуляцией: объекты создаёт/удаляет host (transport,
//! sandbox, тесты). Здесь только то, что ядро читает и на что
//! подписывается: иерархия, атрибуты, кинематика, lifecycle signals.
//!
//! Все объекты живут в одном потоке (heartbeat callback), отсюда `Rc`/`RefCell`.

mod scheduler;
mod signal;

pub use scheduler::{Scheduler, TaskHandle};
pub use signal::{Connection, Signal};

use bevy::math::Vec3;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{DeflectError, Result};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id, растёт монотонно (порядок = порядок создания)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u64);

impl InstanceId {
    fn next() -> Self {
        Self(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub type InstanceRef = Rc<Instance>;

/// Loosely-typed значение атрибута, как его присылает окружение
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    Text(String),
    Number(f64),
}

impl AttributeValue {
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Bool(_) => "bool",
            AttributeValue::Text(_) => "text",
            AttributeValue::Number(_) => "number",
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

/// Объявленный тип атрибута. Значение другого kind → ошибка, без приведения.
pub trait FromAttribute: Sized {
    const KIND: &'static str;

    fn from_attribute(value: &AttributeValue) -> Option<Self>;
}

impl FromAttribute for bool {
    const KIND: &'static str = "bool";

    fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromAttribute for String {
    const KIND: &'static str = "text";

    fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromAttribute for f64 {
    const KIND: &'static str = "number";

    fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}

/// Кинематика объекта в world space.
///
/// `acceleration: None` - объект не сообщает своё ускорение (ядро
/// подставит гравитацию окружения).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Kinematics {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Option<Vec3>,
}

impl Kinematics {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn moving(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            velocity,
            acceleration: None,
        }
    }

    pub fn with_acceleration(mut self, acceleration: Vec3) -> Self {
        self.acceleration = Some(acceleration);
        self
    }
}

/// Внешний объект окружения.
///
/// Все объекты имеют одинаковую форму (как в host-движке): player-only
/// поля (`character`) и character-only поля (`health`) просто не
/// используются у остальных.
pub struct Instance {
    id: InstanceId,
    class_name: String,
    name: String,
    parent: RefCell<Weak<Instance>>,
    children: RefCell<Vec<InstanceRef>>,
    attributes: RefCell<HashMap<String, AttributeValue>>,
    kinematics: Cell<Kinematics>,
    health: Cell<f32>,
    character: RefCell<Option<InstanceRef>>,
    destroyed: Cell<bool>,

    pub child_added: Signal<InstanceRef>,
    pub destroying: Signal<()>,
    /// Payload - имя изменённого атрибута
    pub attribute_changed: Signal<String>,
    pub character_added: Signal<InstanceRef>,
    pub character_removing: Signal<InstanceRef>,
    pub died: Signal<()>,
}

impl Instance {
    pub fn new(class_name: impl Into<String>, name: impl Into<String>) -> InstanceRef {
        Rc::new(Self {
            id: InstanceId::next(),
            class_name: class_name.into(),
            name: name.into(),
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            attributes: RefCell::new(HashMap::new()),
            kinematics: Cell::new(Kinematics::default()),
            health: Cell::new(100.0),
            character: RefCell::new(None),
            destroyed: Cell::new(false),
            child_added: Signal::new(),
            destroying: Signal::new(),
            attribute_changed: Signal::new(),
            character_added: Signal::new(),
            character_removing: Signal::new(),
            died: Signal::new(),
        })
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    pub fn parent(&self) -> Option<InstanceRef> {
        self.parent.borrow().upgrade()
    }

    pub fn children(&self) -> Vec<InstanceRef> {
        self.children.borrow().clone()
    }

    pub fn find_first_child(&self, name: &str) -> Option<InstanceRef> {
        self.children
            .borrow()
            .iter()
            .find(|child| child.name() == name)
            .cloned()
    }

    /// Переносит объект под `parent` и сообщает об этом `parent.child_added`
    pub fn set_parent(self: &Rc<Self>, parent: &InstanceRef) {
        if self.is_destroyed() || parent.is_destroyed() {
            return;
        }
        self.detach_from_parent();
        *self.parent.borrow_mut() = Rc::downgrade(parent);
        parent.children.borrow_mut().push(self.clone());
        parent.child_added.fire(self);
    }

    fn detach_from_parent(&self) {
        let old_parent = self.parent.replace(Weak::new()).upgrade();
        if let Some(old_parent) = old_parent {
            old_parent
                .children
                .borrow_mut()
                .retain(|child| child.id != self.id);
        }
    }

    /// `destroying` стреляет первым (подписчики видят объект целым),
    /// потом рекурсивно потомки, потом отцепление от parent. Повторный
    /// вызов - no-op.
    pub fn destroy(self: &Rc<Self>) {
        if self.destroyed.replace(true) {
            return;
        }

        self.destroying.fire(&());

        for child in self.children() {
            child.destroy();
        }

        self.detach_from_parent();
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        self.attributes.borrow().get(name).cloned()
    }

    /// `Ok(None)` - атрибута нет; `Err` - есть, но другого типа
    pub fn attribute_as<T: FromAttribute>(&self, name: &str) -> Result<Option<T>> {
        let Some(value) = self.attribute(name) else {
            return Ok(None);
        };

        T::from_attribute(&value)
            .map(Some)
            .ok_or_else(|| DeflectError::AttributeType {
                attribute: name.to_string(),
                expected: T::KIND,
                found: value.kind(),
            })
    }

    /// Notification только при реальном изменении значения
    pub fn set_attribute(&self, name: &str, value: impl Into<AttributeValue>) {
        let value = value.into();
        let previous = self
            .attributes
            .borrow_mut()
            .insert(name.to_string(), value.clone());

        if previous.as_ref() != Some(&value) {
            self.attribute_changed.fire(&name.to_string());
        }
    }

    pub fn kinematics(&self) -> Kinematics {
        self.kinematics.get()
    }

    pub fn set_kinematics(&self, kinematics: Kinematics) {
        self.kinematics.set(kinematics);
    }

    pub fn health(&self) -> f32 {
        self.health.get()
    }

    /// `died` стреляет один раз - на переходе через ноль
    pub fn set_health(&self, health: f32) {
        let previous = self.health.replace(health);
        if previous > 0.0 && health <= 0.0 {
            self.died.fire(&());
        }
    }

    pub fn character(&self) -> Option<InstanceRef> {
        self.character.borrow().clone()
    }

    /// Respawn: `character_removing(old)` → замена → `character_added(new)`
    pub fn set_character(&self, character: Option<InstanceRef>) {
        let old = self.character.borrow_mut().take();
        if let Some(old) = old {
            self.character_removing.fire(&old);
        }

        *self.character.borrow_mut() = character.clone();

        if let Some(new) = character {
            self.character_added.fire(&new);
        }
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("class_name", &self.class_name)
            .field("name", &self.name)
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}
