//! ProjectileTracker - projectile-like объект под наблюдением
//!
//! Cached state (`live`, `target`) пересчитывается одним handler'ом на
//! attribute_changed. Любой пересчёт сбрасывает debounce (`hit`).
//! Кинематика не кэшируется - читается из объекта в момент оценки.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::component::{destroy_on_destroying, Component, ComponentCore};
use super::{Registry, Tracker, Trackers, TrackingContext};
use crate::config::WorldNames;
use crate::error::Result;
use crate::host::{InstanceRef, Kinematics};
use crate::logger;

pub struct ProjectileTracker {
    core: ComponentCore,
    live: Cell<bool>,
    target: RefCell<String>,
    /// Debounce: действие уже выполнено против этого projectile
    hit: Cell<bool>,
}

impl Component for ProjectileTracker {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
}

impl Tracker for ProjectileTracker {
    const KIND: &'static str = "projectile";

    fn registry(trackers: &Trackers) -> &Rc<Registry<Self>> {
        &trackers.projectiles
    }

    fn bind(instance: &InstanceRef, ctx: &TrackingContext) -> Result<Rc<Self>> {
        let projectile = Rc::new(Self {
            core: ComponentCore::new(instance),
            live: Cell::new(false),
            target: RefCell::new(String::new()),
            hit: Cell::new(false),
        });

        let trackers = Rc::downgrade(&ctx.trackers);
        projectile.refresh(&ctx.names, &trackers);

        destroy_on_destroying(&projectile);

        let weak = Rc::downgrade(&projectile);
        let names = ctx.names.clone();
        let handler_trackers = trackers.clone();
        projectile
            .core
            .keep(instance.attribute_changed.connect(move |attribute: &String| {
                if *attribute != names.live_attribute && *attribute != names.target_attribute {
                    return;
                }
                if let Some(projectile) = weak.upgrade() {
                    projectile.refresh(&names, &handler_trackers);
                }
            }));

        ctx.trackers.projectiles.register(&projectile)?;

        // Live-слот освобождается вместе с регистрацией
        let id = projectile.id();
        projectile.core.keep_fn(move || {
            if let Some(trackers) = trackers.upgrade() {
                trackers.release_live(id);
            }
        });

        Ok(projectile)
    }
}

impl ProjectileTracker {
    /// Пересчёт cached полей из атрибутов. Значение неверного типа
    /// логируется, поле сохраняет прежнее значение.
    fn refresh(&self, names: &WorldNames, trackers: &Weak<Trackers>) {
        let instance = self.instance();

        match instance.attribute_as::<bool>(&names.live_attribute) {
            Ok(live) => self.live.set(live.unwrap_or(false)),
            Err(err) => logger::log_warning(&format!("⚠️ Projectile {:?}: {}", self.id(), err)),
        }

        match instance.attribute_as::<String>(&names.target_attribute) {
            Ok(target) => *self.target.borrow_mut() = target.unwrap_or_default(),
            Err(err) => logger::log_warning(&format!("⚠️ Projectile {:?}: {}", self.id(), err)),
        }

        self.hit.set(false);

        if let Some(trackers) = trackers.upgrade() {
            if self.live.get() {
                trackers.claim_live(self.id());
            } else {
                trackers.release_live(self.id());
            }
        }
    }

    pub fn is_live(&self) -> bool {
        self.live.get()
    }

    pub fn target(&self) -> String {
        self.target.borrow().clone()
    }

    pub fn targets(&self, agent_name: &str) -> bool {
        *self.target.borrow() == agent_name
    }

    pub fn is_hit(&self) -> bool {
        self.hit.get()
    }

    pub fn mark_hit(&self) {
        self.hit.set(true);
    }

    pub fn kinematics(&self) -> Kinematics {
        self.instance().kinematics()
    }
}
