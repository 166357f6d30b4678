//! Reactive entity lifecycle: trackers + registries + container bindings
//!
//! Поток данных: host signals → bind/destroy trackers → Registry mutation.
//! Decision loop только читает registries.

pub mod actor;
pub mod agent;
pub mod binding;
pub mod character;
pub mod component;
pub mod projectile;
pub mod registry;

pub use actor::ActorTracker;
pub use agent::AgentTracker;
pub use binding::{bind_container, bind_deferred_container, wait_for_child};
pub use character::CharacterTracker;
pub use component::{destroy_on_destroying, Component, ComponentCore};
pub use projectile::ProjectileTracker;
pub use registry::Registry;

use std::cell::Cell;
use std::rc::Rc;

use crate::config::WorldNames;
use crate::error::Result;
use crate::host::{InstanceId, InstanceRef, Scheduler};
use crate::logger;

/// Все registries процесса + live-слот для single-target режима
pub struct Trackers {
    pub projectiles: Rc<Registry<ProjectileTracker>>,
    pub agents: Rc<Registry<AgentTracker>>,
    pub characters: Rc<Registry<CharacterTracker>>,
    pub actors: Rc<Registry<ActorTracker>>,
    live_projectile: Cell<Option<InstanceId>>,
}

impl Trackers {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            projectiles: Registry::new("projectile"),
            agents: Registry::new("agent"),
            characters: Registry::new("character"),
            actors: Registry::new("actor"),
            live_projectile: Cell::new(None),
        })
    }

    /// Projectile, занимающий live-слот (если он ещё зарегистрирован)
    pub fn live_projectile(&self) -> Option<Rc<ProjectileTracker>> {
        self.live_projectile
            .get()
            .and_then(|id| self.projectiles.get(id))
    }

    pub fn live_projectile_id(&self) -> Option<InstanceId> {
        self.live_projectile.get()
    }

    /// Инвариант: не больше одного live projectile. Новый вытесняет старый.
    pub(crate) fn claim_live(&self, id: InstanceId) {
        match self.live_projectile.replace(Some(id)) {
            Some(previous) if previous != id => {
                logger::log_warning(&format!(
                    "⚠️ Live projectile {:?} displaced by {:?}",
                    previous, id
                ));
            }
            _ => {}
        }
    }

    pub(crate) fn release_live(&self, id: InstanceId) {
        if self.live_projectile.get() == Some(id) {
            self.live_projectile.set(None);
        }
    }

    pub fn agent_named(&self, name: &str) -> Option<Rc<AgentTracker>> {
        self.agents.find(|agent| agent.name() == name)
    }

    pub fn is_in_play(&self, name: &str) -> bool {
        self.actors.find(|actor| actor.name() == name).is_some()
    }

    /// Teardown: agents первыми (каскадом уносят characters)
    pub fn destroy_all(&self) {
        self.agents.destroy_all();
        self.characters.destroy_all();
        self.projectiles.destroy_all();
        self.actors.destroy_all();
        self.live_projectile.set(None);
    }
}

/// То, что нужно любому bind: registries, имена, scheduler
#[derive(Clone)]
pub struct TrackingContext {
    pub trackers: Rc<Trackers>,
    pub names: Rc<WorldNames>,
    pub scheduler: Scheduler,
}

impl TrackingContext {
    pub fn new(names: WorldNames, scheduler: Scheduler) -> Self {
        Self {
            trackers: Trackers::new(),
            names: Rc::new(names),
            scheduler,
        }
    }
}

/// Component, который container binding умеет создавать из child объекта
pub trait Tracker: Component + Sized {
    const KIND: &'static str;

    /// Registry, в который `bind` кладёт результат
    fn registry(trackers: &Trackers) -> &Rc<Registry<Self>>;

    fn bind(instance: &InstanceRef, ctx: &TrackingContext) -> Result<Rc<Self>>;
}
