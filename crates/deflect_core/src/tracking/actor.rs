//! ActorTracker - участник в in-play контейнере (кто сейчас в игре)

use std::rc::Rc;

use super::component::{destroy_on_destroying, Component, ComponentCore};
use super::{Registry, Tracker, Trackers, TrackingContext};
use crate::error::Result;
use crate::host::InstanceRef;

pub struct ActorTracker {
    core: ComponentCore,
    name: String,
}

impl Component for ActorTracker {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
}

impl Tracker for ActorTracker {
    const KIND: &'static str = "actor";

    fn registry(trackers: &Trackers) -> &Rc<Registry<Self>> {
        &trackers.actors
    }

    fn bind(instance: &InstanceRef, ctx: &TrackingContext) -> Result<Rc<Self>> {
        let actor = Rc::new(Self {
            core: ComponentCore::new(instance),
            name: instance.name().to_string(),
        });

        destroy_on_destroying(&actor);

        // Мёртвый актор выбывает из игры сразу, не дожидаясь удаления модели
        let weak = Rc::downgrade(&actor);
        actor.core.keep(instance.died.connect(move |_| {
            if let Some(actor) = weak.upgrade() {
                actor.destroy();
            }
        }));

        ctx.trackers.actors.register(&actor)?;

        Ok(actor)
    }
}

impl ActorTracker {
    pub fn name(&self) -> &str {
        &self.name
    }
}
