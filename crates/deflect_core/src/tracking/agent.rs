//! AgentTracker - управляющий игрок/агент
//!
//! Владеет максимум одним CharacterTracker:
//! - spawn → bind нового character
//! - respawn → старый destroy ДО bind нового
//! - removing / death → destroy
//! - destroy агента каскадом уносит character

use std::cell::RefCell;
use std::rc::Rc;

use super::character::CharacterTracker;
use super::component::{destroy_on_destroying, Component, ComponentCore};
use super::{Registry, Tracker, Trackers, TrackingContext};
use crate::error::Result;
use crate::host::{InstanceId, InstanceRef};
use crate::logger;

pub struct AgentTracker {
    core: ComponentCore,
    /// Стабильное имя, снятое при создании
    name: String,
    ctx: TrackingContext,
    character: RefCell<Option<Rc<CharacterTracker>>>,
}

impl Component for AgentTracker {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
}

impl Tracker for AgentTracker {
    const KIND: &'static str = "agent";

    fn registry(trackers: &Trackers) -> &Rc<Registry<Self>> {
        &trackers.agents
    }

    fn bind(instance: &InstanceRef, ctx: &TrackingContext) -> Result<Rc<Self>> {
        let agent = Rc::new(Self {
            core: ComponentCore::new(instance),
            name: instance.name().to_string(),
            ctx: ctx.clone(),
            character: RefCell::new(None),
        });

        destroy_on_destroying(&agent);

        let weak = Rc::downgrade(&agent);
        agent.core.keep(instance.character_added.connect(move |character| {
            if let Some(agent) = weak.upgrade() {
                agent.adopt_character(character);
            }
        }));

        let weak = Rc::downgrade(&agent);
        agent.core.keep(instance.character_removing.connect(move |character| {
            if let Some(agent) = weak.upgrade() {
                agent.release_character(Some(character.id()));
            }
        }));

        ctx.trackers.agents.register(&agent)?;

        let weak = Rc::downgrade(&agent);
        agent.core.keep_fn(move || {
            if let Some(agent) = weak.upgrade() {
                agent.release_character(None);
            }
        });

        if let Some(existing) = instance.character() {
            agent.adopt_character(&existing);
        }

        Ok(agent)
    }
}

impl AgentTracker {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Текущий живой character (уничтоженный по `died` сюда не попадает)
    pub fn character(&self) -> Option<Rc<CharacterTracker>> {
        self.character
            .borrow()
            .as_ref()
            .filter(|character| !character.is_destroyed())
            .cloned()
    }

    fn adopt_character(&self, instance: &InstanceRef) {
        if self.is_destroyed() {
            return;
        }

        // Старый уходит до создания нового: два character одновременно не живут
        self.release_character(None);

        match CharacterTracker::bind(instance, &self.name, &self.ctx) {
            Ok(character) => {
                logger::log(&format!("🧍 Agent {} spawned character {:?}", self.name, character.id()));
                *self.character.borrow_mut() = Some(character);
            }
            Err(err) => {
                logger::log_warning(&format!("❌ Agent {}: {}", self.name, err));
            }
        }
    }

    /// `only`: снять только character с этим id (removing для чужого - no-op)
    fn release_character(&self, only: Option<InstanceId>) {
        let released = {
            let mut slot = self.character.borrow_mut();
            match (slot.as_ref(), only) {
                (Some(current), Some(id)) if current.id() != id => None,
                _ => slot.take(),
            }
        };

        if let Some(character) = released {
            character.destroy();
        }
    }
}
