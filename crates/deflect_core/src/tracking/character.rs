//! CharacterTracker - тело агента (жизнь ограничена его AgentTracker)

use std::rc::Rc;

use super::component::{destroy_on_destroying, Component, ComponentCore};
use super::TrackingContext;
use crate::error::{DeflectError, Result};
use crate::host::{InstanceRef, Kinematics};

pub struct CharacterTracker {
    core: ComponentCore,
    agent_name: String,
    root: InstanceRef,
}

impl Component for CharacterTracker {
    fn core(&self) -> &ComponentCore {
        &self.core
    }
}

impl CharacterTracker {
    /// Без root part character считается битым: `MissingPart`, без регистрации
    pub fn bind(instance: &InstanceRef, agent_name: &str, ctx: &TrackingContext) -> Result<Rc<Self>> {
        let root = instance
            .find_first_child(&ctx.names.root_part)
            .ok_or_else(|| DeflectError::MissingPart {
                owner: format!("character of {}", agent_name),
                part: ctx.names.root_part.clone(),
            })?;

        let character = Rc::new(Self {
            core: ComponentCore::new(instance),
            agent_name: agent_name.to_string(),
            root: root.clone(),
        });

        destroy_on_destroying(&character);

        let weak = Rc::downgrade(&character);
        character.core.keep(instance.died.connect(move |_| {
            if let Some(character) = weak.upgrade() {
                character.destroy();
            }
        }));

        let weak = Rc::downgrade(&character);
        character.core.keep(root.destroying.connect(move |_| {
            if let Some(character) = weak.upgrade() {
                character.destroy();
            }
        }));

        ctx.trackers.characters.register(&character)?;

        Ok(character)
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn root(&self) -> &InstanceRef {
        &self.root
    }

    pub fn root_kinematics(&self) -> Kinematics {
        self.root.kinematics()
    }

    pub fn is_alive(&self) -> bool {
        !self.is_destroyed() && self.instance().health() > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldNames;
    use crate::host::{Instance, Scheduler};

    fn context() -> TrackingContext {
        TrackingContext::new(WorldNames::default(), Scheduler::new())
    }

    fn character_with_root() -> InstanceRef {
        let model = Instance::new("Model", "alice");
        Instance::new("Part", "Root").set_parent(&model);
        model
    }

    #[test]
    fn test_missing_root_fails_without_registration() {
        let ctx = context();
        let model = Instance::new("Model", "alice");

        let err = CharacterTracker::bind(&model, "alice", &ctx).err().unwrap();
        assert!(matches!(err, DeflectError::MissingPart { ref part, .. } if part == "Root"));
        assert!(ctx.trackers.characters.is_empty());
    }

    #[test]
    fn test_death_destroys_and_unregisters() {
        let ctx = context();
        let model = character_with_root();
        let character = CharacterTracker::bind(&model, "alice", &ctx).unwrap();
        assert!(character.is_alive());
        assert_eq!(ctx.trackers.characters.len(), 1);

        model.set_health(0.0);
        assert!(character.is_destroyed());
        assert!(!character.is_alive());
        assert!(ctx.trackers.characters.is_empty());
    }

    #[test]
    fn test_root_removal_destroys_character() {
        let ctx = context();
        let model = character_with_root();
        let character = CharacterTracker::bind(&model, "alice", &ctx).unwrap();

        character.root().clone().destroy();
        assert!(character.is_destroyed());
    }
}
