//! Session - owned context процесса
//!
//! Держит registries, gravity, scheduler, actuator и bins всех container
//! bindings. Максимум одна сессия на процесс: вторая попытка старта -
//! `AlreadyInitialized` (громко, в лог ERROR).
//!
//! Drop: dispose bindings → destroy всех trackers → освобождение guard.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::cleanup::{ResourceBin, SharedBin};
use crate::config::{DeflectConfig, TargetingMode};
use crate::decision::{evaluate, pulse, Actuator, ParryTriggered};
use crate::environment::Gravity;
use crate::error::{DeflectError, Result};
use crate::host::{InstanceRef, Scheduler};
use crate::logger;
use crate::tracking::{
    bind_container, bind_deferred_container, ActorTracker, AgentTracker, CharacterTracker,
    Component, ProjectileTracker, Trackers, TrackingContext,
};

static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

/// RAII guard process-wide флага
struct SessionGuard;

impl SessionGuard {
    fn acquire() -> Result<Self> {
        SESSION_ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| SessionGuard)
            .map_err(|_| DeflectError::AlreadyInitialized)
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        SESSION_ACTIVE.store(false, Ordering::Release);
    }
}

pub struct Session {
    local_agent: String,
    ctx: TrackingContext,
    gravity: Gravity,
    bindings: SharedBin,
    actuator: Box<dyn Actuator>,
    // Последним полем: освобождается после teardown в Drop
    _guard: SessionGuard,
}

impl Session {
    /// Поднимает bindings на дереве `root`:
    /// - gravity атрибут root
    /// - players контейнер (обязан существовать, static binding)
    /// - projectile + in-play контейнеры (deferred binding)
    pub fn start(
        root: &InstanceRef,
        local_agent: impl Into<String>,
        config: &DeflectConfig,
        actuator: impl Actuator + 'static,
    ) -> Result<Self> {
        let guard = SessionGuard::acquire().inspect_err(|err| {
            logger::log_error(&format!("❌ Refusing to start: {}", err));
        })?;

        let names = config.names.clone();
        let players = root
            .find_first_child(&names.players_container)
            .ok_or_else(|| DeflectError::MissingContainer {
                parent: root.name().to_string(),
                name: names.players_container.clone(),
            })?;

        let ctx = TrackingContext::new(names, Scheduler::new());
        let bindings: SharedBin = Rc::new(RefCell::new(ResourceBin::new()));

        let gravity = Gravity::bind(root, &ctx.names.gravity_attribute, &mut bindings.borrow_mut());

        bind_container::<AgentTracker>(&players, &ctx, &mut bindings.borrow_mut());
        bind_deferred_container::<ProjectileTracker>(
            root,
            &ctx.names.projectile_container,
            &ctx,
            &bindings,
        );
        bind_deferred_container::<ActorTracker>(root, &ctx.names.in_play_container, &ctx, &bindings);

        let local_agent = local_agent.into();
        logger::log_info(&format!(
            "✅ Deflect session started (agent: {}, volume: {:?}, policy: {:?}, targeting: {:?})",
            local_agent, config.volume, config.threshold_policy, config.targeting
        ));

        Ok(Self {
            local_agent,
            ctx,
            gravity,
            bindings,
            actuator: Box::new(actuator),
            _guard: guard,
        })
    }

    pub fn is_active() -> bool {
        SESSION_ACTIVE.load(Ordering::Acquire)
    }

    pub fn local_agent(&self) -> &str {
        &self.local_agent
    }

    pub fn trackers(&self) -> &Rc<Trackers> {
        &self.ctx.trackers
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.ctx.scheduler
    }

    pub fn gravity(&self) -> f32 {
        self.gravity.get()
    }

    pub fn resume_deferred(&self) -> usize {
        let ran = self.ctx.scheduler.resume_deferred();
        if ran > 0 {
            // Отработавшие bind jobs: cancel для них уже no-op
            self.bindings.borrow_mut().prune_settled_tasks();
        }
        ran
    }

    /// Живой character локального агента (нет → тик пропускается)
    pub fn local_character(&self) -> Option<Rc<CharacterTracker>> {
        self.ctx
            .trackers
            .agent_named(&self.local_agent)
            .and_then(|agent| agent.character())
            .filter(|character| character.is_alive())
    }

    fn candidates(&self, targeting: TargetingMode) -> Vec<Rc<ProjectileTracker>> {
        match targeting {
            TargetingMode::SingleLive => self.ctx.trackers.live_projectile().into_iter().collect(),
            TargetingMode::AllLive => self
                .ctx
                .trackers
                .projectiles
                .snapshot()
                .into_iter()
                .filter(|projectile| projectile.is_live())
                .collect(),
        }
    }

    /// Один проход decision loop. Возвращает сработавшие перехваты.
    pub fn decide(&self, config: &DeflectConfig) -> Vec<ParryTriggered> {
        let Some(character) = self.local_character() else {
            return Vec::new();
        };

        if config.require_in_play && !self.ctx.trackers.is_in_play(character.agent_name()) {
            return Vec::new();
        }

        let agent_root = character.root_kinematics();
        let gravity = self.gravity.get();
        let mut triggered = Vec::new();

        for projectile in self.candidates(config.targeting) {
            if projectile.is_hit() || !projectile.targets(character.agent_name()) {
                continue;
            }

            let verdict = evaluate(&projectile.kinematics(), &agent_root, gravity, config);
            if !verdict.fires() {
                continue;
            }

            pulse(self.actuator.as_ref());
            projectile.mark_hit();

            logger::log_info(&format!(
                "🛡️ Parry: projectile {:?} → {} (impact in {:.3}s)",
                projectile.id(),
                character.agent_name(),
                verdict.impact_time().unwrap_or_default()
            ));

            triggered.push(ParryTriggered {
                projectile: projectile.id(),
                verdict,
            });
        }

        triggered
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let mut bindings = self.bindings.take();
        bindings.dispose();
        self.ctx.scheduler.clear();
        self.ctx.trackers.destroy_all();
        logger::log_info(&format!("🛑 Deflect session stopped (agent: {})", self.local_agent));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Instance;

    struct NoopActuator;

    impl Actuator for NoopActuator {
        fn press(&self) {}
        fn release(&self) {}
    }

    #[test]
    fn test_resume_prunes_finished_bind_jobs() {
        let root = Instance::new("DataModel", "game");
        let players = Instance::new("Folder", "Players");
        players.set_parent(&root);
        for name in ["alice", "bob", "carol"] {
            Instance::new("Player", name).set_parent(&players);
        }

        let session =
            Session::start(&root, "alice", &DeflectConfig::default(), NoopActuator).unwrap();
        let queued = session.bindings.borrow().len();

        assert_eq!(session.resume_deferred(), 3);
        assert_eq!(session.bindings.borrow().len(), queued - 3);
        assert_eq!(session.trackers().agents.len(), 3);

        // Следующий resume пустой - bin не меняется
        assert_eq!(session.resume_deferred(), 0);
        assert_eq!(session.bindings.borrow().len(), queued - 3);
    }
}
