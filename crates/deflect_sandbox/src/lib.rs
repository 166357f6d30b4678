//! Deflect Sandbox - scripted host окружение
//!
//! Заменяет реальную симуляцию/transport: строит дерево объектов,
//! спавнит projectiles, интегрирует их кинематику и применяет результат
//! actuator (отбивание). Ядро видит только host-объекты.
//!
//! Кадр:
//! 1. `SandboxWorld::step(dt)` - host двигает мир
//! 2. `app.update()` - ядро принимает решение

use std::cell::Cell;
use std::rc::Rc;

use bevy::math::Vec3;
use deflect_core::environment::DEFAULT_GRAVITY;
use deflect_core::{log, log_info, Actuator, DeflectConfig, Instance, InstanceRef, Kinematics};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Имя локального агента
pub const LOCAL_AGENT: &str = "alice";

/// Кому уходит отбитый projectile
pub const BOT_NAME: &str = "bot";

/// Ближе этого к root part - удар по агенту
pub const IMPACT_RADIUS: f32 = 1.0;

/// Дальше этого от root part projectile удаляется
pub const DESPAWN_DISTANCE: f32 = 150.0;

/// Рост root part над "полом" (только для стартовой позиции)
const ROOT_HEIGHT: f32 = 2.5;

/// Счётчики нажатий, общие для actuator и мира
#[derive(Debug, Default)]
struct ActuatorState {
    pulses: Cell<u32>,
    held: Cell<bool>,
    pending_deflection: Cell<bool>,
}

/// Actuator, который "жмёт кнопку" внутри sandbox: deflection применится
/// на следующем `step`.
#[derive(Clone)]
pub struct SandboxActuator {
    state: Rc<ActuatorState>,
}

impl Actuator for SandboxActuator {
    fn press(&self) {
        self.state.held.set(true);
    }

    fn release(&self) {
        if self.state.held.replace(false) {
            self.state.pulses.set(self.state.pulses.get() + 1);
            self.state.pending_deflection.set(true);
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SandboxStats {
    pub spawned: u32,
    pub deflected: u32,
    pub impacts: u32,
    pub pulses: u32,
}

pub struct SandboxWorld {
    config: DeflectConfig,
    root: InstanceRef,
    player: InstanceRef,
    root_part: InstanceRef,
    /// Создаётся при первом spawn (ядро ждёт его deferred binding'ом)
    projectiles: Option<InstanceRef>,
    rng: ChaCha8Rng,
    actuator: Rc<ActuatorState>,
    stats: SandboxStats,
}

impl SandboxWorld {
    pub fn new(config: &DeflectConfig, seed: u64) -> Self {
        let names = &config.names;

        let root = Instance::new("DataModel", "sandbox");
        root.set_attribute(&names.gravity_attribute, DEFAULT_GRAVITY as f64);

        let players = Instance::new("Folder", names.players_container.as_str());
        players.set_parent(&root);

        let player = Instance::new("Player", LOCAL_AGENT);
        player.set_parent(&players);

        let body = Instance::new("Model", LOCAL_AGENT);
        let root_part = Instance::new("Part", names.root_part.as_str());
        root_part.set_kinematics(Kinematics::at(Vec3::new(0.0, ROOT_HEIGHT, 0.0)));
        root_part.set_parent(&body);
        body.set_parent(&root);
        player.set_character(Some(body));

        log_info(&format!("🧪 Sandbox world ready (seed: {})", seed));

        Self {
            config: config.clone(),
            root,
            player,
            root_part,
            projectiles: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
            actuator: Rc::new(ActuatorState::default()),
            stats: SandboxStats::default(),
        }
    }

    pub fn root(&self) -> &InstanceRef {
        &self.root
    }

    pub fn player(&self) -> &InstanceRef {
        &self.player
    }

    pub fn local_agent(&self) -> &str {
        LOCAL_AGENT
    }

    pub fn actuator(&self) -> SandboxActuator {
        SandboxActuator {
            state: self.actuator.clone(),
        }
    }

    pub fn stats(&self) -> SandboxStats {
        SandboxStats {
            pulses: self.actuator.pulses.get(),
            ..self.stats
        }
    }

    /// Projectiles, которые сейчас летят
    pub fn in_flight(&self) -> Vec<InstanceRef> {
        self.projectiles
            .as_ref()
            .map(|container| container.children())
            .unwrap_or_default()
    }

    fn gravity(&self) -> f32 {
        let gravity = self
            .root
            .attribute_as::<f64>(&self.config.names.gravity_attribute)
            .ok()
            .flatten()
            .map(|value| value as f32)
            .unwrap_or(DEFAULT_GRAVITY);
        gravity * self.config.gravity_scale
    }

    fn acceleration(&self) -> Vec3 {
        Vec3::new(0.0, -self.gravity(), 0.0)
    }

    fn projectile_container(&mut self) -> InstanceRef {
        if let Some(container) = &self.projectiles {
            return container.clone();
        }

        let container = Instance::new("Folder", self.config.names.projectile_container.as_str());
        container.set_parent(&self.root);
        self.projectiles = Some(container.clone());
        container
    }

    /// Projectile на `distance` от root part в случайном (seeded) направлении,
    /// баллистически нацеленный в root part: прилёт через `distance / speed`.
    pub fn spawn_projectile(&mut self, distance: f32, speed: f32) -> InstanceRef {
        let azimuth = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let elevation = self.rng.gen_range(-0.15..0.45_f32);
        let direction = Vec3::new(
            azimuth.cos() * elevation.cos(),
            elevation.sin(),
            azimuth.sin() * elevation.cos(),
        );

        let target = self.root_part.kinematics().position;
        let position = target + direction * distance;
        let flight_time = distance / speed.max(f32::EPSILON);
        // v0 = Δp / T - a T / 2: с постоянным ускорением попадаем ровно через T
        let velocity = (target - position) / flight_time - self.acceleration() * flight_time * 0.5;

        let names = self.config.names.clone();
        let container = self.projectile_container();

        let projectile = Instance::new("Part", "Ball");
        projectile.set_kinematics(Kinematics::moving(position, velocity));
        projectile.set_attribute(&names.live_attribute, true);
        projectile.set_attribute(&names.target_attribute, LOCAL_AGENT);
        projectile.set_parent(&container);

        self.stats.spawned += 1;
        log(&format!(
            "🎯 Spawned projectile {:?} at {:.1}m (eta {:.2}s)",
            projectile.id(),
            distance,
            flight_time
        ));

        projectile
    }

    /// Один кадр host-симуляции
    pub fn step(&mut self, dt: f32) {
        if self.actuator.pending_deflection.replace(false) {
            self.deflect_nearest();
        }

        let acceleration = self.acceleration();
        let agent = self.root_part.kinematics().position;
        let names = &self.config.names;

        for projectile in self.in_flight() {
            let mut kinematics = projectile.kinematics();
            kinematics.position += kinematics.velocity * dt + acceleration * (0.5 * dt * dt);
            kinematics.velocity += acceleration * dt;
            projectile.set_kinematics(kinematics);

            let distance = kinematics.position.distance(agent);
            let targets_us = projectile
                .attribute_as::<String>(&names.target_attribute)
                .ok()
                .flatten()
                .is_some_and(|target| target == LOCAL_AGENT);

            if targets_us && distance <= IMPACT_RADIUS {
                self.stats.impacts += 1;
                log_info(&format!("💥 Projectile {:?} hit {}", projectile.id(), LOCAL_AGENT));
                projectile.destroy();
            } else if distance > DESPAWN_DISTANCE {
                projectile.destroy();
            }
        }
    }

    /// Отбивание: ближайший projectile, летящий в нас, разворачивается к боту
    fn deflect_nearest(&mut self) {
        let agent = self.root_part.kinematics().position;
        let names = self.config.names.clone();

        let nearest = self
            .in_flight()
            .into_iter()
            .filter(|projectile| {
                projectile
                    .attribute_as::<String>(&names.target_attribute)
                    .ok()
                    .flatten()
                    .is_some_and(|target| target == LOCAL_AGENT)
            })
            .min_by(|a, b| {
                let da = a.kinematics().position.distance(agent);
                let db = b.kinematics().position.distance(agent);
                da.total_cmp(&db)
            });

        let Some(projectile) = nearest else {
            return;
        };

        let mut kinematics = projectile.kinematics();
        kinematics.velocity = -kinematics.velocity;
        projectile.set_kinematics(kinematics);
        projectile.set_attribute(&names.target_attribute, BOT_NAME);

        self.stats.deflected += 1;
        log_info(&format!("↩️ Projectile {:?} deflected → {}", projectile.id(), BOT_NAME));
    }
}
