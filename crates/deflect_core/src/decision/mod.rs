//! Per-tick decision loop.
//!
//! # Tick flow
//!
//! ```text
//! 1. resolve local agent → current character   (нет → skip, без логов)
//! 2. candidates: live-слот | все live projectiles
//! 3. skip: debounce set | target != local agent
//! 4. evaluate() → Contained | Imminent(t) | Pending(t) | Miss
//! 5. fires() → actuator pulse (press + release) + debounce flag
//! ```
//!
//! Всё синхронно внутри heartbeat: ни I/O, ни ожиданий.

use bevy::prelude::*;

mod evaluation;

pub use evaluation::{evaluate, Verdict};

use crate::config::DeflectConfig;
use crate::host::InstanceId;
use crate::session::Session;

/// Единственный выход ядра: одна логическая кнопка
pub trait Actuator {
    fn press(&self);
    fn release(&self);
}

/// Press сразу за ним release - один trigger на перехват
pub fn pulse(actuator: &dyn Actuator) {
    actuator.press();
    actuator.release();
}

/// Событие: decision loop сработал по projectile
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ParryTriggered {
    pub projectile: InstanceId,
    pub verdict: Verdict,
}

/// Decision loop как Bevy plugin: heartbeat = `app.update()`.
///
/// Сессию вставляет host: `app.insert_non_send_resource(session)`.
/// Без сессии системы молча ничего не делают.
pub struct DeflectPlugin;

impl Plugin for DeflectPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DeflectConfig>()
            .add_event::<ParryTriggered>()
            .add_systems(PreUpdate, resume_deferred_main_thread)
            .add_systems(Update, parry_decision_main_thread);
    }
}

/// System: deferred bindings (PreUpdate, до decision loop)
pub fn resume_deferred_main_thread(session: Option<NonSend<Session>>) {
    if let Some(session) = session {
        session.resume_deferred();
    }
}

/// System: decision loop (Update, раз в heartbeat)
pub fn parry_decision_main_thread(
    session: Option<NonSend<Session>>,
    config: Res<DeflectConfig>,
    mut parries: EventWriter<ParryTriggered>,
) {
    let Some(session) = session else {
        return;
    };

    for parry in session.decide(&config) {
        parries.write(parry);
    }
}
