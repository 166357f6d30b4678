//! Deflect Core
//!
//! Reactive perception + interception решатель поверх внешнего дерева
//! объектов (host). Каждый heartbeat (`app.update()`):
//! - PreUpdate: deferred container bindings
//! - Update: decision loop → actuator pulse → `ParryTriggered`
//!
//! Слои:
//! - host: дерево объектов, signals, scheduler (single-threaded, `Rc`)
//! - cleanup + tracking: lifecycle trackers, registries, bindings
//! - intercept: closed-form время удара (sphere / cylinder)
//! - decision + session: per-tick решение, process-wide session

use bevy::prelude::*;

pub mod cleanup;
pub mod config;
pub mod decision;
pub mod environment;
pub mod error;
pub mod host;
pub mod intercept;
pub mod logger;
pub mod session;
pub mod tracking;

pub use config::{DeflectConfig, TargetingMode, ThresholdPolicy, VolumeModel, WorldNames};
pub use decision::{evaluate, pulse, Actuator, DeflectPlugin, ParryTriggered, Verdict};
pub use error::{DeflectError, Result};
pub use host::{AttributeValue, Instance, InstanceId, InstanceRef, Kinematics};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, log_with_level, set_log_level, LogLevel,
    LogPrinter,
};
pub use session::Session;

/// Создаёт minimal Bevy App для headless прогона (тесты, sandbox)
pub fn create_headless_app() -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins).add_plugins(DeflectPlugin);

    app
}
