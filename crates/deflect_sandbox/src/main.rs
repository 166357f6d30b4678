//! Headless прогон ядра против scripted окружения
//!
//! Usage: `deflect_sandbox [config.ron]`

use std::process::ExitCode;

use deflect_core::{
    create_headless_app, log_error, log_info, DeflectConfig, DeflectError, Session,
};
use deflect_sandbox::SandboxWorld;

const SEED: u64 = 42;
const FRAMES: u32 = 1_200;
const FRAME_DT: f32 = 1.0 / 60.0;
const SPAWN_EVERY: u32 = 90;
const SPAWN_DISTANCE: f32 = 30.0;
const SPAWN_SPEED: f32 = 40.0;

fn load_config() -> Result<DeflectConfig, String> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(DeflectConfig::default());
    };

    let text = std::fs::read_to_string(&path).map_err(|err| format!("{}: {}", path, err))?;
    DeflectConfig::from_ron_str(&text).map_err(|err: DeflectError| format!("{}: {}", path, err))
}

fn main() -> ExitCode {
    let mut app = create_headless_app();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            log_error(&format!("❌ Config: {}", err));
            return ExitCode::FAILURE;
        }
    };

    let mut world = SandboxWorld::new(&config, SEED);
    let session = match Session::start(world.root(), world.local_agent(), &config, world.actuator()) {
        Ok(session) => session,
        Err(err) => {
            log_error(&format!("❌ Session: {}", err));
            return ExitCode::FAILURE;
        }
    };

    app.insert_resource(config);
    app.insert_non_send_resource(session);

    for frame in 0..FRAMES {
        if frame % SPAWN_EVERY == 0 {
            world.spawn_projectile(SPAWN_DISTANCE, SPAWN_SPEED);
        }
        world.step(FRAME_DT);
        app.update();
    }

    let stats = world.stats();
    log_info(&format!(
        "📊 Sandbox: {} frames, spawned {}, pulses {}, deflected {}, impacts {}",
        FRAMES, stats.spawned, stats.pulses, stats.deflected, stats.impacts
    ));

    ExitCode::SUCCESS
}
