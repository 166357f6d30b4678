//! Integration тесты lifecycle: session guard, container bindings,
//! respawn, teardown.
//!
//! Session - process-wide, поэтому тесты сериализуются через SERIAL.

use std::sync::Mutex;

use bevy::math::Vec3;
use deflect_core::logger::{set_logger, MemoryLogger};
use deflect_core::tracking::Component;
use deflect_core::{
    Actuator, DeflectConfig, DeflectError, Instance, InstanceRef, Kinematics, Session,
};

static SERIAL: Mutex<()> = Mutex::new(());

struct NoopActuator;

impl Actuator for NoopActuator {
    fn press(&self) {}
    fn release(&self) {}
}

struct World {
    root: InstanceRef,
    players: InstanceRef,
    player: InstanceRef,
}

fn world() -> World {
    let root = Instance::new("DataModel", "game");
    let players = Instance::new("Folder", "Players");
    players.set_parent(&root);
    let player = Instance::new("Player", "alice");
    player.set_parent(&players);
    World {
        root,
        players,
        player,
    }
}

fn character(name: &str) -> InstanceRef {
    let model = Instance::new("Model", name);
    let root_part = Instance::new("Part", "Root");
    root_part.set_kinematics(Kinematics::at(Vec3::ZERO));
    root_part.set_parent(&model);
    model
}

/// Глобальный logger → память (держать SERIAL, пока читаем строки)
fn capture_logs() -> MemoryLogger {
    let memory = MemoryLogger::default();
    set_logger(Box::new(memory.clone()));
    memory
}

fn start(root: &InstanceRef) -> Session {
    Session::start(root, "alice", &DeflectConfig::default(), NoopActuator)
        .expect("session must start")
}

#[test]
fn test_second_session_is_rejected_until_first_is_dropped() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let w = world();

    let first = start(&w.root);
    assert!(Session::is_active());

    let logs = capture_logs();
    let second = Session::start(&w.root, "alice", &DeflectConfig::default(), NoopActuator);
    assert!(matches!(second, Err(DeflectError::AlreadyInitialized)));
    assert!(
        logs.lines()
            .iter()
            .any(|line| line.starts_with("[ERROR]") && line.contains("already running")),
        "rejection must be logged at ERROR: {:?}",
        logs.lines()
    );

    drop(first);
    assert!(!Session::is_active());

    let _restarted = start(&w.root);
}

#[test]
fn test_missing_players_container_fails_and_releases_guard() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let root = Instance::new("DataModel", "game");

    let err = Session::start(&root, "alice", &DeflectConfig::default(), NoopActuator)
        .err()
        .expect("players container is required");
    assert!(matches!(err, DeflectError::MissingContainer { ref name, .. } if name == "Players"));
    assert!(!Session::is_active());
}

#[test]
fn test_existing_players_bind_on_next_resume() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let w = world();
    let session = start(&w.root);

    // Existing children - отдельные deferred jobs
    assert!(session.trackers().agents.is_empty());
    assert_eq!(session.resume_deferred(), 1);
    assert!(session.trackers().agent_named("alice").is_some());

    // Новые - синхронно по child_added
    Instance::new("Player", "bob").set_parent(&w.players);
    assert!(session.trackers().agent_named("bob").is_some());
}

#[test]
fn test_reparent_before_resume_binds_agent_once() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let w = world();
    let session = start(&w.root);

    // child_added для уже поставленного в очередь child
    w.player.set_parent(&w.players);
    let agent = session.trackers().agent_named("alice").expect("bound on child_added");

    assert_eq!(session.resume_deferred(), 1);

    assert_eq!(session.trackers().agents.len(), 1);
    assert!(!agent.is_destroyed());
    assert_eq!(w.player.character_added.connection_count(), 1);

    w.player.set_character(Some(character("alice")));
    assert!(agent.character().is_some());
    assert_eq!(session.trackers().characters.len(), 1);
}

#[test]
fn test_respawn_yields_exactly_one_character() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let w = world();
    let session = start(&w.root);
    session.resume_deferred();

    let first = character("alice");
    w.player.set_character(Some(first.clone()));
    let first_tracker = session.local_character().expect("first character is tracked");
    assert_eq!(first_tracker.id(), first.id());

    let second = character("alice");
    w.player.set_character(Some(second.clone()));

    assert_eq!(session.trackers().characters.len(), 1);
    assert!(first_tracker.is_destroyed());
    assert_eq!(session.local_character().map(|c| c.id()), Some(second.id()));
}

#[test]
fn test_death_clears_local_character() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let w = world();
    let session = start(&w.root);
    session.resume_deferred();

    let body = character("alice");
    w.player.set_character(Some(body.clone()));
    let tracker = session.local_character().expect("character is tracked");

    body.set_health(0.0);
    assert!(tracker.is_destroyed());
    assert!(session.local_character().is_none());
    assert!(session.trackers().characters.is_empty());
}

#[test]
fn test_character_without_root_part_is_not_registered() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let w = world();
    let session = start(&w.root);
    session.resume_deferred();

    w.player.set_character(Some(Instance::new("Model", "alice")));

    assert!(session.trackers().characters.is_empty());
    assert!(session.local_character().is_none());
    // Агент при этом жив и ждёт следующего spawn
    let agent = session.trackers().agent_named("alice").expect("agent survives");
    w.player.set_character(Some(character("alice")));
    assert!(agent.character().is_some());
}

#[test]
fn test_deferred_projectile_container_attaches_once() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let w = world();
    let session = start(&w.root);
    session.resume_deferred();

    // Контейнер появляется после старта, уже с child внутри
    let projectiles = Instance::new("Folder", "Projectiles");
    let early = Instance::new("Part", "Ball");
    early.set_parent(&projectiles);
    projectiles.set_parent(&w.root);

    assert_eq!(session.resume_deferred(), 1);
    assert!(session.trackers().projectiles.contains(early.id()));

    // Второй контейнер с тем же именем не привязывается
    let duplicate = Instance::new("Folder", "Projectiles");
    duplicate.set_parent(&w.root);
    Instance::new("Part", "Stray").set_parent(&duplicate);
    session.resume_deferred();

    let late = Instance::new("Part", "Ball");
    late.set_parent(&projectiles);

    assert_eq!(session.trackers().projectiles.len(), 2);
    assert!(session.trackers().projectiles.contains(late.id()));
}

#[test]
fn test_destroyed_projectile_leaves_registry_immediately() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let w = world();
    let projectiles = Instance::new("Folder", "Projectiles");
    projectiles.set_parent(&w.root);
    let session = start(&w.root);

    let ball = Instance::new("Part", "Ball");
    ball.set_attribute("live", true);
    ball.set_parent(&projectiles);
    assert_eq!(session.trackers().live_projectile_id(), Some(ball.id()));

    ball.destroy();

    assert!(!session.trackers().projectiles.contains(ball.id()));
    assert_eq!(session.trackers().live_projectile_id(), None);
}

#[test]
fn test_agent_removal_cascades_to_character() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let w = world();
    let session = start(&w.root);
    session.resume_deferred();
    w.player.set_character(Some(character("alice")));
    assert_eq!(session.trackers().characters.len(), 1);

    w.player.destroy();

    assert!(session.trackers().agents.is_empty());
    assert!(session.trackers().characters.is_empty());
}

#[test]
fn test_teardown_releases_everything() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let w = world();
    let session = start(&w.root);
    session.resume_deferred();
    w.player.set_character(Some(character("alice")));

    let projectiles = Instance::new("Folder", "Projectiles");
    projectiles.set_parent(&w.root);
    let ball = Instance::new("Part", "Ball");
    ball.set_parent(&projectiles);

    let trackers = session.trackers().clone();
    assert!(!trackers.projectiles.is_empty());

    drop(session);

    assert!(trackers.agents.is_empty());
    assert!(trackers.characters.is_empty());
    assert!(trackers.projectiles.is_empty());
    assert!(trackers.actors.is_empty());

    // Ни одной подписки на host-объектах не осталось
    assert_eq!(w.root.child_added.connection_count(), 0);
    assert_eq!(w.root.attribute_changed.connection_count(), 0);
    assert_eq!(w.players.child_added.connection_count(), 0);
    assert_eq!(projectiles.child_added.connection_count(), 0);
    assert_eq!(ball.attribute_changed.connection_count(), 0);
    assert_eq!(ball.destroying.connection_count(), 0);
    assert_eq!(w.player.character_added.connection_count(), 0);
}

#[test]
fn test_teardown_cancels_pending_binds() {
    let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let w = world();
    let session = start(&w.root);
    let scheduler = session.scheduler().clone();
    assert_eq!(scheduler.pending(), 1);

    let trackers = session.trackers().clone();
    drop(session);

    assert_eq!(scheduler.resume_deferred(), 0);
    assert!(trackers.agents.is_empty());
}
