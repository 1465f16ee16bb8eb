#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use bevy_ecs::{
    entity::Entity,
    event::{EventRegistry, Events},
    world::World,
};
use breathe::{
    events::{GameEvent, SimEvent},
    game::Game,
    level::LevelCatalog,
    systems::{
        DeltaTime, EnemyBehavior, EnemyBundle, EntityKind, Hitbox, InputIntent, LevelEntity, Obstacle, ObstacleBundle, PendingTransition,
        Pickup, PickupBundle, PlayerBundle, PlayerControlled, Position, PreviousPosition, RunMode, RunState, SimRng, Velocity,
    },
};
use glam::Vec2;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

pub const SEED: u64 = 0x0B2E_A7E5;
pub const STEP: f32 = 1.0 / 60.0;
pub const HEADER: &str = "level,kind,x,y,w,h,param";

/// Creates a world holding every resource and event the tick systems expect.
pub fn create_test_world() -> World {
    let mut world = World::new();
    EventRegistry::register_event::<GameEvent>(&mut world);
    EventRegistry::register_event::<SimEvent>(&mut world);

    world.insert_resource(RunState {
        mode: RunMode::Play,
        ..RunState::default()
    });
    world.insert_resource(PendingTransition::default());
    world.insert_resource(DeltaTime(STEP));
    world.insert_resource(InputIntent::empty());
    world.insert_resource(SimRng::seeded(SEED));
    world
}

pub fn spawn_test_player(world: &mut World, position: Vec2) -> Entity {
    world
        .spawn(PlayerBundle {
            player: PlayerControlled,
            position: Position(position),
            previous: PreviousPosition(position),
            velocity: Velocity::default(),
            hitbox: Hitbox::new(Vec2::splat(12.0)),
            kind: EntityKind::Player,
            level: LevelEntity,
        })
        .id()
}

pub fn spawn_test_enemy(world: &mut World, position: Vec2) -> Entity {
    world
        .spawn(EnemyBundle {
            behavior: EnemyBehavior::new(position, 70.0),
            position: Position(position),
            previous: PreviousPosition(position),
            velocity: Velocity::default(),
            hitbox: Hitbox::new(Vec2::splat(10.0)),
            kind: EntityKind::Enemy,
            level: LevelEntity,
        })
        .id()
}

/// Spawns a wall given its center and full size.
pub fn spawn_test_wall(world: &mut World, center: Vec2, size: Vec2) -> Entity {
    world
        .spawn(ObstacleBundle {
            obstacle: Obstacle,
            position: Position(center),
            hitbox: Hitbox::from_size(size),
            kind: EntityKind::Wall,
            level: LevelEntity,
        })
        .id()
}

pub fn spawn_test_pickup(world: &mut World, position: Vec2, refill: f32) -> Entity {
    world
        .spawn(PickupBundle {
            pickup: Pickup { refill },
            position: Position(position),
            hitbox: Hitbox::new(Vec2::new(8.0, 12.0)),
            kind: EntityKind::Pickup,
            level: LevelEntity,
        })
        .id()
}

/// Sends a game event to the world
pub fn send_game_event(world: &mut World, event: GameEvent) {
    let mut events = world.resource_mut::<Events<GameEvent>>();
    events.send(event);
}

/// Removes and returns all game events currently buffered.
pub fn drain_game_events(world: &mut World) -> Vec<GameEvent> {
    world.resource_mut::<Events<GameEvent>>().drain().collect()
}

/// Removes and returns all outbound notifications currently buffered.
pub fn drain_sim_events(world: &mut World) -> Vec<SimEvent> {
    world.resource_mut::<Events<SimEvent>>().drain().collect()
}

/// Builds level data text from rows, adding the header.
pub fn level_data(rows: &[&str]) -> String {
    let mut data = String::from(HEADER);
    for row in rows {
        data.push('\n');
        data.push_str(row);
    }
    data.push('\n');
    data
}

/// Creates a seeded game over in-memory level data.
pub fn create_test_game(rows: &[&str]) -> Game {
    Game::new(LevelCatalog::from_inline(level_data(rows)), Some(SEED))
}

/// Creates a seeded game and starts a run.
pub fn start_test_game(rows: &[&str]) -> Game {
    let mut game = create_test_game(rows);
    game.start().expect("level data should load");
    game
}

pub fn player_position(game: &mut Game) -> Vec2 {
    game.snapshot().player().expect("player should exist").position
}

/// Ticks until the run leaves play or `limit` ticks pass. Returns the number of ticks run.
pub fn tick_until_finished(game: &mut Game, limit: usize) -> usize {
    for tick in 1..=limit {
        game.tick(STEP).expect("tick should succeed");
        if game.run_state().mode != RunMode::Play {
            return tick;
        }
    }
    limit
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with a subscriber at `level` installed on this thread and returns everything it logged.
pub fn capture_logs(level: Level, f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(level)
        .with_writer(buffer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}
