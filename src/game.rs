//! This module contains the run controller: the world, the tick schedule and the run state machine.

use bevy_ecs::entity::Entity;
use bevy_ecs::event::{EventRegistry, Events};
use bevy_ecs::query::With;
use bevy_ecs::schedule::{ExecutorKind, IntoScheduleConfigs, Schedule, SystemSet};
use bevy_ecs::world::World;
use tracing::{debug, info, trace};

use crate::error::{GameError, GameResult};
use crate::events::{GameCommand, GameEvent, SimEvent};
use crate::formatter;
use crate::level::{despawn_level, LevelCatalog, LevelLayout};
use crate::systems::{
    clock_system, contact_system, enemy_behavior_system, enemy_separation_system, integrate_system, obstacle_collision_system,
    oxygen_system, player_intent_system, stage_system, DeltaTime, InputIntent, OxygenEconomy, PendingTransition, PlayerControlled,
    RunMode, RunState, SimRng, Snapshot,
};

/// The phases of a tick, in the order they run. Later phases read what earlier phases wrote, so this
/// order must not change.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum TickPhase {
    /// Input intent becomes the player's velocity.
    Input,
    /// Enemies choose their velocities.
    Behavior,
    /// Velocities are applied to positions.
    Integrate,
    /// Movers are pushed out of walls, then out of each other.
    Resolve,
    /// Player overlaps with enemies, pickups and exits are reported.
    Detect,
    /// Oxygen drain, hits and refills.
    Economy,
    /// Death and exit checks.
    Terminal,
    /// Elapsed play time.
    Clock,
}

/// Owns the simulation and drives it one fixed step at a time.
///
/// The world holds every level entity plus the [`RunState`]; the schedule holds the per-tick systems
/// grouped by [`TickPhase`]. Level transitions happen between schedule runs, never inside one.
pub struct Game {
    pub world: World,
    pub schedule: Schedule,
    catalog: LevelCatalog,
    notifications: Vec<SimEvent>,
    exit_requested: bool,
}

impl Game {
    /// Creates a game sitting in the menu. Nothing is read from the level data until the run starts.
    ///
    /// With a `seed`, enemy wandering is reproducible across runs.
    pub fn new(catalog: LevelCatalog, seed: Option<u64>) -> Self {
        let mut world = World::new();
        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);

        Self::setup_ecs(&mut world);
        Self::insert_resources(&mut world, seed);
        Self::configure_schedule(&mut schedule);

        debug!(source = ?catalog.source(), seeded = seed.is_some(), "Game created");

        Self {
            world,
            schedule,
            catalog,
            notifications: Vec::new(),
            exit_requested: false,
        }
    }

    fn setup_ecs(world: &mut World) {
        EventRegistry::register_event::<GameEvent>(world);
        EventRegistry::register_event::<SimEvent>(world);
    }

    fn insert_resources(world: &mut World, seed: Option<u64>) {
        world.insert_resource(RunState::default());
        world.insert_resource(PendingTransition::default());
        world.insert_resource(InputIntent::empty());
        world.insert_resource(DeltaTime(0.0));
        world.insert_resource(match seed {
            Some(seed) => SimRng::seeded(seed),
            None => SimRng::from_entropy(),
        });
    }

    fn configure_schedule(schedule: &mut Schedule) {
        schedule
            .add_systems((
                player_intent_system.in_set(TickPhase::Input),
                enemy_behavior_system.in_set(TickPhase::Behavior),
                integrate_system.in_set(TickPhase::Integrate),
                (obstacle_collision_system, enemy_separation_system)
                    .chain()
                    .in_set(TickPhase::Resolve),
                contact_system.in_set(TickPhase::Detect),
                oxygen_system.in_set(TickPhase::Economy),
                stage_system.in_set(TickPhase::Terminal),
                clock_system.in_set(TickPhase::Clock),
            ))
            .configure_sets(
                (
                    TickPhase::Input,
                    TickPhase::Behavior,
                    TickPhase::Integrate,
                    TickPhase::Resolve,
                    TickPhase::Detect,
                    TickPhase::Economy,
                    TickPhase::Terminal,
                    TickPhase::Clock,
                )
                    .chain(),
            );
    }

    /// Handles a discrete input.
    ///
    /// `Confirm` starts a run from the menu and restarts one that has ended; it is ignored mid-run.
    ///
    /// # Errors
    ///
    /// Propagates the level data errors of [`start`](Self::start).
    pub fn handle_command(&mut self, command: GameCommand) -> GameResult<()> {
        match command {
            GameCommand::Confirm => match self.run_state().mode {
                RunMode::Menu => self.start(),
                RunMode::Over | RunMode::Clear => self.restart(),
                RunMode::Play => {
                    trace!("Confirm ignored during play");
                    Ok(())
                }
            },
            GameCommand::Exit => {
                info!("Exit requested");
                self.exit_requested = true;
                Ok(())
            }
        }
    }

    /// Begins a run at level 1, resetting every piece of run state.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the level data cannot be read. The game stays where it was.
    pub fn start(&mut self) -> GameResult<()> {
        let records = self.catalog.load(1)?;
        let max_level = self.catalog.max_level();

        *self.world.resource_mut::<RunState>() = RunState {
            mode: RunMode::Play,
            level_id: 1,
            max_level,
            oxygen: OxygenEconomy::for_level(1),
            elapsed: 0.0,
        };
        *self.world.resource_mut::<PendingTransition>() = PendingTransition::None;
        self.world.insert_resource(InputIntent::empty());
        self.world.resource_mut::<Events<GameEvent>>().clear();

        info!(max_level, "Run started");
        self.build_level(1, LevelLayout::from_records(records));
        Ok(())
    }

    /// Starts over from level 1 after a run has ended. Equivalent to [`start`](Self::start).
    pub fn restart(&mut self) -> GameResult<()> {
        info!(previous = ?self.run_state().mode, "Restarting run");
        self.start()
    }

    /// Sets the movement intent used by every following tick until it is changed.
    pub fn set_intent(&mut self, intent: InputIntent) {
        self.world.insert_resource(intent);
    }

    /// Advances the simulation by `dt` seconds. Does nothing unless a run is in play.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the next level's data could not be read after reaching an exit,
    /// and [`GameError::InvalidState`] if a run is in play without a player entity.
    pub fn tick(&mut self, dt: f32) -> GameResult<()> {
        formatter::increment_tick();
        if self.run_state().mode != RunMode::Play {
            return Ok(());
        }

        let players = self.world.query_filtered::<Entity, With<PlayerControlled>>().iter(&self.world).count();
        if players != 1 {
            return Err(GameError::InvalidState(format!("expected one player in play, found {players}")));
        }

        self.world.insert_resource(DeltaTime(dt));
        self.schedule.run(&mut self.world);

        self.world.resource_mut::<Events<GameEvent>>().clear();
        self.notifications
            .extend(self.world.resource_mut::<Events<SimEvent>>().drain());

        let pending = std::mem::take(&mut *self.world.resource_mut::<PendingTransition>());
        if pending == PendingTransition::Advance && self.run_state().mode == RunMode::Play {
            self.advance()?;
        }

        Ok(())
    }

    /// Moves on to the next level, or clears the run when there is none.
    fn advance(&mut self) -> GameResult<()> {
        let run = self.run_state();
        let next = run.level_id + 1;
        if next > run.max_level {
            self.clear_run(run.level_id);
            return Ok(());
        }

        let layout = LevelLayout::from_records(self.catalog.load(next)?);
        if self.build_level(next, layout) {
            info!(level_id = next, elapsed = run.elapsed, "Level advanced");
            self.notifications.push(SimEvent::LevelAdvanced { level_id: next });
        }
        Ok(())
    }

    /// Replaces the level entities and resets per-level state. An exhausted level clears the run.
    ///
    /// Returns whether a level was built.
    fn build_level(&mut self, level_id: u32, layout: Option<LevelLayout>) -> bool {
        let Some(layout) = layout else {
            despawn_level(&mut self.world);
            self.clear_run(level_id);
            return false;
        };

        layout.spawn(&mut self.world);
        let mut run = self.world.resource_mut::<RunState>();
        run.level_id = level_id;
        run.oxygen = OxygenEconomy::for_level(level_id);
        debug!(level_id, oxygen = run.oxygen.value(), "Level built");
        true
    }

    fn clear_run(&mut self, level_id: u32) {
        let mut run = self.world.resource_mut::<RunState>();
        run.mode = RunMode::Clear;
        info!(level_id, elapsed = run.elapsed, "Run cleared");
        self.notifications.push(SimEvent::RunCleared);
    }

    pub fn run_state(&self) -> RunState {
        *self.world.resource::<RunState>()
    }

    /// Whether an `Exit` command has been received.
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// A copy of the current state for rendering.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::capture(&mut self.world)
    }

    /// Takes every notification emitted since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.notifications)
    }
}
