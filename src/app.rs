use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::oxygen::MAX_OXYGEN;
use crate::error::GameResult;
use crate::events::{GameCommand, SimEvent};
use crate::game::Game;
use crate::level::LevelCatalog;
use crate::systems::{EntityKind, InputIntent, Snapshot};

/// Steers the player without a human at the keyboard.
///
/// Heads for the nearest oxygen canister while below half oxygen, otherwise for the nearest exit. It makes
/// no attempt to path around walls; a blocked autopilot simply slides along them.
#[derive(Debug, Default, Clone, Copy)]
pub struct Autopilot;

impl Autopilot {
    pub fn steer(&self, snapshot: &Snapshot) -> InputIntent {
        let Some(player) = snapshot.player() else {
            return InputIntent::empty();
        };

        let nearest = |kind: EntityKind| {
            snapshot
                .of_kind(kind)
                .map(|entity| entity.position)
                .min_by(|a, b| a.distance_squared(player.position).total_cmp(&b.distance_squared(player.position)))
        };

        let goal = if snapshot.run.oxygen.value() < MAX_OXYGEN * 0.5 {
            nearest(EntityKind::Pickup).or_else(|| nearest(EntityKind::Exit))
        } else {
            nearest(EntityKind::Exit)
        };

        goal.map(|goal| InputIntent::toward(goal - player.position)).unwrap_or_default()
    }
}

/// Headless application wrapper that owns the game and runs it at a fixed step.
pub struct App {
    pub game: Game,
    autopilot: Autopilot,
    step: f32,
    loop_time: Duration,
    realtime: bool,
    max_ticks: Option<u64>,
    ticks: u64,
}

impl App {
    /// Creates the game and starts a run immediately.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the level data is missing or unreadable.
    pub fn new(config: &Config) -> GameResult<Self> {
        info!(levels = %config.levels_path.display(), tick_rate = config.tick_rate, "Initializing application");
        let catalog = LevelCatalog::from_path(&config.levels_path);
        let mut game = Game::new(catalog, config.seed);
        game.handle_command(GameCommand::Confirm)?;

        Ok(App {
            game,
            autopilot: Autopilot,
            step: config.step_seconds(),
            loop_time: Duration::from_secs_f32(config.step_seconds()),
            realtime: config.realtime,
            max_ticks: config.max_ticks,
            ticks: 0,
        })
    }

    /// Runs one fixed step and sleeps off whatever remains of it.
    ///
    /// Returns `false` once the run has ended, an exit was requested, or the tick limit was reached.
    pub fn run(&mut self) -> GameResult<bool> {
        let start = Instant::now();

        let snapshot = self.game.snapshot();
        self.game.set_intent(self.autopilot.steer(&snapshot));
        self.game.tick(self.step)?;
        self.ticks += 1;

        for event in self.game.drain_events() {
            report(event);
        }

        let run = self.game.run_state();
        if run.mode.is_finished() || self.game.exit_requested() {
            info!(
                mode = <&'static str>::from(run.mode),
                level_id = run.level_id,
                elapsed = format!("{:.2}s", run.elapsed),
                oxygen = run.oxygen.value(),
                ticks = self.ticks,
                "Run finished"
            );
            return Ok(false);
        }

        if self.max_ticks.is_some_and(|max| self.ticks >= max) {
            info!(ticks = self.ticks, level_id = run.level_id, "Tick limit reached");
            return Ok(false);
        }

        if self.realtime {
            let remaining = self.loop_time.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                warn!(behind = ?(start.elapsed() - self.loop_time), "Tick took longer than its step");
            } else {
                spin_sleep::sleep(remaining);
            }
        }

        Ok(true)
    }
}

fn report(event: SimEvent) {
    match event {
        SimEvent::EnemyHit { contacts } => info!(contacts, "Hit by enemy"),
        SimEvent::PickupCollected { refill } => debug!(refill, "Oxygen collected"),
        SimEvent::LowOxygen => warn!("Oxygen low"),
        SimEvent::LevelAdvanced { level_id } => info!(level_id, "Entered level"),
        SimEvent::PlayerDied => info!("Out of oxygen"),
        SimEvent::RunCleared => info!("Station escaped"),
    }
}
