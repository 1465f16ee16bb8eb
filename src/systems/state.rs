use bevy_ecs::event::{EventReader, EventWriter};
use bevy_ecs::resource::Resource;
use bevy_ecs::system::{Res, ResMut};
use strum_macros::IntoStaticStr;
use tracing::info;

use crate::events::{GameEvent, SimEvent};
use crate::systems::components::DeltaTime;
use crate::systems::oxygen::OxygenEconomy;

/// The high-level stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoStaticStr)]
pub enum RunMode {
    /// Waiting for the player to start.
    #[default]
    Menu,
    /// The simulation is ticking.
    Play,
    /// Oxygen ran out.
    Over,
    /// Every level has been completed.
    Clear,
}

impl RunMode {
    /// Whether the run has ended and is waiting for a restart.
    pub fn is_finished(self) -> bool {
        matches!(self, RunMode::Over | RunMode::Clear)
    }
}

/// Everything about the current run that outlives a single level's entities.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct RunState {
    pub mode: RunMode,
    pub level_id: u32,
    /// The highest level id in the level data, read when the run starts.
    pub max_level: u32,
    pub oxygen: OxygenEconomy,
    /// Seconds of play since the run started. Carries over between levels.
    pub elapsed: f32,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            mode: RunMode::Menu,
            level_id: 1,
            max_level: 1,
            oxygen: OxygenEconomy::for_level(1),
            elapsed: 0.0,
        }
    }
}

/// A level change requested during the tick, applied by the controller once the schedule has finished.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingTransition {
    #[default]
    None,
    Advance,
}

/// Evaluates the terminal conditions. Running out of oxygen wins over reaching the exit in the same tick.
pub fn stage_system(
    mut run: ResMut<RunState>,
    mut pending: ResMut<PendingTransition>,
    mut contacts: EventReader<GameEvent>,
    mut notifications: EventWriter<SimEvent>,
) {
    if run.oxygen.is_depleted() {
        run.mode = RunMode::Over;
        info!(level_id = run.level_id, elapsed = run.elapsed, "Oxygen depleted, run over");
        notifications.write(SimEvent::PlayerDied);
        return;
    }

    if contacts.read().any(|event| matches!(event, GameEvent::ExitReached)) {
        *pending = PendingTransition::Advance;
    }
}

/// Accumulates play time.
pub fn clock_system(delta_time: Res<DeltaTime>, mut run: ResMut<RunState>) {
    run.elapsed += delta_time.0;
}
