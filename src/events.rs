use bevy_ecs::{entity::Entity, event::Event};

/// Discrete inputs from the presentation layer.
///
/// Movement is not a command; it is a continuous [`InputIntent`](crate::systems::InputIntent) read every tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameCommand {
    /// Start a run from the menu, or restart after the run ended.
    Confirm,
    Exit,
}

/// Overlaps detected during a tick, consumed by the economy and stage systems of the same tick.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub enum GameEvent {
    /// The player is touching `count` enemies.
    EnemyContact { count: usize },
    /// The player is touching a pickup.
    PickupTouched { pickup: Entity, refill: f32 },
    /// The player is touching the level exit.
    ExitReached,
}

/// Notifications for audio, effects and any other observer of the simulation.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub enum SimEvent {
    EnemyHit { contacts: usize },
    PickupCollected { refill: f32 },
    /// Oxygen dropped to the low threshold. Fires once per crossing.
    LowOxygen,
    LevelAdvanced { level_id: u32 },
    PlayerDied,
    RunCleared,
}
