//! This module contains all the constants used in the game.

use std::time::Duration;

use glam::Vec2;

/// The default length of one simulation step.
pub const LOOP_TIME: Duration = Duration::from_nanos((1_000_000_000.0 / 60.0) as u64);

/// The size of the play window, in world units.
pub const SCREEN_SIZE: Vec2 = Vec2::new(960.0, 640.0);

/// Movement tuning for the player and enemies, in world units per second.
pub mod mechanics {
    /// Player movement speed.
    pub const PLAYER_SPEED: f32 = 180.0;
    /// Enemy speed while wandering around its home anchor.
    pub const ENEMY_WANDER_SPEED: f32 = 110.0;
    /// Enemy speed while chasing a sighted player.
    pub const ENEMY_CHASE_SPEED: f32 = 150.0;
}

/// Hitbox half-extents. Hitboxes are smaller than the drawn sprite so corners do not snag in narrow gaps.
pub mod collider {
    use glam::Vec2;

    pub const PLAYER_HALF_EXTENTS: Vec2 = Vec2::splat(12.0);
    pub const ENEMY_HALF_EXTENTS: Vec2 = Vec2::splat(10.0);
    pub const PICKUP_HALF_EXTENTS: Vec2 = Vec2::new(8.0, 12.0);
    /// Used when an exit record does not specify its own size.
    pub const EXIT_HALF_EXTENTS: Vec2 = Vec2::splat(15.0);
}

/// The oxygen economy.
pub mod oxygen {
    pub const MAX_OXYGEN: f32 = 100.0;
    /// Continuous drain per second of play.
    pub const DRAIN_RATE: f32 = 6.0;
    /// Flat loss for each tick in which the player touches at least one enemy.
    pub const HIT_LOSS: f32 = 18.0;
    /// Crossing this value (inclusive) fires the one-shot low oxygen alert.
    pub const LOW_THRESHOLD: f32 = 25.0;
    /// Refill granted by a canister whose record does not specify an amount.
    pub const DEFAULT_REFILL: f32 = 25.0;
    /// Each level after the first starts with this much less oxygen...
    pub const LEVEL_STEP: f32 = 10.0;
    /// ...but never less than this.
    pub const LEVEL_FLOOR: f32 = 40.0;
}

/// Enemy perception and wandering.
pub mod behavior {
    use std::ops::Range;

    /// Maximum distance at which an enemy can see the player.
    pub const SIGHT_RADIUS: f32 = 480.0;
    /// The range a wander countdown is drawn from, in seconds.
    pub const WANDER_RETARGET_SECONDS: Range<f32> = 0.8..1.8;
    /// Sway radius for enemies whose record omits one.
    pub const DEFAULT_SWAY: f32 = 70.0;
    /// Smallest sway radius a record may request.
    pub const MIN_SWAY: f32 = 40.0;
}

/// Level data defaults.
pub mod level {
    use glam::Vec2;

    use super::SCREEN_SIZE;

    /// Spawn position used when a level has no `start` record.
    pub const DEFAULT_SPAWN: Vec2 = Vec2::new(SCREEN_SIZE.x * 0.1, SCREEN_SIZE.y * 0.1);
    /// Default location of the level data source, relative to the working directory.
    pub const DEFAULT_LEVELS_PATH: &str = "data/levels.csv";
}
