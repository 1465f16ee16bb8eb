use std::f32::consts::TAU;

use bevy_ecs::component::Component;
use bevy_ecs::query::{With, Without};
use bevy_ecs::system::{Query, Res, ResMut};
use glam::Vec2;
use rand::Rng;
use strum_macros::IntoStaticStr;
use tracing::debug;

use crate::constants::{
    behavior::{SIGHT_RADIUS, WANDER_RETARGET_SECONDS},
    mechanics::{ENEMY_CHASE_SPEED, ENEMY_WANDER_SPEED},
};
use crate::systems::collision::Aabb;
use crate::systems::components::{DeltaTime, Hitbox, Obstacle, PlayerControlled, Position, SimRng, Velocity};

/// What an enemy is currently doing. There is no terminal mode; enemies flip between these for as long
/// as they exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoStaticStr)]
pub enum BehaviorMode {
    #[default]
    Wander,
    Chase,
}

/// Per-enemy behavior state, owned by the enemy entity itself.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct EnemyBehavior {
    pub mode: BehaviorMode,
    /// The wander anchor, which is the enemy's spawn position.
    pub home: Vec2,
    /// How far from `home` the enemy may drift before it turns back.
    pub sway: f32,
    /// Unit wander direction, or zero before the first retarget.
    pub heading: Vec2,
    /// Seconds until the next wander retarget.
    pub wander_timer: f32,
}

impl EnemyBehavior {
    pub fn new(home: Vec2, sway: f32) -> Self {
        Self {
            mode: BehaviorMode::Wander,
            home,
            sway,
            heading: Vec2::ZERO,
            wander_timer: 0.0,
        }
    }

    /// Advances the state machine by one tick and returns the enemy's new velocity.
    ///
    /// `sighted` is the result of the line-of-sight check against `target`.
    pub fn steer(&mut self, position: Vec2, target: Vec2, sighted: bool, dt: f32, rng: &mut impl Rng) -> Vec2 {
        let mode = if sighted { BehaviorMode::Chase } else { BehaviorMode::Wander };
        if mode != self.mode {
            debug!(from = <&'static str>::from(self.mode), to = <&'static str>::from(mode), ?position, "Enemy behavior changed");
            self.mode = mode;
        }

        match self.mode {
            // An enemy sitting exactly on the player has no direction to chase in.
            BehaviorMode::Chase => (target - position).normalize_or_zero() * ENEMY_CHASE_SPEED,
            BehaviorMode::Wander => self.wander(position, dt, rng) * ENEMY_WANDER_SPEED,
        }
    }

    fn wander(&mut self, position: Vec2, dt: f32, rng: &mut impl Rng) -> Vec2 {
        self.wander_timer -= dt;
        if self.wander_timer <= 0.0 || self.heading == Vec2::ZERO {
            let angle = rng.random_range(0.0..TAU);
            self.wander_timer = rng.random_range(WANDER_RETARGET_SECONDS);

            let to_home = self.home - position;
            self.heading = if to_home.length() > self.sway {
                to_home.normalize()
            } else {
                Vec2::from_angle(angle)
            };
        }
        self.heading
    }
}

/// Whether `viewer` can see `target`: within [`SIGHT_RADIUS`] and with no obstacle crossing the segment
/// between them. The range check runs first, and the result does not depend on which point is the viewer.
pub fn has_line_of_sight(viewer: Vec2, target: Vec2, obstacles: &[Aabb]) -> bool {
    viewer.distance(target) <= SIGHT_RADIUS && !obstacles.iter().any(|obstacle| obstacle.intersects_segment(viewer, target))
}

/// Chooses every enemy's velocity for this tick.
pub fn enemy_behavior_system(
    delta_time: Res<DeltaTime>,
    mut rng: ResMut<SimRng>,
    player: Query<&Position, With<PlayerControlled>>,
    obstacles: Query<(&Position, &Hitbox), With<Obstacle>>,
    mut enemies: Query<(&mut EnemyBehavior, &Position, &mut Velocity), Without<PlayerControlled>>,
) {
    let obstacles: Vec<Aabb> = obstacles.iter().map(|(position, hitbox)| hitbox.at(position.0)).collect();
    let target = player.single().ok().map(|position| position.0);

    for (mut behavior, position, mut velocity) in enemies.iter_mut() {
        let sighted = target.is_some_and(|target| has_line_of_sight(position.0, target, &obstacles));
        let target = target.unwrap_or(position.0);
        velocity.0 = behavior.steer(position.0, target, sighted, delta_time.0, &mut rng.0);
    }
}
