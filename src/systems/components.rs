use bevy_ecs::{bundle::Bundle, component::Component, resource::Resource};
use bitflags::bitflags;
use glam::Vec2;
use rand::{rngs::SmallRng, SeedableRng};
use strum_macros::IntoStaticStr;

use crate::systems::{collision::Aabb, enemy::EnemyBehavior};

/// A tag component for entities that are controlled by the player.
#[derive(Default, Component)]
pub struct PlayerControlled;

/// A tag component denoting the type of entity, used by the render snapshot.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
pub enum EntityKind {
    Player,
    Enemy,
    Pickup,
    Wall,
    Door,
    Exit,
}

/// The center of an entity in world units.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Position(pub Vec2);

/// Movement in world units per second.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity(pub Vec2);

/// Where a moving entity stood before this tick's integration.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct PreviousPosition(pub Vec2);

/// An axis-aligned hitbox centered on the entity's [`Position`].
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub half_extents: Vec2,
}

impl Hitbox {
    pub fn new(half_extents: Vec2) -> Self {
        Self { half_extents }
    }

    /// A hitbox covering a rectangle of the given full size.
    pub fn from_size(size: Vec2) -> Self {
        Self::new(size * 0.5)
    }

    pub fn at(&self, position: Vec2) -> Aabb {
        Aabb::new(position, self.half_extents)
    }
}

/// Static geometry that movers cannot pass through. Walls and doors both carry this.
#[derive(Default, Component)]
pub struct Obstacle;

/// An oxygen canister, removed from the world once collected.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub refill: f32,
}

/// Touching this advances the run to the next level.
#[derive(Default, Component)]
pub struct ExitZone;

/// Marks everything spawned from level data so a rebuild can clear it.
#[derive(Default, Component)]
pub struct LevelEntity;

#[derive(Bundle)]
pub struct PlayerBundle {
    pub player: PlayerControlled,
    pub position: Position,
    pub previous: PreviousPosition,
    pub velocity: Velocity,
    pub hitbox: Hitbox,
    pub kind: EntityKind,
    pub level: LevelEntity,
}

#[derive(Bundle)]
pub struct EnemyBundle {
    pub behavior: EnemyBehavior,
    pub position: Position,
    pub previous: PreviousPosition,
    pub velocity: Velocity,
    pub hitbox: Hitbox,
    pub kind: EntityKind,
    pub level: LevelEntity,
}

#[derive(Bundle)]
pub struct PickupBundle {
    pub pickup: Pickup,
    pub position: Position,
    pub hitbox: Hitbox,
    pub kind: EntityKind,
    pub level: LevelEntity,
}

#[derive(Bundle)]
pub struct ObstacleBundle {
    pub obstacle: Obstacle,
    pub position: Position,
    pub hitbox: Hitbox,
    pub kind: EntityKind,
    pub level: LevelEntity,
}

#[derive(Bundle)]
pub struct ExitBundle {
    pub exit: ExitZone,
    pub position: Position,
    pub hitbox: Hitbox,
    pub kind: EntityKind,
    pub level: LevelEntity,
}

/// Length of the current tick, in seconds.
#[derive(Resource, Debug, Clone, Copy)]
pub struct DeltaTime(pub f32);

bitflags! {
    /// The resolved movement intent for the current tick.
    #[derive(Resource, Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct InputIntent: u8 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

impl InputIntent {
    /// The unit direction of the intent, or zero when nothing is held or opposing keys cancel.
    pub fn direction(self) -> Vec2 {
        let axis = |positive: Self, negative: Self| {
            let mut value = 0.0;
            if self.contains(positive) {
                value += 1.0;
            }
            if self.contains(negative) {
                value -= 1.0;
            }
            value
        };

        Vec2::new(axis(Self::RIGHT, Self::LEFT), axis(Self::UP, Self::DOWN)).normalize_or_zero()
    }

    /// The intent closest to travelling along `direction`, using a dead zone to avoid jitter.
    pub fn toward(direction: Vec2) -> Self {
        const DEAD_ZONE: f32 = 0.25;

        let direction = direction.normalize_or_zero();
        let mut intent = Self::empty();
        intent.set(Self::RIGHT, direction.x > DEAD_ZONE);
        intent.set(Self::LEFT, direction.x < -DEAD_ZONE);
        intent.set(Self::UP, direction.y > DEAD_ZONE);
        intent.set(Self::DOWN, direction.y < -DEAD_ZONE);
        intent
    }
}

/// The single source of randomness for the simulation. Seeding it makes enemy behavior reproducible.
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub SmallRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self(SmallRng::from_os_rng())
    }
}
