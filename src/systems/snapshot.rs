//! Read-only copies of the simulation for renderers.

use bevy_ecs::world::World;
use glam::Vec2;

use crate::systems::components::{EntityKind, Hitbox, Position};
use crate::systems::enemy::{BehaviorMode, EnemyBehavior};
use crate::systems::state::RunState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntitySnapshot {
    pub kind: EntityKind,
    pub position: Vec2,
    pub half_extents: Vec2,
    /// Only present for enemies.
    pub mode: Option<BehaviorMode>,
}

/// The state of the world after a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub run: RunState,
    pub entities: Vec<EntitySnapshot>,
}

impl Snapshot {
    pub fn capture(world: &mut World) -> Self {
        let run = world.get_resource::<RunState>().copied().unwrap_or_default();
        let mut query = world.query::<(&EntityKind, &Position, &Hitbox, Option<&EnemyBehavior>)>();
        let entities = query
            .iter(world)
            .map(|(kind, position, hitbox, behavior)| EntitySnapshot {
                kind: *kind,
                position: position.0,
                half_extents: hitbox.half_extents,
                mode: behavior.map(|behavior| behavior.mode),
            })
            .collect();

        Self { run, entities }
    }

    pub fn player(&self) -> Option<&EntitySnapshot> {
        self.of_kind(EntityKind::Player).next()
    }

    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &EntitySnapshot> {
        self.entities.iter().filter(move |entity| entity.kind == kind)
    }
}
