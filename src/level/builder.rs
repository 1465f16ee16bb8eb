//! Level construction: turning records into a typed layout, and the layout into entities.

use bevy_ecs::entity::Entity;
use bevy_ecs::query::With;
use bevy_ecs::world::World;
use glam::Vec2;
use tracing::{debug, warn};

use crate::constants::{
    behavior::{DEFAULT_SWAY, MIN_SWAY},
    collider::{ENEMY_HALF_EXTENTS, EXIT_HALF_EXTENTS, PICKUP_HALF_EXTENTS, PLAYER_HALF_EXTENTS},
    level::DEFAULT_SPAWN,
    oxygen::DEFAULT_REFILL,
};
use crate::level::parser::{LevelRecord, RecordKind};
use crate::systems::{
    collision::Aabb,
    components::{
        EnemyBundle, EntityKind, ExitBundle, ExitZone, Hitbox, LevelEntity, Obstacle, ObstacleBundle, Pickup, PickupBundle,
        PlayerBundle, PlayerControlled, Position, PreviousPosition, Velocity,
    },
    enemy::EnemyBehavior,
};

/// A wall or door.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstaclePlacement {
    pub kind: EntityKind,
    pub bounds: Aabb,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyPlacement {
    pub position: Vec2,
    pub sway: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickupPlacement {
    pub position: Vec2,
    pub refill: f32,
}

/// The typed contents of one level, with every record default resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelLayout {
    /// Where the player appears.
    pub start: Vec2,
    pub obstacles: Vec<ObstaclePlacement>,
    pub enemies: Vec<EnemyPlacement>,
    pub pickups: Vec<PickupPlacement>,
    pub exits: Vec<Aabb>,
}

impl LevelLayout {
    /// Resolves a level's records into a layout.
    ///
    /// Returns `None` when there are no records at all, meaning the level data is exhausted.
    /// If several `start` records are present the last one wins.
    pub fn from_records(records: impl IntoIterator<Item = LevelRecord>) -> Option<Self> {
        let mut layout = LevelLayout {
            start: DEFAULT_SPAWN,
            ..Default::default()
        };
        let mut seen = 0usize;

        for record in records {
            seen += 1;
            match record.kind {
                RecordKind::Start => layout.start = record.center(),
                RecordKind::Wall | RecordKind::Door => {
                    if record.w <= 0.0 || record.h <= 0.0 {
                        warn!(kind = <&'static str>::from(record.kind), x = record.x, y = record.y, "Skipping obstacle without a positive size");
                        continue;
                    }
                    let kind = match record.kind {
                        RecordKind::Door => EntityKind::Door,
                        _ => EntityKind::Wall,
                    };
                    layout.obstacles.push(ObstaclePlacement {
                        kind,
                        bounds: Aabb::new(record.center(), record.size() * 0.5),
                    });
                }
                RecordKind::Enemy => layout.enemies.push(EnemyPlacement {
                    position: record.center(),
                    sway: if record.param != 0.0 {
                        record.param.max(MIN_SWAY)
                    } else {
                        DEFAULT_SWAY
                    },
                }),
                RecordKind::Oxygen => layout.pickups.push(PickupPlacement {
                    position: record.center(),
                    refill: if record.param != 0.0 { record.param } else { DEFAULT_REFILL },
                }),
                RecordKind::Exit => {
                    let half_extents = if record.w > 0.0 && record.h > 0.0 {
                        record.size() * 0.5
                    } else {
                        EXIT_HALF_EXTENTS
                    };
                    layout.exits.push(Aabb::new(record.center(), half_extents));
                }
            }
        }

        if seen == 0 {
            return None;
        }

        if layout.is_obstructed(layout.start, PLAYER_HALF_EXTENTS) {
            if layout.is_obstructed(DEFAULT_SPAWN, PLAYER_HALF_EXTENTS) {
                warn!(start = ?layout.start, "Player spawn overlaps an obstacle and the default spawn is blocked too");
            } else {
                warn!(start = ?layout.start, fallback = ?DEFAULT_SPAWN, "Player spawn overlaps an obstacle, using the default spawn");
                layout.start = DEFAULT_SPAWN;
            }
        }

        let obstacles = &layout.obstacles;
        layout.enemies.retain(|enemy| {
            let enemy_box = Aabb::new(enemy.position, ENEMY_HALF_EXTENTS);
            let clear = !obstacles.iter().any(|obstacle| obstacle.bounds.overlaps(&enemy_box));
            if !clear {
                warn!(position = ?enemy.position, "Skipping enemy placed inside an obstacle");
            }
            clear
        });
        if layout.exits.is_empty() {
            warn!("Level has no exit");
        }

        Some(layout)
    }

    /// Whether a hitbox of `half_extents` centered on `position` overlaps any obstacle.
    pub fn is_obstructed(&self, position: Vec2, half_extents: Vec2) -> bool {
        let hitbox = Aabb::new(position, half_extents);
        self.obstacles.iter().any(|obstacle| obstacle.bounds.overlaps(&hitbox))
    }

    /// Replaces every level entity in `world` with this layout. Returns the player entity.
    pub fn spawn(&self, world: &mut World) -> Entity {
        despawn_level(world);

        for obstacle in &self.obstacles {
            world.spawn(ObstacleBundle {
                obstacle: Obstacle,
                position: Position(obstacle.bounds.center),
                hitbox: Hitbox::new(obstacle.bounds.half_extents),
                kind: obstacle.kind,
                level: LevelEntity,
            });
        }

        for exit in &self.exits {
            world.spawn(ExitBundle {
                exit: ExitZone,
                position: Position(exit.center),
                hitbox: Hitbox::new(exit.half_extents),
                kind: EntityKind::Exit,
                level: LevelEntity,
            });
        }

        for pickup in &self.pickups {
            world.spawn(PickupBundle {
                pickup: Pickup { refill: pickup.refill },
                position: Position(pickup.position),
                hitbox: Hitbox::new(PICKUP_HALF_EXTENTS),
                kind: EntityKind::Pickup,
                level: LevelEntity,
            });
        }

        for enemy in &self.enemies {
            world.spawn(EnemyBundle {
                behavior: EnemyBehavior::new(enemy.position, enemy.sway),
                position: Position(enemy.position),
                previous: PreviousPosition(enemy.position),
                velocity: Velocity::default(),
                hitbox: Hitbox::new(ENEMY_HALF_EXTENTS),
                kind: EntityKind::Enemy,
                level: LevelEntity,
            });
        }

        let player = world
            .spawn(PlayerBundle {
                player: PlayerControlled,
                position: Position(self.start),
                previous: PreviousPosition(self.start),
                velocity: Velocity::default(),
                hitbox: Hitbox::new(PLAYER_HALF_EXTENTS),
                kind: EntityKind::Player,
                level: LevelEntity,
            })
            .id();

        debug!(
            obstacles = self.obstacles.len(),
            enemies = self.enemies.len(),
            pickups = self.pickups.len(),
            exits = self.exits.len(),
            start = ?self.start,
            "Level entities spawned"
        );

        player
    }
}

/// Removes every entity spawned from level data.
pub fn despawn_level(world: &mut World) {
    let stale: Vec<Entity> = world.query_filtered::<Entity, With<LevelEntity>>().iter(world).collect();
    for entity in stale {
        world.despawn(entity);
    }
}
