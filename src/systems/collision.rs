use bevy_ecs::entity::Entity;
use bevy_ecs::event::EventWriter;
use bevy_ecs::query::{With, Without};
use bevy_ecs::system::Query;
use glam::Vec2;
use tracing::trace;

use crate::events::GameEvent;
use crate::systems::components::{ExitZone, Hitbox, Obstacle, Pickup, PlayerControlled, Position, PreviousPosition, Velocity};
use crate::systems::enemy::EnemyBehavior;

/// An axis-aligned bounding box described by its center and half-extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half_extents: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self { center, half_extents }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Whether the two boxes share interior area. Boxes that only touch along an edge do not overlap,
    /// so an entity may rest flush against a wall.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let gap = (self.center - other.center).abs();
        let reach = self.half_extents + other.half_extents;
        gap.x < reach.x && gap.y < reach.y
    }

    /// Whether the segment from `from` to `to` passes through or touches this box.
    pub fn intersects_segment(&self, from: Vec2, to: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        let delta = to - from;
        let mut entry: f32 = 0.0;
        let mut exit: f32 = 1.0;

        for axis in 0..2 {
            if delta[axis].abs() <= f32::EPSILON {
                // Parallel to this slab: either always inside it or never.
                if from[axis] < min[axis] || from[axis] > max[axis] {
                    return false;
                }
                continue;
            }

            let near = (min[axis] - from[axis]) / delta[axis];
            let far = (max[axis] - from[axis]) / delta[axis];
            entry = entry.max(near.min(far));
            exit = exit.min(near.max(far));
            if entry > exit {
                return false;
            }
        }

        true
    }
}

/// Moves an entity from `previous` toward `next` without ending inside any obstacle.
///
/// The full displacement is tried first. If it overlaps, the X component is rolled back and the move
/// retried, then the Y component alone, and finally the entity returns to `previous`. The second value
/// is `true` whenever any rollback happened, in which case the caller should zero the entity's velocity.
///
/// A mover that is already inside an obstacle at `previous` is left free to move so it can work its way
/// out; rolling it back would pin it there.
pub fn separate(previous: Vec2, next: Vec2, half_extents: Vec2, obstacles: &[Aabb]) -> (Vec2, bool) {
    let blocked = |position: Vec2| {
        let hitbox = Aabb::new(position, half_extents);
        obstacles.iter().any(|obstacle| hitbox.overlaps(obstacle))
    };

    if !blocked(next) {
        return (next, false);
    }

    if blocked(previous) {
        trace!(?previous, ?next, "Mover is inside an obstacle, not rolling back");
        return (next, false);
    }

    (roll_back_axes(previous, next, blocked).unwrap_or(previous), true)
}

/// Tries rolling back X alone, then Y alone. Returns the first candidate that is not blocked.
fn roll_back_axes(previous: Vec2, next: Vec2, blocked: impl Fn(Vec2) -> bool) -> Option<Vec2> {
    [Vec2::new(previous.x, next.y), Vec2::new(next.x, previous.y)]
        .into_iter()
        .find(|candidate| !blocked(*candidate))
}

fn obstacle_boxes<'a>(obstacles: impl Iterator<Item = (&'a Position, &'a Hitbox)>) -> Vec<Aabb> {
    obstacles.map(|(position, hitbox)| hitbox.at(position.0)).collect()
}

/// Corrects the player, then every enemy, against the static obstacles of the level.
pub fn obstacle_collision_system(
    obstacles: Query<(&Position, &Hitbox), (With<Obstacle>, Without<PlayerControlled>, Without<EnemyBehavior>)>,
    mut player: Query<(&mut Position, &PreviousPosition, &mut Velocity, &Hitbox), With<PlayerControlled>>,
    mut enemies: Query<(&mut Position, &PreviousPosition, &mut Velocity, &Hitbox), (With<EnemyBehavior>, Without<PlayerControlled>)>,
) {
    let obstacles = obstacle_boxes(obstacles.iter());
    if obstacles.is_empty() {
        return;
    }

    for (mut position, previous, mut velocity, hitbox) in player.iter_mut().chain(enemies.iter_mut()) {
        let (corrected, cleared) = separate(previous.0, position.0, hitbox.half_extents, &obstacles);
        if cleared {
            trace!(from = ?position.0, to = ?corrected, "Mover rolled back from obstacle");
            position.0 = corrected;
            velocity.0 = Vec2::ZERO;
        }
    }
}

/// Rolls back enemies that moved into, or deeper into, another enemy.
///
/// Enemies are settled in query order. Each candidate position must also stay clear of walls, so this
/// never undoes the obstacle correction that ran before it. An overlap that was already there at the
/// start of the tick only blocks moves that do not increase the distance between the two, so enemies
/// spawned on top of each other drift apart instead of freezing.
pub fn enemy_separation_system(
    obstacles: Query<(&Position, &Hitbox), (With<Obstacle>, Without<EnemyBehavior>)>,
    mut enemies: Query<(Entity, &mut Position, &PreviousPosition, &mut Velocity, &Hitbox), With<EnemyBehavior>>,
) {
    let obstacles = obstacle_boxes(obstacles.iter());
    let mut settled: Vec<(Entity, Vec2, Vec2, Vec2)> = enemies
        .iter()
        .map(|(entity, position, previous, _, hitbox)| (entity, previous.0, position.0, hitbox.half_extents))
        .collect();

    for index in 0..settled.len() {
        let (entity, previous, current, half_extents) = settled[index];
        let blocked = |position: Vec2| {
            let hitbox = Aabb::new(position, half_extents);
            let before = Aabb::new(previous, half_extents);
            obstacles.iter().any(|obstacle| hitbox.overlaps(obstacle))
                || settled.iter().enumerate().any(|(other, &(_, _, center, half))| {
                    let other_box = Aabb::new(center, half);
                    other != index
                        && hitbox.overlaps(&other_box)
                        && (!before.overlaps(&other_box) || position.distance(center) <= previous.distance(center))
                })
        };

        if current == previous || !blocked(current) {
            continue;
        }

        let corrected = roll_back_axes(previous, current, blocked).unwrap_or(previous);
        trace!(?entity, from = ?current, to = ?corrected, "Enemy separated from another enemy");
        settled[index].2 = corrected;

        if let Ok((_, mut position, _, mut velocity, _)) = enemies.get_mut(entity) {
            position.0 = corrected;
            velocity.0 = Vec2::ZERO;
        }
    }
}

/// Detects what the player is touching and reports it for the economy and stage systems.
pub fn contact_system(
    player: Query<(&Position, &Hitbox), With<PlayerControlled>>,
    enemies: Query<(&Position, &Hitbox), With<EnemyBehavior>>,
    pickups: Query<(Entity, &Position, &Hitbox, &Pickup)>,
    exits: Query<(&Position, &Hitbox), With<ExitZone>>,
    mut events: EventWriter<GameEvent>,
) {
    let Ok((position, hitbox)) = player.single() else {
        return;
    };
    let player_box = hitbox.at(position.0);
    let touching = |(position, hitbox): (&Position, &Hitbox)| player_box.overlaps(&hitbox.at(position.0));

    let count = enemies.iter().filter(|&enemy| touching(enemy)).count();
    if count > 0 {
        events.write(GameEvent::EnemyContact { count });
    }

    for (entity, position, hitbox, pickup) in pickups.iter() {
        if touching((position, hitbox)) {
            events.write(GameEvent::PickupTouched {
                pickup: entity,
                refill: pickup.refill,
            });
        }
    }

    if exits.iter().any(touching) {
        events.write(GameEvent::ExitReached);
    }
}
