//! The oxygen economy: a countdown that drains continuously, drops sharply on enemy contact and is topped
//! up by canisters.

use bevy_ecs::entity::Entity;
use bevy_ecs::event::{EventReader, EventWriter};
use bevy_ecs::system::{Commands, Res, ResMut};
use smallvec::SmallVec;
use tracing::debug;

use crate::constants::oxygen::{DRAIN_RATE, HIT_LOSS, LEVEL_FLOOR, LEVEL_STEP, LOW_THRESHOLD, MAX_OXYGEN};
use crate::events::{GameEvent, SimEvent};
use crate::systems::components::DeltaTime;
use crate::systems::state::RunState;

/// The player's oxygen supply. The value is kept within `[0, MAX_OXYGEN]` after every change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OxygenEconomy {
    value: f32,
    low_alerted: bool,
}

impl Default for OxygenEconomy {
    fn default() -> Self {
        Self::new(MAX_OXYGEN)
    }
}

impl OxygenEconomy {
    pub fn new(value: f32) -> Self {
        Self {
            value: value.clamp(0.0, MAX_OXYGEN),
            low_alerted: false,
        }
    }

    /// Oxygen at the start of `level_id`: each level after the first starts lower, down to a floor.
    pub fn baseline(level_id: u32) -> f32 {
        let penalty = level_id.saturating_sub(1) as f32 * LEVEL_STEP;
        (MAX_OXYGEN - penalty).max(LEVEL_FLOOR)
    }

    pub fn for_level(level_id: u32) -> Self {
        Self::new(Self::baseline(level_id))
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Overwrites the current value. The low alert is re-armed or fired on the next [`poll_low_alert`](Self::poll_low_alert).
    pub fn set(&mut self, value: f32) {
        self.value = value.clamp(0.0, MAX_OXYGEN);
    }

    pub fn is_depleted(&self) -> bool {
        self.value <= 0.0
    }

    pub fn is_low(&self) -> bool {
        self.value <= LOW_THRESHOLD
    }

    /// Continuous drain for `dt` seconds of play.
    pub fn tick(&mut self, dt: f32) {
        self.set(self.value - DRAIN_RATE * dt);
    }

    /// Charges one flat penalty if any enemy is touching, regardless of how many.
    ///
    /// Returns whether a penalty was charged.
    pub fn apply_hit(&mut self, contacts: usize) -> bool {
        if contacts == 0 {
            return false;
        }
        self.set(self.value - HIT_LOSS);
        true
    }

    pub fn apply_pickup(&mut self, amount: f32) {
        self.set(self.value + amount);
    }

    /// Returns `true` exactly once each time oxygen falls to the low threshold.
    ///
    /// Rising back above the threshold re-arms the alert.
    pub fn poll_low_alert(&mut self) -> bool {
        if !self.is_low() {
            self.low_alerted = false;
            return false;
        }

        let fire = !self.low_alerted;
        self.low_alerted = true;
        fire
    }
}

/// Applies drain, enemy hits and pickups for this tick, consuming the contact events.
pub fn oxygen_system(
    mut commands: Commands,
    delta_time: Res<DeltaTime>,
    mut run: ResMut<RunState>,
    mut contacts: EventReader<GameEvent>,
    mut notifications: EventWriter<SimEvent>,
) {
    run.oxygen.tick(delta_time.0);

    let mut enemy_contacts = 0;
    let mut pickups: SmallVec<[(Entity, f32); 4]> = SmallVec::new();
    for event in contacts.read() {
        match *event {
            GameEvent::EnemyContact { count } => enemy_contacts = enemy_contacts.max(count),
            GameEvent::PickupTouched { pickup, refill } => {
                if !pickups.iter().any(|&(seen, _)| seen == pickup) {
                    pickups.push((pickup, refill));
                }
            }
            GameEvent::ExitReached => {}
        }
    }

    if run.oxygen.apply_hit(enemy_contacts) {
        debug!(contacts = enemy_contacts, oxygen = run.oxygen.value(), "Player hit by enemy");
        notifications.write(SimEvent::EnemyHit {
            contacts: enemy_contacts,
        });
    }

    for (pickup, refill) in pickups {
        run.oxygen.apply_pickup(refill);
        commands.entity(pickup).despawn();
        debug!(?pickup, refill, oxygen = run.oxygen.value(), "Oxygen canister collected");
        notifications.write(SimEvent::PickupCollected { refill });
    }

    if run.oxygen.poll_low_alert() {
        debug!(oxygen = run.oxygen.value(), "Oxygen low");
        notifications.write(SimEvent::LowOxygen);
    }
}
