use bevy_ecs::query::With;
use bevy_ecs::system::{Query, Res};

use crate::constants::mechanics::PLAYER_SPEED;
use crate::systems::components::{DeltaTime, InputIntent, PlayerControlled, Position, PreviousPosition, Velocity};

/// Converts the current [`InputIntent`] into the player's velocity.
pub fn player_intent_system(intent: Res<InputIntent>, mut players: Query<&mut Velocity, With<PlayerControlled>>) {
    let velocity = intent.direction() * PLAYER_SPEED;
    for mut player_velocity in players.iter_mut() {
        player_velocity.0 = velocity;
    }
}

/// Remembers where each mover started the tick, then applies its velocity.
pub fn integrate_system(delta_time: Res<DeltaTime>, mut movers: Query<(&mut Position, &mut PreviousPosition, &Velocity)>) {
    for (mut position, mut previous, velocity) in movers.iter_mut() {
        previous.0 = position.0;
        position.0 += velocity.0 * delta_time.0;
    }
}
