//! The Entity-Component-System (ECS) module.
//!
//! This module contains all the ECS-related logic, including components, systems,
//! and resources.

pub mod collision;
pub mod components;
pub mod enemy;
pub mod movement;
pub mod oxygen;
pub mod snapshot;
pub mod state;

pub use self::collision::*;
pub use self::components::*;
pub use self::enemy::*;
pub use self::movement::*;
pub use self::oxygen::*;
pub use self::snapshot::*;
pub use self::state::*;
