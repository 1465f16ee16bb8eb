//! I Can't Breathe: an oxygen survival game library crate.

pub mod app;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod formatter;
pub mod game;
pub mod level;
pub mod systems;
