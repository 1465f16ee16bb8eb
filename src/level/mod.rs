//! This module defines the level data format, how it is read, and how a level is built into entities.
pub mod builder;
pub mod catalog;
pub mod parser;

pub use builder::{despawn_level, LevelLayout};
pub use catalog::{LevelCatalog, LevelSource};
pub use parser::{LevelRecord, RecordKind};
