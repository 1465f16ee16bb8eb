//! Centralized error types for the game.
//!
//! Only configuration problems are fatal. A malformed level row is a [`RowError`] that the catalog
//! logs and skips, and a level with no rows at all is not an error: the run simply ends as cleared.

use std::io;
use std::path::PathBuf;

/// Main error type for the game.
///
/// This is the primary error type that should be used in public APIs.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The world no longer matches what the run state says it should hold.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Problems with the level data source. No gameplay is possible while one of these is present.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Missing level data: {}", .0.display())]
    MissingLevelData(PathBuf),

    #[error("Level data at {} could not be read: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single level row that could not be turned into a record.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("Row has no kind")]
    MissingKind,

    #[error("Unknown object kind: {0}")]
    UnknownKind(String),

    #[error("Column '{column}' is not a number: {value:?}")]
    InvalidNumber { column: &'static str, value: String },
}

/// Result type for game operations.
pub type GameResult<T> = Result<T, GameError>;
