//! Error types for the arcade core.
//!
//! Three failure classes matter to a running session:
//! - initialization failures (render surface unavailable) stop the loop before it starts
//! - tick failures (rules, renderer, corrupted simulation values) move the session to `Error`
//! - persistence failures are logged and swallowed by [`crate::HighScores`]

use std::io;

use crate::sim::GamePhase;

/// Main error type for a game session.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("Initialization failed: {0}")]
    Init(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Tick failed: {0}")]
    Tick(String),

    #[error("Illegal transition from {from:?} to {to:?}")]
    IllegalTransition { from: GamePhase, to: GamePhase },

    #[error("Command {command} not accepted while {phase:?}")]
    CommandRejected {
        command: &'static str,
        phase: GamePhase,
    },

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by a [`crate::sim::Renderer`].
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("Render surface unavailable: {0}")]
    SurfaceUnavailable(String),

    #[error("Draw failed: {0}")]
    DrawFailed(String),
}

/// Errors raised by a [`crate::persistence::ScoreStore`].
#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed store data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stored value for {key} is not a score: {value}")]
    InvalidValue { key: String, value: String },
}

/// Errors raised while loading or validating [`crate::Tuning`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type GameResult<T> = Result<T, GameError>;
