//! Arcade Core - game loop and entity framework for single-screen arcade games
//!
//! Core modules:
//! - `sim`: Simulation (phase machine, entities, collisions, difficulty, scoring)
//! - `rules`: Per-game spawn/action/scoring policies
//! - `platform`: Time sources and input commands
//! - `persistence`: High-score key-value stores
//! - `tuning`: Data-driven game balance

pub mod error;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod rules;
pub mod sim;
pub mod tuning;

pub use error::{GameError, GameResult};
pub use highscores::HighScores;
pub use tuning::Tuning;

use glam::Vec2;

/// Default configuration constants
pub mod consts {
    /// Largest frame delta fed to the simulation (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Nominal display refresh (used by the headless runner)
    pub const NOMINAL_FRAME_DT: f64 = 1.0 / 60.0;

    /// Lives at the start of a round
    pub const INITIAL_LIVES: u8 = 3;

    /// Lead-in before play starts (seconds)
    pub const INTRO_DELAY: f32 = 1.5;
    /// Delay before the game over overlay is revealed (seconds)
    pub const GAME_OVER_REVEAL_DELAY: f32 = 0.6;

    /// Player feedback after a hit (seconds of play time)
    pub const HIT_FLASH_DURATION: f32 = 0.3;
    pub const INVINCIBILITY_DURATION: f32 = 1.0;

    /// Playfield defaults
    pub const PLAYFIELD_WIDTH: f32 = 800.0;
    pub const PLAYFIELD_HEIGHT: f32 = 600.0;
    /// Entities are culled once this far outside the playfield
    pub const CULL_MARGIN: f32 = 50.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 16.0;

    /// Cap on spawns in a single tick after a long frame
    pub const MAX_SPAWNS_PER_TICK: u32 = 4;
}

/// Normalize an angle to [0, 2π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::TAU;
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: Vec2) -> (f32, f32) {
    (pos.length(), pos.y.atan2(pos.x))
}
