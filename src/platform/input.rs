//! Input commands consumed by the game loop
//!
//! Keyboard, mouse and touch handling live in the host; it maps raw events to
//! this small command set.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// How the player wants to move
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MoveCommand {
    /// Steer along a direction; components in [-1, 1], zero stops
    Direction(Vec2),
    /// Jump to a playfield position (pointer follow)
    To(Vec2),
    /// Aim at an angle in radians (shield/orbit games)
    Angle(f32),
    /// Switch to a lane index
    Lane(usize),
}

/// A single player command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Move(MoveCommand),
    /// Game-specific action: jump, flip, shoot, switch lane
    Action,
    TogglePause,
    Quit,
    Restart,
}

impl Command {
    /// Short name used in logs and rejection errors
    pub fn name(&self) -> &'static str {
        match self {
            Command::Move(_) => "move",
            Command::Action => "action",
            Command::TogglePause => "toggle_pause",
            Command::Quit => "quit",
            Command::Restart => "restart",
        }
    }
}
