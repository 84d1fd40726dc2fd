//! Game phase state machine
//!
//! ```text
//! Intro ──► Playing ◄──► Paused
//!   │          │            │
//!   └──────────┴──► GameOver ◄┘ ──(restart)──► Intro | Playing
//!
//! any phase except Error ──► Error (terminal)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GameError, GameResult};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Non-interactive lead-in before play
    Intro,
    /// Active gameplay
    Playing,
    /// Simulation suspended
    Paused,
    /// Round ended, waiting for restart
    GameOver,
    /// Unrecoverable failure; requires a full reload
    Error,
}

impl GamePhase {
    /// Whether the simulation (entities, collisions, score) may advance
    pub fn simulates(self) -> bool {
        self == GamePhase::Playing
    }

    /// Whether `self → to` is a legal move
    pub fn can_transition(self, to: GamePhase) -> bool {
        use GamePhase::*;
        matches!(
            (self, to),
            (Intro, Playing)
                | (Intro, GameOver)
                | (Playing, Paused)
                | (Paused, Playing)
                | (Playing, GameOver)
                | (Paused, GameOver)
                | (GameOver, Intro)
                | (GameOver, Playing)
                | (Intro | Playing | Paused | GameOver, Error)
        )
    }
}

/// Validating wrapper around the current phase
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: GamePhase,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Intro,
        }
    }
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Move to `to`, returning the previous phase. Illegal moves are rejected
    /// and leave the phase unchanged.
    pub fn transition(&mut self, to: GamePhase) -> GameResult<GamePhase> {
        let from = self.phase;
        if !from.can_transition(to) {
            return Err(GameError::IllegalTransition { from, to });
        }
        self.phase = to;
        log::info!("Phase {:?} -> {:?}", from, to);
        Ok(from)
    }
}
