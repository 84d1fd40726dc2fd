//! Score and lives bookkeeping for a round

use crate::highscores::HighScores;

/// Result of losing a life
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeLoss {
    /// Lives remain
    Lost { remaining: u8 },
    /// The last life was just lost; the round is over
    Depleted,
    /// Lives were already zero; nothing changed
    AlreadyDepleted,
}

/// Current score and lives, plus the high score shown in the HUD
#[derive(Debug, Clone)]
pub struct ScoreKeeper {
    score: u64,
    lives: u8,
    initial_lives: u8,
    high_score: u64,
    finalized: bool,
}

impl ScoreKeeper {
    pub fn new(initial_lives: u8, high_score: u64) -> Self {
        Self {
            score: 0,
            lives: initial_lives,
            initial_lives,
            high_score,
            finalized: false,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn initial_lives(&self) -> u8 {
        self.initial_lives
    }

    /// Best score known for this game (persisted value or this round, whichever is higher)
    pub fn high_score(&self) -> u64 {
        self.high_score.max(self.score)
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn add_points(&mut self, points: u32) {
        self.score = self.score.saturating_add(u64::from(points));
    }

    /// Lose one life. Reports `Depleted` only on the 1 → 0 transition.
    pub fn reduce_life(&mut self) -> LifeLoss {
        match self.lives {
            0 => LifeLoss::AlreadyDepleted,
            1 => {
                self.lives = 0;
                LifeLoss::Depleted
            }
            n => {
                self.lives = n - 1;
                LifeLoss::Lost { remaining: n - 1 }
            }
        }
    }

    /// Record the round's score against the persisted high score.
    ///
    /// Writes at most once per round; later calls return the cached value.
    pub fn finalize_round(&mut self, table: &mut HighScores, game_id: &str) -> u64 {
        if !self.finalized {
            self.finalized = true;
            self.high_score = table.record(game_id, self.score);
            log::info!(
                "Round finalized for {}: score {}, high score {}",
                game_id,
                self.score,
                self.high_score
            );
        }
        self.high_score()
    }

    /// Start a new round with full lives
    pub fn reset(&mut self, high_score: u64) {
        *self = Self::new(self.initial_lives, high_score);
    }
}
