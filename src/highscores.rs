//! Per-game high score table
//!
//! One canonical key per game id (`"{game_id}_highscore"`), read through to
//! the backing store. Storage failures never reach the session: they are
//! logged and the last known value is used instead.

use std::collections::BTreeMap;

use crate::error::PersistenceError;
use crate::persistence::ScoreStore;

/// Best score per game id over a [`ScoreStore`]
pub struct HighScores {
    store: Box<dyn ScoreStore>,
    /// Last value seen or written per game id
    known: BTreeMap<String, u64>,
}

impl HighScores {
    pub fn new(store: Box<dyn ScoreStore>) -> Self {
        Self {
            store,
            known: BTreeMap::new(),
        }
    }

    /// The single writable storage key for a game
    pub fn storage_key(game_id: &str) -> String {
        format!("{game_id}_highscore")
    }

    /// Current high score for `game_id` (0 when none is stored)
    pub fn get(&mut self, game_id: &str) -> u64 {
        match self.read(game_id) {
            Ok(value) => value,
            Err(_) => self.known.get(game_id).copied().unwrap_or(0),
        }
    }

    /// Record a finished round. The stored value is replaced only when `score`
    /// strictly exceeds it. Returns the high score to display.
    ///
    /// A stored value that is not a score counts as 0 and is overwritten. Any
    /// other read failure leaves the store untouched, since the persisted best
    /// is unknown.
    pub fn record(&mut self, game_id: &str, score: u64) -> u64 {
        let stored = match self.read(game_id) {
            Ok(value) => value,
            Err(PersistenceError::InvalidValue { .. }) => 0,
            Err(_) => {
                let best = self.known.get(game_id).copied().unwrap_or(0).max(score);
                self.known.insert(game_id.to_string(), best);
                return best;
            }
        };
        if score <= stored {
            return stored;
        }

        let key = Self::storage_key(game_id);
        match self.store.set(&key, score) {
            Ok(()) => log::info!("New high score for {}: {}", game_id, score),
            Err(e) => log::warn!("Failed to save {}: {}", key, e),
        }
        // Even an unsaved score is the best one this session has seen
        self.known.insert(game_id.to_string(), score);
        score
    }

    fn read(&mut self, game_id: &str) -> Result<u64, PersistenceError> {
        let key = Self::storage_key(game_id);
        match self.store.get(&key) {
            Ok(value) => {
                let value = value.unwrap_or(0);
                self.known.insert(game_id.to_string(), value);
                Ok(value)
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}", key, e);
                Err(e)
            }
        }
    }

    /// Clear the persisted high score for `game_id`
    pub fn reset(&mut self, game_id: &str) {
        let key = Self::storage_key(game_id);
        match self.store.remove(&key) {
            Ok(()) => log::info!("High score for {} reset", game_id),
            Err(e) => log::warn!("Failed to reset {}: {}", key, e),
        }
        self.known.remove(game_id);
    }

    pub fn store(&self) -> &dyn ScoreStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn ScoreStore {
        self.store.as_mut()
    }
}

impl std::fmt::Debug for HighScores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighScores")
            .field("known", &self.known)
            .finish_non_exhaustive()
    }
}
