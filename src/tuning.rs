//! Data-driven game balance
//!
//! One `Tuning` per game, loadable from JSON. Missing fields fall back to the
//! defaults in [`crate::consts`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::{BoundaryPolicy, Bounds, CollisionPolicy, DifficultyRamp};

/// Balance and behavior knobs for one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Game id; also names the persisted high-score key
    pub game_id: String,
    pub initial_lives: u8,
    /// Largest frame delta fed to the simulation (seconds)
    pub max_frame_dt: f32,
    /// Intro lead-in; 0 starts play immediately
    pub intro_delay: f32,
    /// Restarting from game over replays the intro
    pub restart_with_intro: bool,
    pub game_over_reveal_delay: f32,
    pub hit_flash: f32,
    pub invincibility: f32,
    pub one_hit_per_frame: bool,

    // === Playfield ===
    pub width: f32,
    pub height: f32,
    pub cull_margin: f32,
    pub boundary: BoundaryPolicy,

    // === Player ===
    /// Speed for directional movement (units per second)
    pub player_speed: f32,
    /// Downward acceleration on the player (0 = none)
    pub player_gravity: f32,
    /// Lane x positions for lane-switching games
    pub lanes: Vec<f32>,

    // === Spawning ===
    pub max_spawns_per_tick: u32,
    pub difficulty: DifficultyRamp,
    /// Base RNG seed; round `n` uses `seed + n`
    pub seed: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            game_id: "arcade".into(),
            initial_lives: INITIAL_LIVES,
            max_frame_dt: MAX_FRAME_DT,
            intro_delay: INTRO_DELAY,
            restart_with_intro: false,
            game_over_reveal_delay: GAME_OVER_REVEAL_DELAY,
            hit_flash: HIT_FLASH_DURATION,
            invincibility: INVINCIBILITY_DURATION,
            one_hit_per_frame: false,

            width: PLAYFIELD_WIDTH,
            height: PLAYFIELD_HEIGHT,
            cull_margin: CULL_MARGIN,
            boundary: BoundaryPolicy::Clamp,

            player_speed: 320.0,
            player_gravity: 0.0,
            lanes: Vec::new(),

            max_spawns_per_tick: MAX_SPAWNS_PER_TICK,
            difficulty: DifficultyRamp::default(),
            seed: 0x5EED,
        }
    }
}

impl Tuning {
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        CollisionPolicy {
            one_hit_per_frame: self.one_hit_per_frame,
            hit_flash: self.hit_flash,
            invincibility: self.invincibility,
        }
    }

    /// Parse and validate tuning from JSON
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load and validate tuning from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning for {} from {}", tuning.game_id, path.display());
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if self.game_id.trim().is_empty() {
            return Err(invalid("game_id", "must not be empty"));
        }
        if self.initial_lives == 0 {
            return Err(invalid("initial_lives", "must be at least 1"));
        }
        if !(self.max_frame_dt > 0.0 && self.max_frame_dt.is_finite()) {
            let reason = format!("{} is not a positive duration", self.max_frame_dt);
            return Err(invalid("max_frame_dt", reason));
        }
        let durations = [
            ("intro_delay", self.intro_delay),
            ("game_over_reveal_delay", self.game_over_reveal_delay),
            ("hit_flash", self.hit_flash),
            ("invincibility", self.invincibility),
            ("cull_margin", self.cull_margin),
        ];
        for (field, value) in durations {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(invalid(field, format!("{value} must be a non-negative number")));
            }
        }
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(invalid("width/height", "playfield must have a positive size"));
        }
        if self.lanes.iter().any(|x| !(0.0..=self.width).contains(x)) {
            return Err(invalid("lanes", "lane positions must lie inside the playfield"));
        }
        if self.max_spawns_per_tick == 0 {
            return Err(invalid("max_spawns_per_tick", "must be at least 1"));
        }
        self.difficulty
            .validate()
            .map_err(|reason| invalid("difficulty", reason))?;
        Ok(())
    }
}
