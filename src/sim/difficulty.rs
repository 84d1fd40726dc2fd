//! Time-driven difficulty ramp
//!
//! Difficulty is a pure function of elapsed play time. It is recomputed every
//! tick and never accumulated, so any sequence of frames reaching the same
//! elapsed time sees the same speed and spawn interval.

use serde::{Deserialize, Serialize};

/// One ramped parameter.
///
/// `limit` may sit above `initial` (speeds ramp up) or below it (intervals
/// ramp down); either way the value moves monotonically from `initial`
/// toward `limit` and saturates there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "curve", rename_all = "snake_case")]
pub enum RampCurve {
    /// Constant value
    Fixed { value: f32 },
    /// Straight line reaching `limit` after `full_at` seconds
    Linear { initial: f32, limit: f32, full_at: f32 },
    /// `initial * rate^t`, clamped at `limit`
    Multiplicative { initial: f32, limit: f32, rate: f32 },
    /// Jumps to each step's value once its time threshold is reached
    Steps {
        initial: f32,
        limit: f32,
        steps: Vec<RampStep>,
    },
}

/// A threshold in a stepped ramp
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampStep {
    /// Seconds of play time
    pub at: f32,
    pub value: f32,
}

impl RampCurve {
    fn endpoints(&self) -> (f32, f32) {
        match self {
            RampCurve::Fixed { value } => (*value, *value),
            RampCurve::Linear { initial, limit, .. }
            | RampCurve::Multiplicative { initial, limit, .. }
            | RampCurve::Steps { initial, limit, .. } => (*initial, *limit),
        }
    }

    /// Value at `elapsed` seconds of play
    pub fn at(&self, elapsed: f32) -> f32 {
        let t = elapsed.max(0.0);
        let raw = match self {
            RampCurve::Fixed { value } => *value,
            RampCurve::Linear {
                initial,
                limit,
                full_at,
            } => {
                if *full_at <= 0.0 {
                    *limit
                } else {
                    initial + (limit - initial) * (t / full_at).min(1.0)
                }
            }
            RampCurve::Multiplicative { initial, rate, .. } => initial * rate.powf(t),
            RampCurve::Steps { initial, steps, .. } => steps
                .iter()
                .take_while(|s| s.at <= t)
                .last()
                .map_or(*initial, |s| s.value),
        };
        let (initial, limit) = self.endpoints();
        raw.clamp(initial.min(limit), initial.max(limit))
    }

    /// Check that the curve can only move toward its limit
    pub fn validate(&self) -> Result<(), String> {
        let (initial, limit) = self.endpoints();
        if !initial.is_finite() || !limit.is_finite() {
            return Err("endpoints must be finite".into());
        }
        let rising = limit >= initial;
        match self {
            RampCurve::Fixed { .. } => Ok(()),
            RampCurve::Linear { full_at, .. } => {
                if full_at.is_finite() && *full_at >= 0.0 {
                    Ok(())
                } else {
                    Err(format!("full_at must be a non-negative number, got {full_at}"))
                }
            }
            RampCurve::Multiplicative { rate, .. } => {
                let toward_limit = if rising { *rate >= 1.0 } else { *rate <= 1.0 };
                if *rate > 0.0 && rate.is_finite() && toward_limit {
                    Ok(())
                } else {
                    Err(format!("rate {rate} does not move {initial} toward {limit}"))
                }
            }
            RampCurve::Steps { steps, .. } => {
                let mut prev_at = f32::NEG_INFINITY;
                let mut prev_value = initial;
                for step in steps {
                    if step.at < prev_at {
                        return Err("step thresholds must be sorted".into());
                    }
                    let monotone = if rising {
                        step.value >= prev_value
                    } else {
                        step.value <= prev_value
                    };
                    if !monotone {
                        return Err(format!("step at {}s moves away from the limit", step.at));
                    }
                    prev_at = step.at;
                    prev_value = step.value;
                }
                Ok(())
            }
        }
    }
}

/// Difficulty parameters in effect for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Difficulty {
    /// Entity speed (units per second)
    pub speed: f32,
    /// Seconds between spawns
    pub spawn_interval: f32,
}

/// Speed and spawn-interval ramps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyRamp {
    pub speed: RampCurve,
    pub spawn_interval: RampCurve,
}

impl Default for DifficultyRamp {
    fn default() -> Self {
        Self {
            speed: RampCurve::Linear {
                initial: 150.0,
                limit: 420.0,
                full_at: 90.0,
            },
            spawn_interval: RampCurve::Linear {
                initial: 1.2,
                limit: 0.35,
                full_at: 90.0,
            },
        }
    }
}

impl DifficultyRamp {
    pub fn at(&self, elapsed: f32) -> Difficulty {
        Difficulty {
            speed: self.speed.at(elapsed),
            spawn_interval: self.spawn_interval.at(elapsed),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.speed.validate().map_err(|e| format!("speed: {e}"))?;
        self.spawn_interval
            .validate()
            .map_err(|e| format!("spawn_interval: {e}"))?;
        let (initial, limit) = self.spawn_interval.endpoints();
        if initial <= 0.0 || limit <= 0.0 {
            return Err("spawn_interval: must stay positive".into());
        }
        Ok(())
    }
}
