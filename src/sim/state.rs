//! Player avatar and playfield types
//!
//! The player is owned by the running session and rebuilt on every restart.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Collidable, Shape};
use crate::normalize_angle;

/// Axis-aligned playfield rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    /// Playfield anchored at the origin
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(width, height),
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Check if a point lies inside the bounds grown by `margin` on every side
    pub fn contains(&self, point: Vec2, margin: f32) -> bool {
        point.cmpge(self.min - margin).all() && point.cmple(self.max + margin).all()
    }
}

/// The player's avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub shape: Shape,
    /// Angular position (shield/orbit games), normalized to [0, 2π)
    pub aim: f32,
    /// Current lane for lane-switching games
    pub lane: Option<usize>,
    /// Hazards are ignored until this play time (seconds)
    pub invincible_until: Option<f32>,
    /// Hit feedback is shown until this play time (seconds)
    pub hit_flash_until: Option<f32>,
    /// Where the player (re)appears
    spawn: Vec2,
}

impl Player {
    pub fn new(pos: Vec2, shape: Shape) -> Self {
        let aim = match &shape {
            Shape::Arc(arc) => arc.mid_angle(),
            _ => 0.0,
        };
        Self {
            pos,
            vel: Vec2::ZERO,
            shape,
            aim,
            lane: None,
            invincible_until: None,
            hit_flash_until: None,
            spawn: pos,
        }
    }

    /// Return to the spawn point at rest
    pub fn respawn(&mut self) {
        self.pos = self.spawn;
        self.vel = Vec2::ZERO;
    }

    /// Point the player's arc (if any) at `theta`
    pub fn set_aim(&mut self, theta: f32) {
        self.aim = normalize_angle(theta);
        if let Shape::Arc(arc) = &mut self.shape {
            arc.set_mid_angle(self.aim);
        }
    }

    /// Integrate velocity and gravity over `dt`
    pub fn integrate(&mut self, dt: f32, gravity: f32) {
        self.vel.y += gravity * dt;
        self.pos += self.vel * dt;
    }

    pub fn is_invincible(&self, now: f32) -> bool {
        self.invincible_until.is_some_and(|until| now < until)
    }

    pub fn is_flashing(&self, now: f32) -> bool {
        self.hit_flash_until.is_some_and(|until| now < until)
    }

    /// Drop feedback timers that have run out
    pub fn expire_timers(&mut self, now: f32) {
        if self.invincible_until.is_some_and(|until| now >= until) {
            self.invincible_until = None;
        }
        if self.hit_flash_until.is_some_and(|until| now >= until) {
            self.hit_flash_until = None;
        }
    }
}

impl Collidable for Player {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }
}
