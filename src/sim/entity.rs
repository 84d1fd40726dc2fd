//! Spawned entities (hazards, targets, gates, fragments) and their store
//!
//! Entities are kept in id order. Ids only grow within a round, so iteration
//! order is spawn order and collision tie-breaking is deterministic.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Collidable, Shape};
use super::difficulty::Difficulty;
use super::state::Bounds;
use crate::error::{GameError, GameResult};
use crate::rules::{GameRules, SpawnContext};
use crate::{normalize_angle, polar_to_cartesian};

/// Shortest spawn interval the store will honor (seconds)
const MIN_SPAWN_INTERVAL: f32 = 0.01;

/// What an entity does to the player on contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Costs a life on contact
    Hazard,
    /// Awards points on contact
    Target { points: u32 },
    /// Hazard on contact, awards points once passed
    Gate { points: u32 },
    /// Visual debris, never collides
    Fragment,
}

/// Motion law applied every tick, always scaled by dt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Straight line at constant velocity
    Linear { vel: Vec2 },
    /// Sweep around `center`; `radial_vel < 0` closes in on the center
    Angular {
        center: Vec2,
        radius: f32,
        theta: f32,
        angular_vel: f32,
        radial_vel: f32,
    },
    /// Arc under constant acceleration
    Ballistic { vel: Vec2, gravity: Vec2 },
}

/// Anything that moves with the simulation clock
pub trait Movable {
    fn advance(&mut self, dt: f32);
}

/// Everything the rules need to describe a new entity
#[derive(Debug, Clone, PartialEq)]
pub struct Spawn {
    pub kind: EntityKind,
    pub tag: u8,
    pub shape: Shape,
    pub motion: Motion,
    pub pos: Vec2,
    pub ttl: Option<f32>,
}

impl Spawn {
    pub fn new(kind: EntityKind, shape: Shape, motion: Motion, pos: Vec2) -> Self {
        Self {
            kind,
            tag: 0,
            shape,
            motion,
            pos,
            ttl: None,
        }
    }

    pub fn with_tag(mut self, tag: u8) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_ttl(mut self, ttl: f32) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// A spawned entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    /// Game-specific variant (e.g. circle/square/triangle/hexagon)
    pub tag: u8,
    pub shape: Shape,
    pub motion: Motion,
    pub pos: Vec2,
    /// Points for passing have been awarded
    pub scored: bool,
    /// Removed at the end of this tick
    pub consumed: bool,
    /// Remaining lifetime in seconds (fragments)
    pub ttl: Option<f32>,
    /// Play time at which the entity was spawned
    pub spawned_at: f32,
}

impl Entity {
    pub fn new(
        id: u32,
        kind: EntityKind,
        shape: Shape,
        motion: Motion,
        pos: Vec2,
        spawned_at: f32,
    ) -> Self {
        let mut entity = Self {
            id,
            kind,
            tag: 0,
            shape,
            motion,
            pos,
            scored: false,
            consumed: false,
            ttl: None,
            spawned_at,
        };
        entity.sync_position();
        entity
    }

    fn from_spawn(id: u32, spawn: Spawn, spawned_at: f32) -> Self {
        let mut entity = Self::new(
            id,
            spawn.kind,
            spawn.shape,
            spawn.motion,
            spawn.pos,
            spawned_at,
        );
        entity.tag = spawn.tag;
        entity.ttl = spawn.ttl;
        entity
    }

    /// Angular motion owns the position; derive it from the polar state
    fn sync_position(&mut self) {
        if let Motion::Angular {
            center,
            radius,
            theta,
            ..
        } = self.motion
        {
            self.pos = center + polar_to_cartesian(radius.max(0.0), theta);
        }
    }

    /// Current velocity, whatever the motion law
    pub fn velocity(&self) -> Vec2 {
        match self.motion {
            Motion::Linear { vel } | Motion::Ballistic { vel, .. } => vel,
            Motion::Angular {
                radius,
                theta,
                angular_vel,
                radial_vel,
                ..
            } => {
                let radial = Vec2::new(theta.cos(), theta.sin());
                let tangent = radial.perp();
                radial * radial_vel + tangent * angular_vel * radius
            }
        }
    }

    pub fn is_expired(&self) -> bool {
        self.ttl.is_some_and(|t| t <= 0.0)
    }

    /// Angular entities that swept through their center are gone
    fn collapsed(&self) -> bool {
        matches!(self.motion, Motion::Angular { radius, .. } if radius < 0.0)
    }
}

impl Movable for Entity {
    fn advance(&mut self, dt: f32) {
        match &mut self.motion {
            Motion::Linear { vel } => self.pos += *vel * dt,
            Motion::Angular {
                radius,
                theta,
                angular_vel,
                radial_vel,
                ..
            } => {
                *theta = normalize_angle(*theta + *angular_vel * dt);
                *radius += *radial_vel * dt;
            }
            Motion::Ballistic { vel, gravity } => {
                // Semi-implicit Euler
                *vel += *gravity * dt;
                self.pos += *vel * dt;
            }
        }
        self.sync_position();

        if let Some(ttl) = &mut self.ttl {
            *ttl -= dt;
        }
    }
}

impl Collidable for Entity {
    fn position(&self) -> Vec2 {
        self.pos
    }

    fn shape(&self) -> &Shape {
        &self.shape
    }
}

/// Ordered collection of live entities with a spawn countdown
#[derive(Debug, Clone)]
pub struct EntityStore {
    entities: Vec<Entity>,
    next_id: u32,
    /// Seconds until the next scheduled spawn; seeded on first use
    spawn_countdown: Option<f32>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
            spawn_countdown: None,
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn get(&self, id: u32) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Seconds until the next spawn, if the countdown has started
    pub fn spawn_countdown(&self) -> Option<f32> {
        self.spawn_countdown
    }

    /// Drop every entity and restart the countdown and id sequence
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Add an entity; returns its id
    pub fn insert(&mut self, spawn: Spawn, now: f32) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.push(Entity::from_spawn(id, spawn, now));
        id
    }

    /// Run the spawn countdown and create any entities that came due.
    ///
    /// The countdown is re-armed from the interval in effect *now*, so a
    /// difficulty change affects the next spawn and never the pending one.
    /// Returns the number of spawn events fired.
    pub fn spawn_due(
        &mut self,
        dt: f32,
        difficulty: &Difficulty,
        rules: &mut dyn GameRules,
        ctx: &SpawnContext,
        rng: &mut Pcg32,
        max_spawns: u32,
    ) -> GameResult<u32> {
        let interval = difficulty.spawn_interval.max(MIN_SPAWN_INTERVAL);
        let mut countdown = self.spawn_countdown.unwrap_or(interval) - dt;
        let mut fired = 0;

        while countdown <= 0.0 && fired < max_spawns {
            for spawn in rules.spawn(ctx, rng)? {
                let id = self.insert(spawn, ctx.elapsed);
                log::debug!("Spawned entity {} at t={:.2}", id, ctx.elapsed);
            }
            countdown += interval;
            fired += 1;
        }
        if countdown <= 0.0 {
            // Backlog after a long frame is dropped rather than burst later
            countdown = interval;
        }

        self.spawn_countdown = Some(countdown);
        Ok(fired)
    }

    /// Move every entity by its motion law
    pub fn advance(&mut self, dt: f32) -> GameResult<()> {
        for entity in &mut self.entities {
            entity.advance(dt);
            if !entity.pos.is_finite() {
                return Err(GameError::Tick(format!(
                    "entity {} has a non-finite position {:?}",
                    entity.id, entity.pos
                )));
            }
        }
        Ok(())
    }

    /// Remove consumed, expired and out-of-bounds entities; returns how many were removed
    pub fn cull(&mut self, bounds: &Bounds, margin: f32) -> usize {
        let before = self.entities.len();
        self.entities.retain(|e| {
            !e.consumed && !e.is_expired() && !e.collapsed() && bounds.contains(e.pos, margin)
        });
        before - self.entities.len()
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
