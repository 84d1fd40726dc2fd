//! Per-game policies plugged into the shared loop
//!
//! The loop owns timing, collisions and bookkeeping; a [`GameRules`]
//! implementation decides where entities come from, what the action button
//! does and when an entity counts as passed or breached.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::error::GameResult;
use crate::sim::{
    ArcSegment, Bounds, BoundaryPolicy, Entity, EntityKind, Motion, Player, Shape, Spawn,
};
use crate::tuning::Tuning;
use crate::{cartesian_to_polar, polar_to_cartesian};

/// Inputs available when spawning
#[derive(Debug, Clone, Copy)]
pub struct SpawnContext {
    pub bounds: Bounds,
    pub player_pos: Vec2,
    /// Seconds of play this round
    pub elapsed: f32,
    /// Entity speed from the difficulty ramp
    pub speed: f32,
}

/// Inputs available when the action command arrives
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    pub bounds: Bounds,
    pub lanes: &'a [f32],
}

/// Game-specific policies
pub trait GameRules {
    /// Build the player for a fresh round
    fn create_player(&self, bounds: &Bounds) -> Player;

    /// Describe the entities created when the spawn countdown runs out
    fn spawn(&mut self, ctx: &SpawnContext, rng: &mut Pcg32) -> GameResult<Vec<Spawn>>;

    /// Apply the action command (jump, flip, switch lane, ...)
    fn on_action(&mut self, _player: &mut Player, _ctx: &ActionContext<'_>) {}

    /// Whether the player has cleanly passed `entity`.
    ///
    /// Default: the entity has moved beyond the player along its direction of
    /// travel by more than both extents combined.
    fn has_passed(&self, player: &Player, entity: &Entity) -> bool {
        let dir = entity.velocity().normalize_or_zero();
        if dir == Vec2::ZERO {
            return false;
        }
        let ahead = (entity.pos - player.pos).dot(dir);
        ahead > player.shape.bounding_radius() + entity.shape.bounding_radius()
    }

    /// Whether `entity` slipped past the player's defence into a protected zone
    fn breached(&self, _player: &Player, _entity: &Entity) -> bool {
        false
    }

    /// Debris left behind when `entity` is consumed
    fn debris(&mut self, _entity: &Entity, _rng: &mut Pcg32) -> Vec<Spawn> {
        Vec::new()
    }

    /// Game-specific fail condition checked every tick (e.g. left the platform)
    fn is_failed(&self, _player: &Player, _bounds: &Bounds) -> bool {
        false
    }
}

/// Shape variants shared by the reference games
fn shape_for_tag(tag: u8, size: f32, rotation: f32) -> Shape {
    match tag % 4 {
        0 => Shape::circle(size),
        1 => Shape::rect(size * 2.0, size * 2.0),
        2 => Shape::regular_polygon(3, size, rotation),
        _ => Shape::regular_polygon(6, size, rotation),
    }
}

/// Top-down dodger: hazards and bonus targets fall from the top edge
#[derive(Debug, Clone)]
pub struct FallingHazards {
    pub entity_size: f32,
    /// Chance that a spawn is a bonus target instead of a hazard
    pub target_chance: f64,
    pub target_points: u32,
    /// Horizontal drift as a fraction of fall speed
    pub drift: f32,
    pub player_radius: f32,
}

impl Default for FallingHazards {
    fn default() -> Self {
        Self {
            entity_size: 14.0,
            target_chance: 0.15,
            target_points: 10,
            drift: 0.15,
            player_radius: crate::consts::PLAYER_RADIUS,
        }
    }
}

impl FallingHazards {
    pub fn tuning() -> Tuning {
        Tuning {
            game_id: "falling_hazards".into(),
            ..Tuning::default()
        }
    }
}

impl GameRules for FallingHazards {
    fn create_player(&self, bounds: &Bounds) -> Player {
        let pos = Vec2::new(bounds.center().x, bounds.max.y - self.player_radius * 2.5);
        Player::new(pos, Shape::circle(self.player_radius))
    }

    fn spawn(&mut self, ctx: &SpawnContext, rng: &mut Pcg32) -> GameResult<Vec<Spawn>> {
        let size = self.entity_size;
        let min_x = ctx.bounds.min.x + size;
        let max_x = (ctx.bounds.max.x - size).max(min_x + 1.0);
        let x = rng.random_range(min_x..max_x);
        let drift = rng.random_range(-self.drift..=self.drift) * ctx.speed;
        let vel = Vec2::new(drift, ctx.speed);

        let tag = rng.random_range(0..4u8);
        let chance = if self.target_chance.is_nan() {
            0.0
        } else {
            self.target_chance.clamp(0.0, 1.0)
        };
        let kind = if rng.random_bool(chance) {
            EntityKind::Target {
                points: self.target_points,
            }
        } else {
            EntityKind::Hazard
        };
        let shape = shape_for_tag(tag, size, rng.random_range(0.0..TAU));
        let pos = Vec2::new(x, ctx.bounds.min.y - size);

        Ok(vec![Spawn::new(kind, shape, Motion::Linear { vel }, pos).with_tag(tag)])
    }

    /// Switch lane when lanes are configured, otherwise reverse horizontal motion
    fn on_action(&mut self, player: &mut Player, ctx: &ActionContext<'_>) {
        if ctx.lanes.is_empty() {
            player.vel.x = -player.vel.x;
            return;
        }
        let lane = player.lane.map_or(0, |l| (l + 1) % ctx.lanes.len());
        player.lane = Some(lane);
        player.pos.x = ctx.lanes[lane];
    }

    fn debris(&mut self, entity: &Entity, rng: &mut Pcg32) -> Vec<Spawn> {
        if !matches!(entity.kind, EntityKind::Target { .. }) {
            return Vec::new();
        }
        (0..3)
            .map(|i| {
                let theta = i as f32 * TAU / 3.0 + rng.random_range(-0.3..0.3);
                let vel = polar_to_cartesian(120.0, theta);
                let motion = Motion::Ballistic {
                    vel,
                    gravity: Vec2::new(0.0, 400.0),
                };
                Spawn::new(EntityKind::Fragment, Shape::circle(3.0), motion, entity.pos)
                    .with_tag(entity.tag)
                    .with_ttl(0.4)
            })
            .collect()
    }
}

/// Shield defence: projectiles converge on a core and are blocked by a rotating arc
#[derive(Debug, Clone)]
pub struct RadialSwarm {
    pub shield_radius: f32,
    pub shield_thickness: f32,
    /// Angular width of the shield (radians)
    pub shield_width: f32,
    /// Projectiles reaching this distance from the center breach the core
    pub core_radius: f32,
    pub projectile_size: f32,
    /// Spin applied to projectiles as a fraction of their closing speed
    pub spin: f32,
    pub block_points: u32,
}

impl Default for RadialSwarm {
    fn default() -> Self {
        Self {
            shield_radius: 70.0,
            shield_thickness: 10.0,
            shield_width: 1.2,
            core_radius: 24.0,
            projectile_size: 8.0,
            spin: 0.002,
            block_points: 1,
        }
    }
}

impl RadialSwarm {
    pub fn tuning() -> Tuning {
        Tuning {
            game_id: "radial_swarm".into(),
            one_hit_per_frame: true,
            ..Tuning::default()
        }
    }
}

impl GameRules for RadialSwarm {
    fn create_player(&self, bounds: &Bounds) -> Player {
        let shield = ArcSegment::centered(
            self.shield_radius,
            self.shield_thickness,
            -PI / 2.0,
            self.shield_width,
        );
        Player::new(bounds.center(), Shape::Arc(shield))
    }

    fn spawn(&mut self, ctx: &SpawnContext, rng: &mut Pcg32) -> GameResult<Vec<Spawn>> {
        let center = ctx.bounds.center();
        // Start just past the nearest edge, well inside the cull margin
        let radius = ctx.bounds.size().min_element() / 2.0 + self.projectile_size;
        let theta = rng.random_range(0.0..TAU);
        let spin = rng.random_range(-self.spin..=self.spin) * ctx.speed;
        let motion = Motion::Angular {
            center,
            radius,
            theta,
            angular_vel: spin,
            radial_vel: -ctx.speed,
        };
        let tag = rng.random_range(0..4u8);
        let shape = shape_for_tag(tag, self.projectile_size, theta);
        let kind = EntityKind::Target {
            points: self.block_points,
        };
        Ok(vec![Spawn::new(kind, shape, motion, center).with_tag(tag)])
    }

    /// Flip the shield to the opposite side
    fn on_action(&mut self, player: &mut Player, _ctx: &ActionContext<'_>) {
        player.set_aim(player.aim + PI);
    }

    fn breached(&self, player: &Player, entity: &Entity) -> bool {
        let (r, _) = cartesian_to_polar(entity.pos - player.pos);
        r - entity.shape.bounding_radius() <= self.core_radius
    }
}

/// Side-scroller: flap through gaps in walls scrolling in from the right
#[derive(Debug, Clone)]
pub struct ScrollingGates {
    pub gate_width: f32,
    /// Vertical opening between the two halves of a gate
    pub gap: f32,
    pub flap_speed: f32,
    pub player_radius: f32,
    pub points_per_gate: u32,
}

impl Default for ScrollingGates {
    fn default() -> Self {
        Self {
            gate_width: 60.0,
            gap: 160.0,
            flap_speed: 320.0,
            player_radius: 14.0,
            points_per_gate: 1,
        }
    }
}

impl ScrollingGates {
    pub fn tuning() -> Tuning {
        Tuning {
            game_id: "scrolling_gates".into(),
            player_gravity: 900.0,
            boundary: BoundaryPolicy::Fatal,
            invincibility: 0.0,
            ..Tuning::default()
        }
    }
}

impl GameRules for ScrollingGates {
    fn create_player(&self, bounds: &Bounds) -> Player {
        let pos = Vec2::new(
            bounds.min.x + bounds.size().x * 0.25,
            bounds.center().y,
        );
        Player::new(pos, Shape::circle(self.player_radius))
    }

    fn spawn(&mut self, ctx: &SpawnContext, rng: &mut Pcg32) -> GameResult<Vec<Spawn>> {
        let height = ctx.bounds.size().y;
        let margin = self.gap / 2.0 + 20.0;
        let lo = ctx.bounds.min.y + margin;
        let hi = (ctx.bounds.max.y - margin).max(lo + 1.0);
        let gap_center = rng.random_range(lo..hi);

        let x = ctx.bounds.max.x + self.gate_width / 2.0;
        let vel = Vec2::new(-ctx.speed, 0.0);
        let top_height = gap_center - self.gap / 2.0 - ctx.bounds.min.y;
        let bottom_height = ctx.bounds.max.y - (gap_center + self.gap / 2.0);
        debug_assert!(top_height + bottom_height + self.gap <= height + 1e-3);

        let top = Spawn::new(
            EntityKind::Gate {
                points: self.points_per_gate,
            },
            Shape::rect(self.gate_width, top_height),
            Motion::Linear { vel },
            Vec2::new(x, ctx.bounds.min.y + top_height / 2.0),
        );
        // Only one half of the pair scores
        let bottom = Spawn::new(
            EntityKind::Gate { points: 0 },
            Shape::rect(self.gate_width, bottom_height),
            Motion::Linear { vel },
            Vec2::new(x, ctx.bounds.max.y - bottom_height / 2.0),
        );
        Ok(vec![top, bottom])
    }

    /// Flap
    fn on_action(&mut self, player: &mut Player, _ctx: &ActionContext<'_>) {
        player.vel.y = -self.flap_speed;
    }

    /// Gates scroll horizontally; passing is purely along x
    fn has_passed(&self, player: &Player, entity: &Entity) -> bool {
        let half_width = match &entity.shape {
            Shape::Rect { half_extents } => half_extents.x,
            shape => shape.bounding_radius(),
        };
        entity.pos.x + half_width < player.pos.x - player.shape.bounding_radius()
    }
}
