//! Collision detection for the player avatar against entities and the playfield
//!
//! Every contact test is inclusive: shapes that exactly touch are colliding.
//! Circle tests compare squared distances so no square root is taken.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::arc::ArcSegment;
use super::entity::{Entity, EntityKind};
use super::state::{Bounds, Player};
use crate::rules::GameRules;

/// Collision shape, positioned at its owner's `pos`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    /// Axis-aligned rectangle centered on the owner
    Rect { half_extents: Vec2 },
    /// Band around the owner's center (shields, gates, orbiting paddles)
    Arc(ArcSegment),
    /// Convex polygon in local coordinates, counter-clockwise or clockwise
    Polygon { points: Vec<Vec2> },
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Shape::Circle { radius }
    }

    pub fn rect(width: f32, height: f32) -> Self {
        Shape::Rect {
            half_extents: Vec2::new(width / 2.0, height / 2.0),
        }
    }

    /// Regular polygon with `sides` vertices on a circle of `radius`
    pub fn regular_polygon(sides: usize, radius: f32, rotation: f32) -> Self {
        let sides = sides.max(3);
        let points = (0..sides)
            .map(|i| {
                let theta = rotation + i as f32 * std::f32::consts::TAU / sides as f32;
                crate::polar_to_cartesian(radius, theta)
            })
            .collect();
        Shape::Polygon { points }
    }

    /// Radius of a circle around the owner's position enclosing the shape
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Shape::Circle { radius } => *radius,
            Shape::Rect { half_extents } => half_extents.length(),
            Shape::Arc(arc) => arc.outer_radius(),
            Shape::Polygon { points } => points
                .iter()
                .map(|p| p.length())
                .fold(0.0, f32::max),
        }
    }
}

/// Anything with a position and a collision shape
pub trait Collidable {
    fn position(&self) -> Vec2;
    fn shape(&self) -> &Shape;

    /// Check overlap with another collidable
    fn overlaps(&self, other: &dyn Collidable) -> bool {
        shapes_overlap(self.position(), self.shape(), other.position(), other.shape())
    }
}

/// Circle–circle test: squared distance ≤ (r1 + r2)²
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) <= reach * reach
}

/// Circle–AABB test via the closest point on the rectangle
pub fn circle_rect_overlap(circle: Vec2, radius: f32, rect_center: Vec2, half: Vec2) -> bool {
    let closest = circle.clamp(rect_center - half, rect_center + half);
    circle.distance_squared(closest) <= radius * radius
}

/// AABB–AABB overlap
pub fn rects_overlap(a: Vec2, ha: Vec2, b: Vec2, hb: Vec2) -> bool {
    let d = (a - b).abs();
    d.x <= ha.x + hb.x && d.y <= ha.y + hb.y
}

/// Circle–arc test; `arc_center` is the arc owner's position
pub fn circle_arc_overlap(circle: Vec2, radius: f32, arc_center: Vec2, arc: &ArcSegment) -> bool {
    arc.touches_circle(circle - arc_center, radius)
}

/// Circle–convex polygon test
pub fn circle_polygon_overlap(circle: Vec2, radius: f32, origin: Vec2, points: &[Vec2]) -> bool {
    if points.len() < 3 {
        return false;
    }
    let local = circle - origin;
    if point_in_convex_polygon(local, points) {
        return true;
    }
    let r2 = radius * radius;
    edges(points).any(|(a, b)| local.distance_squared(closest_on_segment(local, a, b)) <= r2)
}

/// Convex polygon–convex polygon test (separating axis theorem)
pub fn polygons_overlap(a_origin: Vec2, a: &[Vec2], b_origin: Vec2, b: &[Vec2]) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }
    let a: Vec<Vec2> = a.iter().map(|p| *p + a_origin).collect();
    let b: Vec<Vec2> = b.iter().map(|p| *p + b_origin).collect();

    for poly in [&a, &b] {
        for (p, q) in edges(poly) {
            let axis = (q - p).perp();
            let (a_min, a_max) = project(&a, axis);
            let (b_min, b_max) = project(&b, axis);
            if a_max < b_min || b_max < a_min {
                return false;
            }
        }
    }
    true
}

fn edges(points: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| (*a, *b))
}

fn project(points: &[Vec2], axis: Vec2) -> (f32, f32) {
    points.iter().fold((f32::MAX, f32::MIN), |(lo, hi), p| {
        let d = p.dot(axis);
        (lo.min(d), hi.max(d))
    })
}

fn closest_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-8 {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

fn point_in_convex_polygon(p: Vec2, points: &[Vec2]) -> bool {
    let mut sign = 0.0f32;
    for (a, b) in edges(points) {
        let cross = (b - a).perp_dot(p - a);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

fn rect_points(half: Vec2) -> [Vec2; 4] {
    [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ]
}

/// Dispatch the shape-pair test.
///
/// Rects and polygons meeting an arc are approximated by their bounding
/// circle. Arc-to-arc contacts are not modelled and never collide.
pub fn shapes_overlap(pa: Vec2, a: &Shape, pb: Vec2, b: &Shape) -> bool {
    use Shape::*;
    match (a, b) {
        (Circle { radius: ra }, Circle { radius: rb }) => circles_overlap(pa, *ra, pb, *rb),
        (Circle { radius }, Rect { half_extents }) => {
            circle_rect_overlap(pa, *radius, pb, *half_extents)
        }
        (Rect { half_extents }, Circle { radius }) => {
            circle_rect_overlap(pb, *radius, pa, *half_extents)
        }
        (Rect { half_extents: ha }, Rect { half_extents: hb }) => rects_overlap(pa, *ha, pb, *hb),
        (Circle { radius }, Arc(arc)) => circle_arc_overlap(pa, *radius, pb, arc),
        (Arc(arc), Circle { radius }) => circle_arc_overlap(pb, *radius, pa, arc),
        (Circle { radius }, Polygon { points }) => circle_polygon_overlap(pa, *radius, pb, points),
        (Polygon { points }, Circle { radius }) => circle_polygon_overlap(pb, *radius, pa, points),
        (Rect { half_extents }, Polygon { points }) => {
            polygons_overlap(pa, &rect_points(*half_extents), pb, points)
        }
        (Polygon { points }, Rect { half_extents }) => {
            polygons_overlap(pa, points, pb, &rect_points(*half_extents))
        }
        (Polygon { points: pa_pts }, Polygon { points: pb_pts }) => {
            polygons_overlap(pa, pa_pts, pb, pb_pts)
        }
        (Arc(arc), other @ (Rect { .. } | Polygon { .. })) => {
            circle_arc_overlap(pb, other.bounding_radius(), pa, arc)
        }
        (other @ (Rect { .. } | Polygon { .. }), Arc(arc)) => {
            circle_arc_overlap(pa, other.bounding_radius(), pb, arc)
        }
        (Arc(_), Arc(_)) => false,
    }
}

/// How the player reacts to leaving the playfield
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundaryPolicy {
    /// Keep the player inside the playfield
    #[default]
    Clamp,
    /// Lose a life and return to the spawn point
    LoseLife,
    /// End the round (falling off a platform)
    Fatal,
}

/// Result of the player-vs-boundary check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryContact {
    Inside,
    Clamped,
    LostLife,
    Fatal,
}

/// Check the player against the playfield and apply the boundary policy
pub fn player_boundary_check(
    player: &mut Player,
    bounds: &Bounds,
    policy: BoundaryPolicy,
) -> BoundaryContact {
    let extent = match player.shape() {
        // Shield arcs orbit the player's center, which is what must stay inside
        Shape::Arc(_) => Vec2::ZERO,
        Shape::Rect { half_extents } => *half_extents,
        shape => Vec2::splat(shape.bounding_radius()),
    };
    let min = bounds.min + extent;
    let max = bounds.max - extent;
    let inside = player.pos.cmpge(min).all() && player.pos.cmple(max).all();
    if inside {
        return BoundaryContact::Inside;
    }

    match policy {
        BoundaryPolicy::Clamp => {
            let clamped = player.pos.clamp(min.min(max), max.max(min));
            // Stop motion along the clamped axes
            if clamped.x != player.pos.x {
                player.vel.x = 0.0;
            }
            if clamped.y != player.pos.y {
                player.vel.y = 0.0;
            }
            player.pos = clamped;
            BoundaryContact::Clamped
        }
        BoundaryPolicy::LoseLife => {
            player.respawn();
            BoundaryContact::LostLife
        }
        BoundaryPolicy::Fatal => BoundaryContact::Fatal,
    }
}

/// Per-hit feedback and capping rules
#[derive(Debug, Clone, Copy)]
pub struct CollisionPolicy {
    /// Stop evaluating after the first hazard hit this tick
    pub one_hit_per_frame: bool,
    /// Seconds of play time the hit flash lasts
    pub hit_flash: f32,
    /// Seconds of play time hazards are ignored after a hit
    pub invincibility: f32,
}

/// What happened to a single entity this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A hazard reached the player
    Hit,
    /// A target was collected
    Collected { points: u32 },
    /// A gate was passed cleanly
    Passed { points: u32 },
}

/// A resolved contact between the player and one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub entity_id: u32,
    pub outcome: Outcome,
}

/// Evaluate the player against every live entity.
///
/// Hazards hit on contact; targets are collected on contact; gates hit on
/// contact and score once passed. Anything the rules report as breached
/// counts as a hit.
///
/// Entity flags (`consumed`, `scored`) are set here, before the caller applies
/// any score or life effect, so an entity can never produce two outcomes.
/// Entities are visited in store order, which makes tie-breaking deterministic.
pub fn evaluate(
    player: &mut Player,
    entities: &mut [Entity],
    now: f32,
    policy: &CollisionPolicy,
    rules: &dyn GameRules,
) -> Vec<Contact> {
    let mut contacts = Vec::new();

    for entity in entities.iter_mut() {
        if entity.consumed || entity.scored {
            continue;
        }

        let outcome = match entity.kind {
            EntityKind::Fragment => None,
            EntityKind::Hazard => {
                let reached = player.overlaps(&*entity) || rules.breached(player, entity);
                (reached && !player.is_invincible(now)).then_some(Outcome::Hit)
            }
            EntityKind::Target { points } => {
                if player.overlaps(&*entity) {
                    Some(Outcome::Collected { points })
                } else if rules.breached(player, entity) && !player.is_invincible(now) {
                    Some(Outcome::Hit)
                } else {
                    None
                }
            }
            EntityKind::Gate { points } => {
                if player.overlaps(&*entity) {
                    (!player.is_invincible(now)).then_some(Outcome::Hit)
                } else if rules.has_passed(player, entity) {
                    Some(Outcome::Passed { points })
                } else {
                    None
                }
            }
        };

        let Some(outcome) = outcome else {
            continue;
        };

        match outcome {
            Outcome::Hit => {
                entity.consumed = true;
                player.hit_flash_until = Some(now + policy.hit_flash);
                if policy.invincibility > 0.0 {
                    player.invincible_until = Some(now + policy.invincibility);
                }
            }
            Outcome::Collected { .. } => entity.consumed = true,
            Outcome::Passed { .. } => entity.scored = true,
        }

        log::debug!("Contact with entity {}: {:?}", entity.id, outcome);
        contacts.push(Contact {
            entity_id: entity.id,
            outcome,
        });

        if outcome == Outcome::Hit && policy.one_hit_per_frame {
            break;
        }
    }

    contacts
}
