//! Arc segment geometry for shields, gates and orbiting paddles
//!
//! In polar coordinates around the owner's position, an arc segment is defined by:
//! - radius: distance from center
//! - thickness: radial extent (inner = radius - thickness/2, outer = radius + thickness/2)
//! - theta_start, theta_end: angular extent, swept counter-clockwise from start to end

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::normalize_angle;

/// A thickened arc segment in polar space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcSegment {
    /// Centerline radius from the owner's center
    pub radius: f32,
    /// Radial thickness (extends radius ± thickness/2)
    pub thickness: f32,
    /// Start angle (radians, normalized to [0, 2π))
    pub theta_start: f32,
    /// End angle (radians, normalized to [0, 2π))
    pub theta_end: f32,
}

impl ArcSegment {
    pub fn new(radius: f32, thickness: f32, theta_start: f32, theta_end: f32) -> Self {
        Self {
            radius,
            thickness,
            theta_start: normalize_angle(theta_start),
            theta_end: normalize_angle(theta_end),
        }
    }

    /// Build an arc from its mid angle and angular width
    pub fn centered(radius: f32, thickness: f32, mid_theta: f32, width: f32) -> Self {
        Self::new(radius, thickness, mid_theta - width / 2.0, mid_theta + width / 2.0)
    }

    /// Inner radius of the arc band
    #[inline]
    pub fn inner_radius(&self) -> f32 {
        (self.radius - self.thickness / 2.0).max(0.0)
    }

    /// Outer radius of the arc band
    #[inline]
    pub fn outer_radius(&self) -> f32 {
        self.radius + self.thickness / 2.0
    }

    /// Angular span of the arc (handles wraparound)
    pub fn angular_span(&self) -> f32 {
        let mut span = self.theta_end - self.theta_start;
        if span < 0.0 {
            span += std::f32::consts::TAU;
        }
        span
    }

    /// Mid angle of the arc, normalized
    pub fn mid_angle(&self) -> f32 {
        normalize_angle(self.theta_start + self.angular_span() / 2.0)
    }

    /// Rotate the arc so its mid angle sits at `mid_theta`, keeping its width
    pub fn set_mid_angle(&mut self, mid_theta: f32) {
        let half = self.angular_span() / 2.0;
        self.theta_start = normalize_angle(mid_theta - half);
        self.theta_end = normalize_angle(mid_theta + half);
    }

    /// Check if an angle is within the arc's angular extent (bounds inclusive)
    pub fn contains_angle(&self, theta: f32) -> bool {
        let theta = normalize_angle(theta);
        let start = self.theta_start;
        let end = self.theta_end;

        if start <= end {
            // No wraparound
            theta >= start && theta <= end
        } else {
            // Crosses 0 (e.g., start=350°, end=20°)
            theta >= start || theta <= end
        }
    }

    /// Check whether a circle (center relative to the arc's center) touches the band.
    ///
    /// The circle's center angle must lie inside the arc; the radial test is
    /// widened by the circle radius on both sides.
    pub fn touches_circle(&self, point: Vec2, circle_radius: f32) -> bool {
        let r = point.length();
        if r + circle_radius < self.inner_radius() || r - circle_radius > self.outer_radius() {
            return false;
        }
        self.contains_angle(point.y.atan2(point.x))
    }
}
