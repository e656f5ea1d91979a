//! Simulation state types
//!
//! The body, the rectangular boundary and the collision events the tick emits.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Body mass. Fixed; impulses and velocities are interchangeable.
pub const BODY_MASS: f32 = 1.0;

/// One side of the rectangular boundary. The y axis points up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wall {
    Left,
    Right,
    Top,
    Bottom,
}

impl Wall {
    /// Resolution order within a tick. Corner hits resolve left/right first.
    pub const ALL: [Wall; 4] = [Wall::Left, Wall::Right, Wall::Top, Wall::Bottom];

    /// Position in [`Wall::ALL`]
    pub fn index(&self) -> usize {
        match self {
            Wall::Left => 0,
            Wall::Right => 1,
            Wall::Top => 2,
            Wall::Bottom => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Wall::Left => "left",
            Wall::Right => "right",
            Wall::Top => "top",
            Wall::Bottom => "bottom",
        }
    }

    /// Unit normal pointing into the boundary
    pub fn inward_normal(&self) -> Vec2 {
        match self {
            Wall::Left => Vec2::X,
            Wall::Right => Vec2::NEG_X,
            Wall::Top => Vec2::NEG_Y,
            Wall::Bottom => Vec2::Y,
        }
    }

    /// True for the walls that bound the x coordinate
    pub fn is_vertical(&self) -> bool {
        matches!(self, Wall::Left | Wall::Right)
    }
}

/// The simulated point mass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
        }
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Kinetic energy (mass is fixed at 1)
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * BODY_MASS * self.vel.length_squared()
    }
}

/// Axis-aligned rectangle with every wall pushed outward by `epsilon`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub min: Vec2,
    pub max: Vec2,
    pub epsilon: f32,
}

impl Boundary {
    /// Rectangle from the origin to (width, height)
    pub fn new(width: f32, height: f32, epsilon: f32) -> Self {
        Self::from_corners(Vec2::ZERO, Vec2::new(width, height), epsilon)
    }

    pub fn from_corners(a: Vec2, b: Vec2, epsilon: f32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
            epsilon: epsilon.max(0.0),
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Effective coordinate of a wall after the epsilon offset
    pub fn wall_line(&self, wall: Wall) -> f32 {
        match wall {
            Wall::Left => self.min.x - self.epsilon,
            Wall::Right => self.max.x + self.epsilon,
            Wall::Top => self.max.y + self.epsilon,
            Wall::Bottom => self.min.y - self.epsilon,
        }
    }

    /// Allowed range for the center of a body with `radius`.
    ///
    /// When the body is wider than the box on an axis, both limits collapse
    /// to the box center on that axis.
    pub fn center_limits(&self, radius: f32) -> (Vec2, Vec2) {
        let lo = Vec2::new(self.wall_line(Wall::Left), self.wall_line(Wall::Bottom)) + radius;
        let hi = Vec2::new(self.wall_line(Wall::Right), self.wall_line(Wall::Top)) - radius;
        let c = self.center();
        let lo_x = if lo.x <= hi.x { lo.x } else { c.x };
        let hi_x = if lo.x <= hi.x { hi.x } else { c.x };
        let lo_y = if lo.y <= hi.y { lo.y } else { c.y };
        let hi_y = if lo.y <= hi.y { hi.y } else { c.y };
        (Vec2::new(lo_x, lo_y), Vec2::new(hi_x, hi_y))
    }

    /// Whether the body's center lies in its allowed range (within `tolerance`)
    pub fn contains_body(&self, body: &Body, tolerance: f32) -> bool {
        let (lo, hi) = self.center_limits(body.radius);
        body.pos.x >= lo.x - tolerance
            && body.pos.x <= hi.x + tolerance
            && body.pos.y >= lo.y - tolerance
            && body.pos.y <= hi.y + tolerance
    }
}

/// A wall contact detected during a tick. Consumed immediately by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub wall: Wall,
    /// Body velocity at contact, before reflection
    pub impact_velocity: Vec2,
    /// Simulation time of the contact (seconds since start)
    pub timestamp: f64,
}

impl CollisionEvent {
    pub fn impact_speed(&self) -> f32 {
        self.impact_velocity.length()
    }

    /// Speed into the wall along its normal (always >= 0 for a real contact)
    pub fn normal_speed(&self) -> f32 {
        (-self.impact_velocity.dot(self.wall.inward_normal())).max(0.0)
    }
}
