//! Wall contact detection and response
//!
//! Walls are axis aligned, so detection is a per-axis comparison against the
//! allowed range for the body's center, and response touches only the velocity
//! component along the wall normal.

use glam::Vec2;

use super::state::{Body, Boundary, Wall};
use crate::is_finite_vec;

/// Result of a wall contact check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallContact {
    pub wall: Wall,
    /// How far the body's center is past its allowed range (>= 0)
    pub penetration: f32,
    /// Speed into the wall along its normal (> 0 means approaching)
    pub approach_speed: f32,
}

/// Signed distance of the body's center past a wall's allowed range.
///
/// Negative means there is a gap between the body and that wall.
#[inline]
pub fn penetration(body: &Body, boundary: &Boundary, wall: Wall) -> f32 {
    let (lo, hi) = boundary.center_limits(body.radius);
    match wall {
        Wall::Left => lo.x - body.pos.x,
        Wall::Right => body.pos.x - hi.x,
        Wall::Top => body.pos.y - hi.y,
        Wall::Bottom => lo.y - body.pos.y,
    }
}

/// Check one wall for contact.
///
/// A contact needs the body to touch or cross the wall (epsilon included in
/// the wall line) while moving toward it. A body sitting on a wall and moving
/// away is not a new contact.
pub fn wall_contact(body: &Body, boundary: &Boundary, wall: Wall) -> Option<WallContact> {
    let penetration = penetration(body, boundary, wall);
    if penetration < 0.0 {
        return None;
    }

    let approach_speed = -body.vel.dot(wall.inward_normal());
    if approach_speed <= 0.0 {
        return None;
    }

    Some(WallContact {
        wall,
        penetration,
        approach_speed,
    })
}

/// Reflect the velocity component along a wall's normal, scaled by restitution.
///
/// The tangential component is untouched. The outgoing normal speed is
/// exactly `incoming * restitution`.
#[inline]
pub fn reflect_velocity(velocity: Vec2, wall: Wall, restitution: f32) -> Vec2 {
    let e = restitution.clamp(0.0, 1.0);
    let mut v = velocity;
    if wall.is_vertical() {
        if (v.x < 0.0 && wall == Wall::Left) || (v.x > 0.0 && wall == Wall::Right) {
            v.x = -v.x * e;
        }
    } else if (v.y > 0.0 && wall == Wall::Top) || (v.y < 0.0 && wall == Wall::Bottom) {
        v.y = -v.y * e;
    }
    v
}

/// Remove the velocity component into a wall (resting contact)
#[inline]
pub fn absorb_velocity(velocity: Vec2, wall: Wall) -> Vec2 {
    reflect_velocity(velocity, wall, 0.0)
}

/// Move the body back onto the wall it crossed
pub fn push_inside(body: &mut Body, boundary: &Boundary, wall: Wall) {
    let (lo, hi) = boundary.center_limits(body.radius);
    match wall {
        Wall::Left => body.pos.x = body.pos.x.max(lo.x),
        Wall::Right => body.pos.x = body.pos.x.min(hi.x),
        Wall::Top => body.pos.y = body.pos.y.min(hi.y),
        Wall::Bottom => body.pos.y = body.pos.y.max(lo.y),
    }
}

/// Final containment pass after wall resolution.
///
/// Catches drift the per-wall pass left behind (a body pushed out while
/// moving away from a wall, or non-finite state). Returns true if anything
/// had to be corrected.
pub fn clamp_to_boundary(body: &mut Body, boundary: &Boundary) -> bool {
    if !is_finite_vec(body.pos) || !is_finite_vec(body.vel) {
        body.pos = boundary.center();
        body.vel = Vec2::ZERO;
        return true;
    }

    let (lo, hi) = boundary.center_limits(body.radius);
    let clamped = body.pos.clamp(lo, hi);
    if clamped == body.pos {
        return false;
    }

    // Drop any velocity that still points out through the clamped side
    if clamped.x != body.pos.x {
        let outward = if body.pos.x < lo.x { body.vel.x < 0.0 } else { body.vel.x > 0.0 };
        if outward {
            body.vel.x = 0.0;
        }
    }
    if clamped.y != body.pos.y {
        let outward = if body.pos.y < lo.y { body.vel.y < 0.0 } else { body.vel.y > 0.0 };
        if outward {
            body.vel.y = 0.0;
        }
    }
    body.pos = clamped;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Boundary {
        Boundary::new(100.0, 100.0, 1.0)
    }

    #[test]
    fn test_contact_when_crossing_and_approaching() {
        let mut body = Body::new(Vec2::new(5.0, 50.0), 8.0);
        body.vel = Vec2::new(-30.0, 0.0);
        let contact = wall_contact(&body, &arena(), Wall::Left).unwrap();
        assert_eq!(contact.wall, Wall::Left);
        assert!((contact.penetration - 2.0).abs() < 1e-5);
        assert_eq!(contact.approach_speed, 30.0);
    }

    #[test]
    fn test_touching_counts_as_contact() {
        // Center exactly at the limit: -1 (epsilon) + 8 (radius) = 7
        let mut body = Body::new(Vec2::new(7.0, 50.0), 8.0);
        body.vel = Vec2::new(-1.0, 0.0);
        assert!(wall_contact(&body, &arena(), Wall::Left).is_some());
    }

    #[test]
    fn test_no_contact_when_moving_away() {
        let mut body = Body::new(Vec2::new(5.0, 50.0), 8.0);
        body.vel = Vec2::new(30.0, 0.0);
        assert!(wall_contact(&body, &arena(), Wall::Left).is_none());
    }

    #[test]
    fn test_no_contact_inside() {
        let mut body = Body::new(Vec2::new(50.0, 50.0), 8.0);
        body.vel = Vec2::new(-100.0, -100.0);
        for wall in Wall::ALL {
            assert!(wall_contact(&body, &arena(), wall).is_none());
        }
    }

    #[test]
    fn test_reflect_velocity_scales_normal_only() {
        let v = reflect_velocity(Vec2::new(-100.0, 40.0), Wall::Left, 0.5);
        assert_eq!(v, Vec2::new(50.0, 40.0));

        let v = reflect_velocity(Vec2::new(10.0, 80.0), Wall::Top, 0.25);
        assert_eq!(v, Vec2::new(10.0, -20.0));
    }

    #[test]
    fn test_reflect_velocity_ignores_receding() {
        let v = Vec2::new(100.0, 0.0);
        assert_eq!(reflect_velocity(v, Wall::Left, 0.5), v);
    }

    #[test]
    fn test_absorb_velocity() {
        assert_eq!(absorb_velocity(Vec2::new(3.0, -2.0), Wall::Bottom), Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_push_inside() {
        let mut body = Body::new(Vec2::new(120.0, 50.0), 8.0);
        push_inside(&mut body, &arena(), Wall::Right);
        assert_eq!(body.pos.x, 93.0);
    }

    #[test]
    fn test_clamp_to_boundary_recovers_non_finite() {
        let mut body = Body::new(Vec2::new(f32::NAN, 10.0), 8.0);
        body.vel = Vec2::new(1.0, 1.0);
        assert!(clamp_to_boundary(&mut body, &arena()));
        assert_eq!(body.pos, Vec2::new(50.0, 50.0));
        assert_eq!(body.vel, Vec2::ZERO);
    }

    #[test]
    fn test_clamp_to_boundary_noop_inside() {
        let mut body = Body::new(Vec2::new(40.0, 60.0), 8.0);
        body.vel = Vec2::new(5.0, -5.0);
        assert!(!clamp_to_boundary(&mut body, &arena()));
        assert_eq!(body.pos, Vec2::new(40.0, 60.0));
    }
}
