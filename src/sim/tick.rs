//! Fixed timestep simulation tick
//!
//! Integrates the body under gravity, resolves wall contacts in a fixed order
//! and hands each contact to a `CollisionHandler` as it is resolved.

use std::sync::Arc;

use glam::Vec2;

use super::collision::{
    absorb_velocity, clamp_to_boundary, penetration, push_inside, reflect_velocity, wall_contact,
};
use super::mailbox::GravityMailbox;
use super::state::{Body, Boundary, CollisionEvent, Wall};
use crate::config::{PhysicsConfig, WallRestitution};
use crate::is_finite_vec;

/// Receives the collision events of a tick, in resolution order
pub trait CollisionHandler {
    fn on_collision(&mut self, event: &CollisionEvent);
}

impl<F> CollisionHandler for F
where
    F: FnMut(&CollisionEvent),
{
    fn on_collision(&mut self, event: &CollisionEvent) {
        self(event)
    }
}

/// Handler that keeps every event it is given
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog(pub Vec<CollisionEvent>);

impl EventLog {
    pub fn into_inner(self) -> Vec<CollisionEvent> {
        self.0
    }
}

impl CollisionHandler for EventLog {
    fn on_collision(&mut self, event: &CollisionEvent) {
        self.0.push(*event);
    }
}

/// Gap (points) beyond which a body no longer counts as touching a wall
const CONTACT_SLOP: f32 = 0.01;

/// The body, its box, and the gravity it falls under
#[derive(Debug)]
pub struct PhysicsSimulator {
    body: Body,
    boundary: Boundary,
    restitution: WallRestitution,
    /// Last valid gravity sample, in sensor units (g)
    gravity: Vec2,
    /// Sensor units to points/s²
    gravity_scale: f32,
    resting_speed: f32,
    /// Walls the body touched at the end of the last tick, by `Wall::index`
    touching: [bool; 4],
    mailbox: Arc<GravityMailbox>,
    /// Simulation clock (seconds)
    time: f64,
    ticks: u64,
}

impl PhysicsSimulator {
    /// Body at rest in the center of the box, gravity straight down
    pub fn new(config: &PhysicsConfig) -> Self {
        let boundary = Boundary::new(config.width, config.height, config.edge_epsilon);
        Self {
            body: Body::new(boundary.center(), config.body_radius),
            boundary,
            restitution: config.restitution,
            gravity: Vec2::NEG_Y,
            gravity_scale: config.gravity_scale,
            resting_speed: config.resting_speed,
            touching: [false; 4],
            mailbox: Arc::new(GravityMailbox::new()),
            time: 0.0,
            ticks: 0,
        }
    }

    /// Replace the body (position is clamped into the box)
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        clamp_to_boundary(&mut self.body, &self.boundary);
        self.touching = [false; 4];
        self
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn restitution(&self) -> &WallRestitution {
        &self.restitution
    }

    /// Gravity the next tick will use (sensor units)
    pub fn gravity(&self) -> Vec2 {
        self.mailbox.latest().unwrap_or(self.gravity)
    }

    /// Post a gravity sample from the simulation's own thread.
    ///
    /// Same path as the sensor: invalid samples are ignored.
    pub fn set_gravity(&self, sample: Vec2) -> bool {
        self.mailbox.post(sample)
    }

    /// Shared mailbox for a producer on another thread
    pub fn gravity_mailbox(&self) -> Arc<GravityMailbox> {
        Arc::clone(&self.mailbox)
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance one step and collect the collision events
    pub fn tick(&mut self, dt: f32) -> Vec<CollisionEvent> {
        let mut log = EventLog::default();
        self.tick_with(dt, &mut log);
        log.into_inner()
    }

    /// Advance one step, handing each collision to `handler` as it resolves.
    ///
    /// Returns the number of collision events emitted (0, 1 or 2 in practice).
    pub fn tick_with<H>(&mut self, dt: f32, handler: &mut H) -> usize
    where
        H: CollisionHandler + ?Sized,
    {
        if !(dt > 0.0 && dt.is_finite()) {
            log::debug!("Skipping tick with invalid dt {dt}");
            return 0;
        }

        if let Some(sample) = self.mailbox.latest() {
            self.gravity = sample;
        }

        // A wall stays in contact until the body actually leaves it
        for wall in Wall::ALL {
            if penetration(&self.body, &self.boundary, wall) < -CONTACT_SLOP {
                self.touching[wall.index()] = false;
            }
        }

        self.ticks += 1;
        self.time += dt as f64;

        // Semi-implicit Euler
        let accel = self.gravity * self.gravity_scale;
        self.body.vel += accel * dt;
        self.body.pos += self.body.vel * dt;

        // Every contact this tick happens at the same instant, so they all
        // report the velocity from before any reflection.
        let incoming = self.body.vel;
        let mut emitted = 0;

        for wall in Wall::ALL {
            let Some(contact) = wall_contact(&self.body, &self.boundary, wall) else {
                continue;
            };

            // Gravity pressing a resting body into a wall it never left is
            // not a new impact
            let continuing = std::mem::replace(&mut self.touching[wall.index()], true);
            if continuing || contact.approach_speed < self.resting_speed {
                self.body.vel = absorb_velocity(self.body.vel, wall);
                push_inside(&mut self.body, &self.boundary, wall);
                continue;
            }

            let e = self.restitution.for_wall(wall);
            self.body.vel = reflect_velocity(self.body.vel, wall, e);
            push_inside(&mut self.body, &self.boundary, wall);

            let event = CollisionEvent {
                wall,
                impact_velocity: incoming,
                timestamp: self.time,
            };
            handler.on_collision(&event);
            emitted += 1;
        }

        if clamp_to_boundary(&mut self.body, &self.boundary) {
            log::debug!(
                "Corrected boundary violation at tick {}: pos={:?}",
                self.ticks,
                self.body.pos
            );
        }

        debug_assert!(is_finite_vec(self.body.pos));
        emitted
    }
}
