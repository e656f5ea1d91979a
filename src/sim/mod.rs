//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Walls resolved in a fixed order (left, right, top, bottom)
//! - Gravity read from a single-slot mailbox, never from a queue
//! - No feedback or platform dependencies

pub mod collision;
pub mod mailbox;
pub mod state;
pub mod stepper;
pub mod tick;

pub use collision::{WallContact, penetration, reflect_velocity, wall_contact};
pub use mailbox::GravityMailbox;
pub use state::{BODY_MASS, Body, Boundary, CollisionEvent, Wall};
pub use stepper::FixedStepper;
pub use tick::{CollisionHandler, EventLog, PhysicsSimulator};
