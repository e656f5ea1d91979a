//! Tilt Bounce - a body bouncing in a box, felt through haptics and sound
//!
//! Core modules:
//! - `sim`: Deterministic simulation (integration, wall collisions, gravity mailbox)
//! - `feedback`: Impact-to-pattern mapping and fire-and-forget playback scheduling
//! - `motion`: Gravity sample sources feeding the simulation
//! - `config`: Externally supplied calibration and tuning

pub mod config;
pub mod feedback;
pub mod motion;
pub mod sim;

pub use config::{Config, ConfigError, MappingConfig, PhysicsConfig, PlaybackConfig, SharpnessCurve};
pub use feedback::{
    CollisionEventMapper, DispatchOutcome, DispatchStats, EngineState, FeedbackEngine,
    FeedbackError, FeedbackPipeline, PatternDescriptor, PlaybackScheduler, PlayerHandle,
};
pub use sim::{Body, Boundary, CollisionEvent, GravityMailbox, PhysicsSimulator, Wall};

/// Runtime constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the stepper will account for (tab switches, debugger pauses)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default pitch offset for the audio half of a pattern
    pub const DEFAULT_AUDIO_PITCH: f32 = -0.15;
}

/// Linear interpolation from `a` to `b`, exact at both endpoints.
///
/// Non-decreasing in `t` when `a <= b`, which the mapper relies on for
/// volume and decay.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    if t <= 0.0 {
        a
    } else if t >= 1.0 {
        b
    } else {
        (a + (b - a) * t).min(b)
    }
}

/// True when both components are finite (no NaN or infinity)
#[inline]
pub fn is_finite_vec(v: glam::Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}
