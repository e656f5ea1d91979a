//! Feedback engine seam
//!
//! The backend that actually vibrates and plays sound sits behind these
//! traits. The core only ever builds a pattern, creates a player from it and
//! starts that player once; it never keeps the player around.

use thiserror::Error;

use super::mapper::PatternDescriptor;
use super::pattern::FeedbackPattern;

/// Failures reported by a feedback backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedbackError {
    /// Platform or hardware cannot run the engine (or it died)
    #[error("feedback engine unavailable: {0}")]
    EngineUnavailable(String),
    /// Pattern parameters were rejected
    #[error("pattern creation failed: {0}")]
    PatternCreation(String),
    /// Transient backend fault while starting playback
    #[error("playback failed: {0}")]
    Playback(String),
}

/// When a player should begin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartTime {
    /// Earliest time the backend can schedule
    Immediate,
    /// Engine time in seconds
    At(f64),
}

/// One started playback. Dropping the handle must not stop the sound.
pub trait PlayerHandle {
    fn start(&mut self, at: StartTime) -> Result<(), FeedbackError>;
}

/// A haptic + audio backend
pub trait FeedbackEngine {
    type Player: PlayerHandle;

    /// Bring the engine up. Fails with `EngineUnavailable`.
    fn start(&mut self) -> Result<(), FeedbackError>;

    /// Stop accepting new players. Need not cut off playback in flight.
    fn stop(&mut self);

    /// Turn a descriptor into a playable pattern
    fn build_pattern(&mut self, descriptor: &PatternDescriptor) -> Result<FeedbackPattern, FeedbackError> {
        FeedbackPattern::transient(descriptor)
    }

    /// Create a player for a pattern. Fails with `PatternCreation` on
    /// parameters the backend cannot render.
    fn create_player(&mut self, pattern: &FeedbackPattern) -> Result<Self::Player, FeedbackError>;
}
