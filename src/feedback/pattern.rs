//! Playable feedback patterns
//!
//! A pattern is what an engine turns into a player. For a wall impact it is
//! always one haptic transient plus one short continuous audio event, both
//! starting at relative time 0.

use serde::{Deserialize, Serialize};

use super::engine::FeedbackError;
use super::mapper::PatternDescriptor;

/// Length of the audio event in a transient pattern (seconds)
pub const AUDIO_EVENT_DURATION: f32 = 0.1;

/// One event inside a pattern, timed relative to the pattern start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PatternEvent {
    HapticTransient {
        time: f32,
        intensity: f32,
        sharpness: f32,
    },
    AudioContinuous {
        time: f32,
        duration: f32,
        volume: f32,
        pitch: f32,
        decay: f32,
    },
}

impl PatternEvent {
    pub fn time(&self) -> f32 {
        match *self {
            PatternEvent::HapticTransient { time, .. } | PatternEvent::AudioContinuous { time, .. } => {
                time
            }
        }
    }

    /// When this event stops producing output, relative to pattern start
    pub fn end_time(&self) -> f32 {
        match *self {
            PatternEvent::HapticTransient { time, .. } => time,
            PatternEvent::AudioContinuous { time, duration, .. } => time + duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPattern {
    pub events: Vec<PatternEvent>,
}

impl FeedbackPattern {
    /// Build the impact pattern for a descriptor.
    ///
    /// Fails with `PatternCreation` when a parameter is non-finite or out of
    /// range.
    pub fn transient(descriptor: &PatternDescriptor) -> Result<Self, FeedbackError> {
        if !descriptor.is_well_formed() {
            return Err(FeedbackError::PatternCreation(format!(
                "descriptor out of range: {descriptor:?}"
            )));
        }
        Ok(Self {
            events: vec![
                PatternEvent::HapticTransient {
                    time: 0.0,
                    intensity: descriptor.haptic_intensity,
                    sharpness: descriptor.haptic_sharpness,
                },
                PatternEvent::AudioContinuous {
                    time: 0.0,
                    duration: AUDIO_EVENT_DURATION,
                    volume: descriptor.audio_volume,
                    pitch: descriptor.audio_pitch,
                    decay: descriptor.audio_decay,
                },
            ],
        })
    }

    /// Time until the last event ends
    pub fn duration(&self) -> f32 {
        self.events.iter().map(PatternEvent::end_time).fold(0.0, f32::max)
    }

    pub fn haptic_events(&self) -> impl Iterator<Item = &PatternEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, PatternEvent::HapticTransient { .. }))
    }

    pub fn audio_events(&self) -> impl Iterator<Item = &PatternEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, PatternEvent::AudioContinuous { .. }))
    }
}
