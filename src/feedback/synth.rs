//! Procedural tone backend
//!
//! Renders each pattern offline into a mono PCM buffer - no audio device or
//! sample files needed. The audio event is a sine ping whose gain starts at
//! the event volume and ramps exponentially toward silence, the same shape as
//! a wall-hit sound effect. The haptic transient becomes a single amplitude.

use std::collections::VecDeque;
use std::f32::consts::TAU;
use std::sync::{Arc, Mutex};

use super::engine::{FeedbackEngine, FeedbackError, PlayerHandle, StartTime};
use super::pattern::{FeedbackPattern, PatternEvent};
use crate::lerp;

/// Output sample rate (Hz)
pub const SAMPLE_RATE: u32 = 48_000;
/// Tone frequency at pitch offset 0 (Hz)
pub const BASE_FREQUENCY: f32 = 400.0;
/// Shortest ring-out, used at decay 0 (seconds)
pub const MIN_DECAY_WINDOW: f32 = 0.01;
/// Gain ratio treated as silence at the end of the ramp
const SILENCE_RATIO: f32 = 0.01;
/// Rendered summaries kept for inspection
const HISTORY_LEN: usize = 64;

/// What one started player produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSummary {
    pub haptic_amplitude: f32,
    pub haptic_sharpness: f32,
    pub frequency: f32,
    pub volume: f32,
    pub decay_window: f32,
    pub samples: usize,
    pub peak: f32,
}

/// A rendered pattern
#[derive(Debug, Clone)]
pub struct Rendered {
    pub pcm: Vec<f32>,
    pub summary: ToneSummary,
}

/// Oscillator frequency for a pitch offset in octaves
pub fn pitch_to_frequency(pitch: f32) -> f32 {
    BASE_FREQUENCY * pitch.exp2()
}

/// Ring-out time for a decay parameter in [0, 1]
pub fn decay_window(decay: f32, duration: f32) -> f32 {
    lerp(MIN_DECAY_WINDOW, duration.max(MIN_DECAY_WINDOW), decay)
}

/// Render a pattern to PCM at [`SAMPLE_RATE`]
pub fn render(pattern: &FeedbackPattern) -> Rendered {
    let total = (pattern.duration() * SAMPLE_RATE as f32).ceil() as usize;
    let mut pcm = vec![0.0_f32; total];
    let mut summary = ToneSummary {
        haptic_amplitude: 0.0,
        haptic_sharpness: 0.0,
        frequency: 0.0,
        volume: 0.0,
        decay_window: 0.0,
        samples: total,
        peak: 0.0,
    };

    for event in &pattern.events {
        match *event {
            PatternEvent::HapticTransient {
                intensity, sharpness, ..
            } => {
                summary.haptic_amplitude = summary.haptic_amplitude.max(intensity);
                summary.haptic_sharpness = sharpness;
            }
            PatternEvent::AudioContinuous {
                time,
                duration,
                volume,
                pitch,
                decay,
            } => {
                let freq = pitch_to_frequency(pitch);
                let window = decay_window(decay, duration);
                // gain(t) = volume * SILENCE_RATIO^(t / window)
                let rate = SILENCE_RATIO.ln() / window;
                let start = (time * SAMPLE_RATE as f32) as usize;
                let len = (duration * SAMPLE_RATE as f32).ceil() as usize;
                for (i, sample) in pcm.iter_mut().skip(start).take(len).enumerate() {
                    let t = i as f32 / SAMPLE_RATE as f32;
                    let gain = if t < window { volume * (rate * t).exp() } else { 0.0 };
                    *sample += gain * (TAU * freq * t).sin();
                }
                summary.frequency = freq;
                summary.volume = volume;
                summary.decay_window = window;
            }
        }
    }

    summary.peak = pcm.iter().fold(0.0_f32, |m, s| m.max(s.abs()));
    Rendered { pcm, summary }
}

/// Offline [`FeedbackEngine`] that renders every started player
#[derive(Debug, Clone)]
pub struct ToneEngine {
    unavailable: Option<String>,
    running: bool,
    history: Arc<Mutex<VecDeque<ToneSummary>>>,
}

impl Default for ToneEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneEngine {
    pub fn new() -> Self {
        Self {
            unavailable: None,
            running: false,
            history: Arc::new(Mutex::new(VecDeque::with_capacity(HISTORY_LEN))),
        }
    }

    /// An engine whose every start fails, as on hardware without feedback
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::new()
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Most recent renders, oldest first
    pub fn history(&self) -> Vec<ToneSummary> {
        match self.history.lock() {
            Ok(h) => h.iter().copied().collect(),
            Err(poisoned) => poisoned.into_inner().iter().copied().collect(),
        }
    }
}

impl FeedbackEngine for ToneEngine {
    type Player = TonePlayer;

    fn start(&mut self) -> Result<(), FeedbackError> {
        if let Some(reason) = &self.unavailable {
            return Err(FeedbackError::EngineUnavailable(reason.clone()));
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn create_player(&mut self, pattern: &FeedbackPattern) -> Result<TonePlayer, FeedbackError> {
        if !self.running {
            return Err(FeedbackError::EngineUnavailable("tone engine is not running".into()));
        }
        if pattern.events.is_empty() {
            return Err(FeedbackError::PatternCreation("empty pattern".into()));
        }
        Ok(TonePlayer {
            pattern: pattern.clone(),
            history: Arc::clone(&self.history),
        })
    }
}

/// A pattern waiting to be rendered
#[derive(Debug)]
pub struct TonePlayer {
    pattern: FeedbackPattern,
    history: Arc<Mutex<VecDeque<ToneSummary>>>,
}

impl PlayerHandle for TonePlayer {
    fn start(&mut self, at: StartTime) -> Result<(), FeedbackError> {
        if let StartTime::At(t) = at {
            if !t.is_finite() {
                return Err(FeedbackError::Playback(format!("invalid start time {t}")));
            }
        }
        let rendered = render(&self.pattern);
        let s = rendered.summary;
        log::debug!(
            "Tone: haptic {:.2} (sharp {:.2}), {:.0} Hz at {:.2}, ring {:.0} ms, peak {:.3}",
            s.haptic_amplitude,
            s.haptic_sharpness,
            s.frequency,
            s.volume,
            s.decay_window * 1000.0,
            s.peak
        );

        let mut history = self
            .history
            .lock()
            .map_err(|_| FeedbackError::Playback("render history poisoned".into()))?;
        if history.len() == HISTORY_LEN {
            history.pop_front();
        }
        history.push_back(s);
        Ok(())
    }
}
