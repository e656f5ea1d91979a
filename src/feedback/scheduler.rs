//! Fire-and-forget playback scheduling
//!
//! The scheduler owns the engine and its lifecycle:
//!
//! ```text
//! Stopped ──start──▶ Starting ──ok──▶ Running
//!                       │                │ interrupted / reset
//!                       ▼ err            ▼
//!                    Failed ◀─────────── Failed
//!                       │ restart attempt
//!                       └──────▶ Starting
//! ```
//!
//! Dispatch only reaches the engine in `Running`. Anything that goes wrong is
//! logged and the event is dropped; nothing here returns an error to the
//! simulation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use super::engine::{FeedbackEngine, FeedbackError, PlayerHandle, StartTime};
use super::mapper::PatternDescriptor;
use crate::config::PlaybackConfig;

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Starting,
    Running,
    Failed,
}

impl EngineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineState::Stopped => "stopped",
            EngineState::Starting => "starting",
            EngineState::Running => "running",
            EngineState::Failed => "failed",
        }
    }
}

/// Backend notifications that take a running engine down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Playback was interrupted (another app took the audio session, etc.)
    Interrupted,
    /// The backend reset and lost its state
    Reset,
}

const SIGNAL_NONE: u8 = 0;
const SIGNAL_INTERRUPTED: u8 = 1;
const SIGNAL_RESET: u8 = 2;

/// Thread-safe flag the backend glue raises from its own callbacks.
///
/// The scheduler picks it up at the start of its next dispatch.
#[derive(Debug, Clone, Default)]
pub struct InterruptSignal(Arc<AtomicU8>);

impl InterruptSignal {
    pub fn raise(&self, event: EngineEvent) {
        let code = match event {
            EngineEvent::Interrupted => SIGNAL_INTERRUPTED,
            EngineEvent::Reset => SIGNAL_RESET,
        };
        self.0.store(code, Ordering::Release);
    }

    /// Take the pending event, if any
    pub fn take(&self) -> Option<EngineEvent> {
        match self.0.swap(SIGNAL_NONE, Ordering::AcqRel) {
            SIGNAL_INTERRUPTED => Some(EngineEvent::Interrupted),
            SIGNAL_RESET => Some(EngineEvent::Reset),
            _ => None,
        }
    }
}

/// What happened to one dispatched descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A player was created and started
    Started,
    /// Dropped by the minimum-spacing limiter
    Suppressed,
    /// Dropped because the engine is not running
    EngineDown,
    /// Pattern creation or player start failed; dropped
    Failed,
}

/// Running counts of dispatch outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub started: u64,
    pub suppressed: u64,
    pub dropped_engine_down: u64,
    pub failed: u64,
    pub players_created: u64,
    pub restart_attempts: u64,
    pub restarts_failed: u64,
}

impl DispatchStats {
    pub fn total(&self) -> u64 {
        self.started + self.suppressed + self.dropped_engine_down + self.failed
    }
}

/// Optional minimum spacing between played events
#[derive(Debug, Clone)]
struct SpacingLimiter {
    min_spacing: f64,
    last_played: Option<f64>,
}

impl SpacingLimiter {
    fn new(min_spacing: f32) -> Self {
        Self {
            min_spacing: min_spacing as f64,
            last_played: None,
        }
    }

    /// Admit an event at `timestamp`, recording it if admitted
    fn admit(&mut self, timestamp: f64) -> bool {
        if let Some(last) = self.last_played {
            // A clock that went backwards restarts the window
            if timestamp >= last && timestamp - last < self.min_spacing {
                return false;
            }
        }
        self.last_played = Some(timestamp);
        true
    }
}

/// Owns a feedback engine and plays descriptors on it
pub struct PlaybackScheduler<E: FeedbackEngine> {
    engine: E,
    state: EngineState,
    auto_restart: bool,
    restart_interval: f64,
    last_restart_attempt: Option<f64>,
    limiter: Option<SpacingLimiter>,
    interrupts: InterruptSignal,
    stats: DispatchStats,
}

impl<E: FeedbackEngine> PlaybackScheduler<E> {
    pub fn new(engine: E, config: &PlaybackConfig) -> Self {
        Self {
            engine,
            state: EngineState::Stopped,
            auto_restart: config.auto_restart,
            restart_interval: config.restart_interval.max(0.0) as f64,
            last_restart_attempt: None,
            limiter: config.min_event_spacing.map(SpacingLimiter::new),
            interrupts: InterruptSignal::default(),
            stats: DispatchStats::default(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Handle for the backend glue to report interruptions
    pub fn interrupt_signal(&self) -> InterruptSignal {
        self.interrupts.clone()
    }

    /// Start (or restart) the engine.
    ///
    /// The error is returned so startup can surface it once; the scheduler
    /// itself keeps working in degraded mode either way.
    pub fn start(&mut self) -> Result<(), FeedbackError> {
        if self.state == EngineState::Running {
            return Ok(());
        }
        let was = self.state;
        self.state = EngineState::Starting;
        match self.engine.start() {
            Ok(()) => {
                self.state = EngineState::Running;
                if was == EngineState::Failed {
                    log::info!("Feedback engine restarted");
                } else {
                    log::info!("Feedback engine started");
                }
                Ok(())
            }
            Err(e) => {
                self.state = EngineState::Failed;
                // Only the first failure after a working state is worth a warning
                if was == EngineState::Failed {
                    log::debug!("Feedback engine restart failed: {e}");
                } else {
                    log::warn!("{e} - continuing without feedback");
                }
                Err(e)
            }
        }
    }

    /// Record a backend interruption or reset
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        if self.state == EngineState::Running {
            log::warn!("Feedback engine {event:?}; will restart before next event");
            self.state = EngineState::Failed;
            self.last_restart_attempt = None;
        }
    }

    /// Stop the engine and future dispatches. Playback in flight continues.
    pub fn shutdown(&mut self) {
        if self.state != EngineState::Stopped {
            self.engine.stop();
            self.state = EngineState::Stopped;
            log::info!("Feedback engine stopped");
        }
    }

    /// Play a descriptor now, fire-and-forget.
    ///
    /// `timestamp` is the simulation time of the collision; it drives the
    /// spacing limiter and restart pacing.
    pub fn dispatch(&mut self, descriptor: &PatternDescriptor, timestamp: f64) -> DispatchOutcome {
        if let Some(event) = self.interrupts.take() {
            self.handle_engine_event(event);
        }

        if self.state == EngineState::Failed && self.auto_restart && self.restart_due(timestamp) {
            self.last_restart_attempt = Some(timestamp);
            self.stats.restart_attempts += 1;
            if self.start().is_err() {
                self.stats.restarts_failed += 1;
            }
        }

        if self.state != EngineState::Running {
            log::debug!("Feedback engine {}; dropping event", self.state.as_str());
            self.stats.dropped_engine_down += 1;
            return DispatchOutcome::EngineDown;
        }

        if let Some(limiter) = &mut self.limiter {
            if !limiter.admit(timestamp) {
                log::trace!("Event at {timestamp:.3}s inside minimum spacing; suppressed");
                self.stats.suppressed += 1;
                return DispatchOutcome::Suppressed;
            }
        }

        match self.play(descriptor) {
            Ok(()) => {
                self.stats.started += 1;
                DispatchOutcome::Started
            }
            Err(e) => {
                log::warn!("Dropping feedback event: {e}");
                self.stats.failed += 1;
                if matches!(e, FeedbackError::EngineUnavailable(_)) {
                    self.state = EngineState::Failed;
                    self.last_restart_attempt = None;
                }
                DispatchOutcome::Failed
            }
        }
    }

    fn restart_due(&self, timestamp: f64) -> bool {
        match self.last_restart_attempt {
            None => true,
            Some(last) => timestamp < last || timestamp - last >= self.restart_interval,
        }
    }

    fn play(&mut self, descriptor: &PatternDescriptor) -> Result<(), FeedbackError> {
        let pattern = self.engine.build_pattern(descriptor)?;
        let mut player = self.engine.create_player(&pattern)?;
        self.stats.players_created += 1;
        player.start(StartTime::Immediate)
        // `player` drops here; playback is the engine's business now
    }
}

impl<E: FeedbackEngine> Drop for PlaybackScheduler<E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
