//! Impact feedback
//!
//! Collision events are mapped to a [`PatternDescriptor`], turned into a
//! one-shot pattern and played on a [`FeedbackEngine`]. Playback is
//! fire-and-forget: nothing in here ever reports back to the simulation.

pub mod engine;
pub mod mapper;
pub mod pattern;
pub mod pipeline;
pub mod scheduler;
pub mod synth;
pub mod worker;

pub use engine::{FeedbackEngine, FeedbackError, PlayerHandle, StartTime};
pub use mapper::{CollisionEventMapper, PatternDescriptor};
pub use pattern::{FeedbackPattern, PatternEvent};
pub use pipeline::{DescriptorSink, FeedbackPipeline};
pub use scheduler::{
    DispatchOutcome, DispatchStats, EngineEvent, EngineState, InterruptSignal, PlaybackScheduler,
};
pub use synth::{ToneEngine, TonePlayer, ToneSummary};
pub use worker::{DispatchQueue, DispatchRequest, DispatchWorker};
