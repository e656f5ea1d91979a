//! Collision events in, playback out

use super::engine::FeedbackEngine;
use super::mapper::{CollisionEventMapper, PatternDescriptor};
use super::scheduler::PlaybackScheduler;
use crate::sim::{CollisionEvent, CollisionHandler};

/// Where mapped descriptors go
pub trait DescriptorSink {
    fn submit(&mut self, descriptor: PatternDescriptor, timestamp: f64);
}

impl<E: FeedbackEngine> DescriptorSink for PlaybackScheduler<E> {
    fn submit(&mut self, descriptor: PatternDescriptor, timestamp: f64) {
        self.dispatch(&descriptor, timestamp);
    }
}

/// Maps every collision event and hands the descriptor to a sink.
///
/// Plugs straight into [`PhysicsSimulator::tick_with`](crate::sim::PhysicsSimulator::tick_with),
/// so each event reaches the sink before the next one is resolved.
pub struct FeedbackPipeline<S> {
    mapper: CollisionEventMapper,
    sink: S,
}

impl<S: DescriptorSink> FeedbackPipeline<S> {
    pub fn new(mapper: CollisionEventMapper, sink: S) -> Self {
        Self { mapper, sink }
    }

    pub fn mapper(&self) -> &CollisionEventMapper {
        &self.mapper
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_inner(self) -> (CollisionEventMapper, S) {
        (self.mapper, self.sink)
    }
}

impl<S: DescriptorSink> CollisionHandler for FeedbackPipeline<S> {
    fn on_collision(&mut self, event: &CollisionEvent) {
        let descriptor = self.mapper.map(event);
        log::trace!(
            "{} wall hit at {:.1} px/s -> intensity {:.3}",
            event.wall.as_str(),
            event.impact_speed(),
            descriptor.haptic_intensity
        );
        self.sink.submit(descriptor, event.timestamp);
    }
}
