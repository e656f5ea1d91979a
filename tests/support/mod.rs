// Shared engine double and simulator setups for the end-to-end scenarios.

use std::sync::{Arc, Mutex};

use glam::Vec2;
use tilt_bounce::feedback::{FeedbackPattern, StartTime};
use tilt_bounce::{Body, FeedbackEngine, FeedbackError, PatternDescriptor, PhysicsConfig, PhysicsSimulator, PlayerHandle};

// Everything the engine saw, in call order.
#[derive(Debug, Default, Clone)]
pub struct Seen {
    pub start_calls: u32,
    pub descriptors: Vec<PatternDescriptor>,
    pub players_created: u32,
    pub players_started: u32,
}

// Engine that records calls and can refuse to start.
#[derive(Clone, Default)]
pub struct CountingEngine {
    seen: Arc<Mutex<Seen>>,
    unavailable: bool,
}

impl CountingEngine {
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn seen(&self) -> Seen {
        self.seen.lock().unwrap().clone()
    }
}

pub struct CountingPlayer(Arc<Mutex<Seen>>);

impl PlayerHandle for CountingPlayer {
    fn start(&mut self, _at: StartTime) -> Result<(), FeedbackError> {
        self.0.lock().unwrap().players_started += 1;
        Ok(())
    }
}

impl FeedbackEngine for CountingEngine {
    type Player = CountingPlayer;

    fn start(&mut self) -> Result<(), FeedbackError> {
        self.seen.lock().unwrap().start_calls += 1;
        if self.unavailable {
            return Err(FeedbackError::EngineUnavailable("no feedback hardware".into()));
        }
        Ok(())
    }

    fn stop(&mut self) {}

    fn build_pattern(&mut self, descriptor: &PatternDescriptor) -> Result<FeedbackPattern, FeedbackError> {
        self.seen.lock().unwrap().descriptors.push(*descriptor);
        FeedbackPattern::transient(descriptor)
    }

    fn create_player(&mut self, _pattern: &FeedbackPattern) -> Result<CountingPlayer, FeedbackError> {
        self.seen.lock().unwrap().players_created += 1;
        Ok(CountingPlayer(Arc::clone(&self.seen)))
    }
}

// Box 200x400, no gravity, body one tick away from the bottom-left corner.
pub fn corner_simulator(velocity: Vec2) -> PhysicsSimulator {
    let config = PhysicsConfig {
        width: 200.0,
        height: 400.0,
        body_radius: 10.0,
        ..Default::default()
    };
    let sim = PhysicsSimulator::new(&config);
    sim.set_gravity(Vec2::ZERO);
    let lo = config.body_radius - config.edge_epsilon;
    let mut body = Body::new(Vec2::splat(lo + 0.5), config.body_radius);
    body.vel = velocity;
    sim.with_body(body)
}

// Default box with the body launched diagonally so it keeps hitting walls.
pub fn bouncing_simulator() -> PhysicsSimulator {
    let sim = PhysicsSimulator::new(&PhysicsConfig::default());
    let mut body = sim.body().clone();
    body.vel = Vec2::new(700.0, 900.0);
    sim.with_body(body)
}
