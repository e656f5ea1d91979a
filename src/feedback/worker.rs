//! Background dispatch
//!
//! The simulation thread must never wait on the feedback backend. The worker
//! owns the scheduler on its own thread; the simulation side only does a
//! non-blocking `try_send` into a bounded queue.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use super::engine::FeedbackEngine;
use super::mapper::PatternDescriptor;
use super::pipeline::DescriptorSink;
use super::scheduler::PlaybackScheduler;

/// One descriptor on its way to the worker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchRequest {
    pub descriptor: PatternDescriptor,
    pub timestamp: f64,
}

enum Msg {
    Dispatch(DispatchRequest),
    Shutdown,
}

/// Sending half of the worker queue. Cheap to clone.
#[derive(Clone)]
pub struct DispatchQueue {
    tx: SyncSender<Msg>,
    dropped: Arc<AtomicU64>,
}

impl DispatchQueue {
    /// Queue a request without blocking.
    ///
    /// Returns false when the queue is full or the worker is gone; the
    /// request is dropped either way.
    pub fn try_submit(&self, request: DispatchRequest) -> bool {
        match self.tx.try_send(Msg::Dispatch(request)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let n = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                log::warn!("Feedback queue full; dropped event at {:.3}s ({n} total)", request.timestamp);
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::debug!("Feedback worker gone; dropping event");
                false
            }
        }
    }

    /// Requests dropped before reaching the worker
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl DescriptorSink for DispatchQueue {
    fn submit(&mut self, descriptor: PatternDescriptor, timestamp: f64) {
        self.try_submit(DispatchRequest {
            descriptor,
            timestamp,
        });
    }
}

/// Thread running a [`PlaybackScheduler`]
pub struct DispatchWorker<E: FeedbackEngine> {
    tx: SyncSender<Msg>,
    handle: JoinHandle<PlaybackScheduler<E>>,
}

impl<E> DispatchWorker<E>
where
    E: FeedbackEngine + Send + 'static,
{
    /// Move `scheduler` onto a new thread fed by a queue of `capacity` requests
    pub fn spawn(scheduler: PlaybackScheduler<E>, capacity: usize) -> io::Result<(Self, DispatchQueue)> {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        let handle = thread::Builder::new()
            .name("feedback-dispatch".into())
            .spawn(move || run(scheduler, rx))?;
        let queue = DispatchQueue {
            tx: tx.clone(),
            dropped: Arc::new(AtomicU64::new(0)),
        };
        Ok((Self { tx, handle }, queue))
    }

    /// Drain the queue, stop the worker and hand the scheduler back.
    ///
    /// Returns `None` if the worker thread panicked.
    pub fn shutdown(self) -> Option<PlaybackScheduler<E>> {
        // Blocks only until there is room; the worker is always draining
        if self.tx.send(Msg::Shutdown).is_err() {
            log::debug!("Feedback worker already exited");
        }
        match self.handle.join() {
            Ok(scheduler) => Some(scheduler),
            Err(_) => {
                log::error!("Feedback worker panicked");
                None
            }
        }
    }
}

fn run<E: FeedbackEngine>(mut scheduler: PlaybackScheduler<E>, rx: Receiver<Msg>) -> PlaybackScheduler<E> {
    log::debug!("Feedback worker started");
    while let Ok(msg) = rx.recv() {
        match msg {
            Msg::Dispatch(request) => {
                scheduler.dispatch(&request.descriptor, request.timestamp);
            }
            Msg::Shutdown => break,
        }
    }
    log::debug!("Feedback worker exiting after {} events", scheduler.stats().total());
    scheduler
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaybackConfig;
    use crate::feedback::EngineState;
    use crate::feedback::testing::ScriptedEngine;

    fn descriptor(intensity: f32) -> PatternDescriptor {
        PatternDescriptor {
            haptic_intensity: intensity,
            haptic_sharpness: intensity,
            audio_volume: 0.2,
            audio_pitch: -0.15,
            audio_decay: 0.02,
        }
    }

    #[test]
    fn test_worker_plays_in_submission_order() {
        let engine = ScriptedEngine::default();
        let mut scheduler = PlaybackScheduler::new(engine.clone(), &PlaybackConfig::default());
        scheduler.start().unwrap();

        let (worker, mut queue) = DispatchWorker::spawn(scheduler, 16).unwrap();
        for i in 0..5 {
            queue.submit(descriptor(i as f32 / 10.0), i as f64);
        }
        let scheduler = worker.shutdown().unwrap();

        assert_eq!(scheduler.stats().started, 5);
        assert_eq!(queue.dropped(), 0);
        let intensities: Vec<f32> = engine
            .log()
            .descriptors
            .iter()
            .map(|d| d.haptic_intensity)
            .collect();
        assert_eq!(intensities, vec![0.0, 0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_full_queue_drops_without_blocking() {
        let engine = ScriptedEngine::default();
        let gate = engine.hold_players();
        let mut scheduler = PlaybackScheduler::new(engine.clone(), &PlaybackConfig::default());
        scheduler.start().unwrap();

        let (worker, queue) = DispatchWorker::spawn(scheduler, 1).unwrap();
        let request = DispatchRequest {
            descriptor: descriptor(0.5),
            timestamp: 0.0,
        };
        // First request occupies the worker (blocked in create_player)
        assert!(queue.try_submit(request));
        gate.wait_entered();
        // Second fills the single slot, third has nowhere to go
        assert!(queue.try_submit(request));
        assert!(!queue.try_submit(request));
        assert_eq!(queue.dropped(), 1);

        gate.release();
        let scheduler = worker.shutdown().unwrap();
        assert_eq!(scheduler.stats().started, 2);
    }

    #[test]
    fn test_submit_after_shutdown_is_dropped() {
        let engine = ScriptedEngine::default();
        let scheduler = PlaybackScheduler::new(engine, &PlaybackConfig::default());
        let (worker, queue) = DispatchWorker::spawn(scheduler, 4).unwrap();
        let scheduler = worker.shutdown().unwrap();
        assert_eq!(scheduler.state(), EngineState::Stopped);

        let request = DispatchRequest {
            descriptor: descriptor(0.1),
            timestamp: 1.0,
        };
        assert!(!queue.try_submit(request));
        assert_eq!(queue.dropped(), 1);
    }
}
