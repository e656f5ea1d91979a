//! Gravity sample sources
//!
//! A source pushes gravity-direction samples (in g) from its own thread.
//! [`connect`] routes them into the simulator's [`GravityMailbox`], which
//! drops invalid samples so the last good one stays in effect.

use std::f32::consts::TAU;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::sim::GravityMailbox;

/// Called with every sample a source produces
pub type SampleCallback = Box<dyn FnMut(Vec2) + Send + 'static>;

/// Something that streams gravity samples
pub trait MotionSource {
    /// Start delivering samples to `on_sample`, replacing any earlier
    /// subscriber.
    fn subscribe(&mut self, on_sample: SampleCallback) -> io::Result<()>;

    /// Stop delivering samples. No callback runs after this returns.
    fn unsubscribe(&mut self);
}

/// Feed a source straight into a mailbox
pub fn connect<S>(source: &mut S, mailbox: Arc<GravityMailbox>) -> io::Result<()>
where
    S: MotionSource + ?Sized,
{
    source.subscribe(Box::new(move |sample| {
        mailbox.post(sample);
    }))
}

/// Parameters of a scripted tilt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TiltScript {
    /// Peak tilt away from straight down (radians)
    pub amplitude: f32,
    /// Seconds per full sway
    pub period: f32,
    /// Random tilt added to every sample (radians, uniform +/-)
    pub jitter: f32,
    /// Chance that a sample comes out as garbage
    pub fault_rate: f64,
    pub seed: u64,
}

impl Default for TiltScript {
    fn default() -> Self {
        Self {
            amplitude: 0.6,
            period: 2.0,
            jitter: 0.02,
            fault_rate: 0.01,
            seed: 0x7117,
        }
    }
}

impl TiltScript {
    /// Sample at script time `t` (seconds)
    pub fn sample(&self, t: f32, rng: &mut Pcg32) -> Vec2 {
        if self.fault_rate > 0.0 && rng.random_bool(self.fault_rate.min(1.0)) {
            return Vec2::NAN;
        }
        let sway = if self.period > 0.0 {
            self.amplitude * (TAU * t / self.period).sin()
        } else {
            0.0
        };
        let noise = if self.jitter > 0.0 {
            rng.random_range(-self.jitter..=self.jitter)
        } else {
            0.0
        };
        let angle = sway + noise;
        Vec2::new(angle.sin(), -angle.cos())
    }

    /// First `n` samples at a fixed spacing, deterministic for a seed
    pub fn samples(&self, n: usize, spacing: f32) -> Vec<Vec2> {
        let mut rng = Pcg32::seed_from_u64(self.seed);
        (0..n).map(|i| self.sample(i as f32 * spacing, &mut rng)).collect()
    }
}

/// Thread-driven source replaying a [`TiltScript`]
pub struct ScriptedMotion {
    script: TiltScript,
    interval: Duration,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ScriptedMotion {
    pub fn new(script: TiltScript, interval: Duration) -> Self {
        Self {
            script,
            interval,
            stop: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl MotionSource for ScriptedMotion {
    fn subscribe(&mut self, mut on_sample: SampleCallback) -> io::Result<()> {
        self.unsubscribe();

        let stop = Arc::new(AtomicBool::new(false));
        let script = self.script.clone();
        let interval = self.interval;
        let spacing = interval.as_secs_f32();
        let flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("scripted-motion".into())
            .spawn(move || {
                let mut rng = Pcg32::seed_from_u64(script.seed);
                let mut n: u64 = 0;
                while !flag.load(Ordering::Acquire) {
                    on_sample(script.sample(n as f32 * spacing, &mut rng));
                    n += 1;
                    thread::sleep(interval);
                }
                log::debug!("Scripted motion stopped after {n} samples");
            })?;

        self.stop = stop;
        self.handle = Some(handle);
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Scripted motion thread panicked");
            }
        }
    }
}

impl Drop for ScriptedMotion {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_script_is_deterministic() {
        let script = TiltScript::default();
        let a = script.samples(200, 0.01);
        let b = script.samples(200, 0.01);
        // NaN != NaN, so compare bit patterns
        let bits = |v: &[Vec2]| v.iter().map(|s| (s.x.to_bits(), s.y.to_bits())).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_valid_samples_are_unit_length() {
        let script = TiltScript {
            fault_rate: 0.0,
            ..Default::default()
        };
        for s in script.samples(100, 0.05) {
            assert!((s.length() - 1.0).abs() < 1e-5);
            // Never tilted past horizontal
            assert!(s.y < 0.0);
        }
    }

    #[test]
    fn test_fault_rate_produces_invalid_samples() {
        let script = TiltScript {
            fault_rate: 1.0,
            ..Default::default()
        };
        assert!(script.samples(10, 0.01).iter().all(|s| s.x.is_nan()));
    }

    #[test]
    fn test_no_sway_points_straight_down() {
        let script = TiltScript {
            amplitude: 0.0,
            jitter: 0.0,
            fault_rate: 0.0,
            ..Default::default()
        };
        for s in script.samples(10, 0.1) {
            assert!(s.x.abs() < 1e-6);
            assert!((s.y + 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_unsubscribe_stops_callbacks() {
        let received = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&received);
        let mut motion = ScriptedMotion::new(TiltScript::default(), Duration::from_millis(1));
        motion
            .subscribe(Box::new(move |_| *counter.lock().unwrap() += 1))
            .unwrap();
        assert!(motion.is_running());

        while *received.lock().unwrap() < 5 {
            thread::sleep(Duration::from_millis(1));
        }
        motion.unsubscribe();
        assert!(!motion.is_running());

        let after = *received.lock().unwrap();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(*received.lock().unwrap(), after);
    }

    #[test]
    fn test_connect_keeps_only_valid_samples() {
        let mailbox = Arc::new(GravityMailbox::new());
        let script = TiltScript {
            fault_rate: 0.5,
            ..Default::default()
        };
        let mut motion = ScriptedMotion::new(script, Duration::from_millis(1));
        connect(&mut motion, Arc::clone(&mailbox)).unwrap();

        while mailbox.latest().is_none() {
            thread::sleep(Duration::from_millis(1));
        }
        for _ in 0..20 {
            let g = mailbox.latest().unwrap();
            assert!(g.is_finite());
            thread::sleep(Duration::from_millis(1));
        }
        motion.unsubscribe();
    }
}
