//! Fixed timestep driver
//!
//! Turns variable frame times into a whole number of `SIM_DT` ticks, carrying
//! the remainder to the next frame.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

#[derive(Debug, Clone)]
pub struct FixedStepper {
    step: f32,
    max_substeps: u32,
    accumulator: f32,
}

impl Default for FixedStepper {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_SUBSTEPS)
    }
}

impl FixedStepper {
    pub fn new(step: f32, max_substeps: u32) -> Self {
        Self {
            step: step.max(f32::EPSILON),
            max_substeps: max_substeps.max(1),
            accumulator: 0.0,
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Add a frame's worth of time and run as many ticks as fit.
    ///
    /// Frame time is capped at `MAX_FRAME_DT` and at most `max_substeps`
    /// ticks run; time beyond that is discarded rather than queued.
    pub fn advance<F>(&mut self, frame_dt: f32, mut tick: F) -> u32
    where
        F: FnMut(f32),
    {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            return 0;
        }
        self.accumulator += frame_dt.min(MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= self.step && substeps < self.max_substeps {
            tick(self.step);
            self.accumulator -= self.step;
            substeps += 1;
        }

        // Spiral of death guard
        if substeps == self.max_substeps && self.accumulator >= self.step {
            log::debug!("Dropping {:.4}s of simulation backlog", self.accumulator);
            self.accumulator %= self.step;
        }
        substeps
    }

    /// Fraction of a step left in the accumulator, for render interpolation
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_whole_steps_and_carries_remainder() {
        let mut stepper = FixedStepper::new(0.01, 8);
        let mut ticks = 0;
        assert_eq!(stepper.advance(0.025, |_| ticks += 1), 2);
        assert_eq!(ticks, 2);
        assert!((stepper.alpha() - 0.5).abs() < 1e-3);
        // Remainder plus a little over half a step makes one more tick
        assert_eq!(stepper.advance(0.006, |_| ticks += 1), 1);
        assert_eq!(ticks, 3);
    }

    #[test]
    fn test_caps_substeps() {
        let mut stepper = FixedStepper::new(0.001, 4);
        let n = stepper.advance(0.05, |_| {});
        assert_eq!(n, 4);
        assert!(stepper.alpha() < 1.0);
    }

    #[test]
    fn test_ignores_bad_frame_time() {
        let mut stepper = FixedStepper::default();
        assert_eq!(stepper.advance(f32::NAN, |_| panic!("should not tick")), 0);
        assert_eq!(stepper.advance(-1.0, |_| panic!("should not tick")), 0);
    }

    #[test]
    fn test_passes_fixed_dt() {
        let mut stepper = FixedStepper::default();
        stepper.advance(1.0 / 30.0, |dt| assert_eq!(dt, SIM_DT));
    }
}
