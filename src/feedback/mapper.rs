//! Impact velocity to feedback parameters
//!
//! ```text
//! normalized = clamp(|impact_velocity| / max_velocity, 0, 1)
//! intensity  = normalized
//! sharpness  = curve(normalized)
//! volume     = lerp(volume_range, normalized)
//! decay      = lerp(decay_range, normalized)
//! pitch      = fixed offset
//! ```
//!
//! The mapping is pure: the same impact velocity always produces a
//! bit-identical descriptor.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{MappingConfig, SharpnessCurve};
use crate::lerp;
use crate::sim::CollisionEvent;

/// Haptic and audio parameters for one feedback event.
///
/// Everything is in [0, 1] except `audio_pitch`, which is an offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternDescriptor {
    pub haptic_intensity: f32,
    pub haptic_sharpness: f32,
    pub audio_volume: f32,
    pub audio_pitch: f32,
    pub audio_decay: f32,
}

impl PatternDescriptor {
    /// Whether every parameter is finite and inside its range
    pub fn is_well_formed(&self) -> bool {
        let unit = |v: f32| (0.0..=1.0).contains(&v);
        unit(self.haptic_intensity)
            && unit(self.haptic_sharpness)
            && unit(self.audio_volume)
            && unit(self.audio_decay)
            && (-1.0..=1.0).contains(&self.audio_pitch)
    }
}

/// Maps collision events to pattern descriptors
#[derive(Debug, Clone)]
pub struct CollisionEventMapper {
    max_velocity: f32,
    volume_range: (f32, f32),
    decay_range: (f32, f32),
    audio_pitch: f32,
    sharpness: SharpnessCurve,
}

impl Default for CollisionEventMapper {
    fn default() -> Self {
        Self::new(&MappingConfig::default())
    }
}

impl CollisionEventMapper {
    pub fn new(config: &MappingConfig) -> Self {
        Self {
            max_velocity: config.max_velocity.max(f32::MIN_POSITIVE),
            volume_range: config.volume_range,
            decay_range: config.decay_range,
            audio_pitch: config.audio_pitch,
            sharpness: config.sharpness,
        }
    }

    /// Override the calibration velocity.
    #[must_use]
    pub fn with_max_velocity(mut self, velocity: f32) -> Self {
        self.max_velocity = velocity.max(f32::MIN_POSITIVE);
        self
    }

    /// Override the fixed pitch offset.
    #[must_use]
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.audio_pitch = pitch;
        self
    }

    #[must_use]
    pub fn with_sharpness(mut self, curve: SharpnessCurve) -> Self {
        self.sharpness = curve;
        self
    }

    pub fn max_velocity(&self) -> f32 {
        self.max_velocity
    }

    /// Normalize an impact speed into [0, 1].
    ///
    /// Zero, negative and NaN speeds give 0; anything at or above
    /// `max_velocity` (including infinity) gives 1.
    pub fn normalize_speed(&self, magnitude: f32) -> f32 {
        if !(magnitude > 0.0) {
            return 0.0;
        }
        (magnitude / self.max_velocity).min(1.0)
    }

    /// Normalized magnitude of an impact velocity
    pub fn normalized(&self, impact_velocity: Vec2) -> f32 {
        self.normalize_speed(impact_velocity.length())
    }

    pub fn map(&self, event: &CollisionEvent) -> PatternDescriptor {
        self.map_velocity(event.impact_velocity)
    }

    pub fn map_velocity(&self, impact_velocity: Vec2) -> PatternDescriptor {
        let t = self.normalized(impact_velocity);
        PatternDescriptor {
            haptic_intensity: t,
            haptic_sharpness: self.sharpness.apply(t),
            audio_volume: lerp(self.volume_range.0, self.volume_range.1, t),
            audio_pitch: self.audio_pitch,
            audio_decay: lerp(self.decay_range.0, self.decay_range.1, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Wall;
    use proptest::prelude::*;

    fn mapper(max_velocity: f32) -> CollisionEventMapper {
        CollisionEventMapper::default().with_max_velocity(max_velocity)
    }

    fn bits(d: &PatternDescriptor) -> [u32; 5] {
        [
            d.haptic_intensity.to_bits(),
            d.haptic_sharpness.to_bits(),
            d.audio_volume.to_bits(),
            d.audio_pitch.to_bits(),
            d.audio_decay.to_bits(),
        ]
    }

    #[test]
    fn test_saturating_impact() {
        let event = CollisionEvent {
            wall: Wall::Right,
            impact_velocity: Vec2::new(3.0, 4.0),
            timestamp: 1.0,
        };
        let d = mapper(5.0).map(&event);
        assert_eq!(d.haptic_intensity, 1.0);
        assert_eq!(d.haptic_sharpness, 1.0);
        assert!((d.audio_volume - 0.4).abs() < 1e-6);
        assert!((d.audio_decay - 0.1).abs() < 1e-6);
        assert_eq!(d.audio_pitch, -0.15);
    }

    #[test]
    fn test_zero_impact() {
        let d = mapper(5.0).map_velocity(Vec2::ZERO);
        assert_eq!(d.haptic_intensity, 0.0);
        assert_eq!(d.haptic_sharpness, 0.0);
        assert!((d.audio_volume - 0.1).abs() < 1e-6);
        assert_eq!(d.audio_decay, 0.0);
    }

    #[test]
    fn test_half_speed() {
        let d = mapper(10.0).map_velocity(Vec2::new(0.0, -5.0));
        assert!((d.haptic_intensity - 0.5).abs() < 1e-6);
        assert!((d.audio_volume - 0.25).abs() < 1e-6);
        assert!((d.audio_decay - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_speeds() {
        let m = mapper(5.0);
        assert_eq!(m.normalize_speed(f32::NAN), 0.0);
        assert_eq!(m.normalize_speed(f32::INFINITY), 1.0);
        assert_eq!(m.normalized(Vec2::new(f32::NAN, 1.0)), 0.0);
        assert!(m.map_velocity(Vec2::new(f32::INFINITY, 0.0)).is_well_formed());
    }

    #[test]
    fn test_custom_curve_and_pitch() {
        let m = mapper(10.0)
            .with_sharpness(SharpnessCurve::Power { exponent: 2.0 })
            .with_pitch(0.3);
        let d = m.map_velocity(Vec2::new(5.0, 0.0));
        assert!((d.haptic_sharpness - 0.25).abs() < 1e-6);
        assert_eq!(d.audio_pitch, 0.3);
        // Intensity stays linear regardless of the curve
        assert!((d.haptic_intensity - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_non_positive_max_velocity_is_clamped() {
        let m = mapper(0.0);
        assert!(m.max_velocity() > 0.0);
        assert_eq!(m.normalize_speed(1.0), 1.0);
    }

    proptest! {
        #[test]
        fn prop_saturates_at_max(max in 0.01f32..1.0e4, extra in 0.0f32..1.0e4) {
            prop_assert_eq!(mapper(max).normalize_speed(max + extra), 1.0);
        }

        #[test]
        fn prop_non_positive_is_zero(m in -1.0e6f32..=0.0) {
            prop_assert_eq!(mapper(5.0).normalize_speed(m), 0.0);
        }

        #[test]
        fn prop_normalized_in_unit_range(vx in -1.0e5f32..1.0e5, vy in -1.0e5f32..1.0e5) {
            let n = mapper(1200.0).normalized(Vec2::new(vx, vy));
            prop_assert!((0.0..=1.0).contains(&n));
        }

        #[test]
        fn prop_map_is_bit_identical(vx in -1.0e4f32..1.0e4, vy in -1.0e4f32..1.0e4) {
            let m = mapper(1200.0).with_sharpness(SharpnessCurve::SmoothStep);
            let v = Vec2::new(vx, vy);
            prop_assert_eq!(bits(&m.map_velocity(v)), bits(&m.map_velocity(v)));
            // A second, independently built mapper agrees too
            let other = mapper(1200.0).with_sharpness(SharpnessCurve::SmoothStep);
            prop_assert_eq!(bits(&m.map_velocity(v)), bits(&other.map_velocity(v)));
        }

        #[test]
        fn prop_volume_and_decay_monotonic(a in 0.0f32..3000.0, b in 0.0f32..3000.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let m = mapper(1200.0);
            let d_lo = m.map_velocity(Vec2::new(lo, 0.0));
            let d_hi = m.map_velocity(Vec2::new(hi, 0.0));
            prop_assert!(d_lo.audio_volume <= d_hi.audio_volume);
            prop_assert!(d_lo.audio_decay <= d_hi.audio_decay);
            prop_assert!(d_lo.haptic_intensity <= d_hi.haptic_intensity);
            prop_assert!(d_lo.haptic_sharpness <= d_hi.haptic_sharpness);
        }

        #[test]
        fn prop_descriptor_well_formed(vx in -1.0e5f32..1.0e5, vy in -1.0e5f32..1.0e5) {
            prop_assert!(mapper(800.0).map_velocity(Vec2::new(vx, vy)).is_well_formed());
        }
    }
}
