//! Calibration and tuning
//!
//! Everything the core treats as externally supplied lives here: the
//! calibration velocity, per-wall restitution, interpolation bounds, the
//! sharpness curve and the optional playback spacing. Loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::DEFAULT_AUDIO_PITCH;
use crate::sim::Wall;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Monotonic curve applied to normalized impact speed to get haptic sharpness
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SharpnessCurve {
    /// sharpness == normalized
    #[default]
    Linear,
    /// normalized^exponent (exponent > 0)
    Power { exponent: f32 },
    /// Hermite smoothstep, soft at both ends
    SmoothStep,
}

impl SharpnessCurve {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharpnessCurve::Linear => "linear",
            SharpnessCurve::Power { .. } => "power",
            SharpnessCurve::SmoothStep => "smoothstep",
        }
    }

    /// Parse a curve name. `power` takes an optional exponent: `power:1.5`.
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s.as_str(), None),
        };
        match (name, arg) {
            ("linear" | "identity", None) => Some(SharpnessCurve::Linear),
            ("smoothstep" | "smooth", None) => Some(SharpnessCurve::SmoothStep),
            ("power" | "pow", None) => Some(SharpnessCurve::Power { exponent: 2.0 }),
            ("power" | "pow", Some(arg)) => {
                let exponent: f32 = arg.parse().ok()?;
                (exponent.is_finite() && exponent > 0.0).then_some(SharpnessCurve::Power { exponent })
            }
            _ => None,
        }
    }

    /// Evaluate the curve at `t` (clamped to [0, 1]); output is in [0, 1]
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let out = match *self {
            SharpnessCurve::Linear => t,
            SharpnessCurve::Power { exponent } => t.powf(exponent),
            SharpnessCurve::SmoothStep => t * t * (3.0 - 2.0 * t),
        };
        out.clamp(0.0, 1.0)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            SharpnessCurve::Power { exponent } if !(exponent.is_finite() && exponent > 0.0) => {
                Err(ConfigError::Invalid(format!(
                    "sharpness exponent must be positive, got {exponent}"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Fraction of normal velocity kept after hitting each wall
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallRestitution {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl WallRestitution {
    /// Same coefficient on every wall
    pub fn uniform(e: f32) -> Self {
        Self {
            left: e,
            right: e,
            top: e,
            bottom: e,
        }
    }

    pub fn for_wall(&self, wall: Wall) -> f32 {
        match wall {
            Wall::Left => self.left,
            Wall::Right => self.right,
            Wall::Top => self.top,
            Wall::Bottom => self.bottom,
        }
    }
}

impl Default for WallRestitution {
    fn default() -> Self {
        Self::uniform(0.6)
    }
}

/// Arena and body tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Boundary width (points)
    pub width: f32,
    /// Boundary height (points)
    pub height: f32,
    /// Body radius (points)
    pub body_radius: f32,
    /// Outward offset of every wall so the body visually touches the edge
    pub edge_epsilon: f32,
    /// Multiplier from sensor gravity (in g) to points/s²
    pub gravity_scale: f32,
    pub restitution: WallRestitution,
    /// Normal speed below which a contact is resting: no bounce, no event.
    /// 0 means every contact fires.
    pub resting_speed: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            width: 390.0,
            height: 844.0,
            body_radius: 25.0,
            edge_epsilon: 1.0,
            gravity_scale: 980.0,
            restitution: WallRestitution::default(),
            resting_speed: 0.0,
        }
    }
}

/// Impact speed to pattern parameter mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Impact speed that saturates every parameter (calibrated per device)
    pub max_velocity: f32,
    /// Audio volume at normalized 0 and 1
    pub volume_range: (f32, f32),
    /// Audio decay at normalized 0 and 1
    pub decay_range: (f32, f32),
    /// Fixed pitch offset of the audio event
    pub audio_pitch: f32,
    pub sharpness: SharpnessCurve,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            max_velocity: 1200.0,
            volume_range: (0.1, 0.4),
            decay_range: (0.0, 0.1),
            audio_pitch: DEFAULT_AUDIO_PITCH,
            sharpness: SharpnessCurve::Linear,
        }
    }
}

/// Playback policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Minimum seconds between dispatched events (None = every event plays)
    pub min_event_spacing: Option<f32>,
    /// Restart the engine after an interruption or failed start
    pub auto_restart: bool,
    /// Minimum seconds between restart attempts while the engine is down
    pub restart_interval: f32,
    /// Bounded queue size for the background dispatch worker
    pub queue_capacity: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            min_event_spacing: None,
            auto_restart: true,
            restart_interval: 0.5,
            queue_capacity: 64,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub physics: PhysicsConfig,
    pub mapping: MappingConfig,
    pub playback: PlaybackConfig,
}

impl Config {
    /// Parse and validate JSON
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation or mapper cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.physics;
        if !(p.width > 0.0 && p.height > 0.0) {
            return Err(invalid(format!(
                "boundary must have positive size, got {}x{}",
                p.width, p.height
            )));
        }
        if !(p.body_radius > 0.0) {
            return Err(invalid(format!("body radius must be positive, got {}", p.body_radius)));
        }
        if !(p.edge_epsilon >= 0.0) {
            return Err(invalid(format!("edge epsilon must be >= 0, got {}", p.edge_epsilon)));
        }
        if !p.gravity_scale.is_finite() {
            return Err(invalid("gravity scale must be finite".to_string()));
        }
        if !(p.resting_speed >= 0.0) {
            return Err(invalid(format!("resting speed must be >= 0, got {}", p.resting_speed)));
        }
        for wall in Wall::ALL {
            let e = p.restitution.for_wall(wall);
            if !(0.0..=1.0).contains(&e) {
                return Err(invalid(format!(
                    "restitution for {} wall must be in [0, 1], got {e}",
                    wall.as_str()
                )));
            }
        }

        let m = &self.mapping;
        if !(m.max_velocity > 0.0 && m.max_velocity.is_finite()) {
            return Err(invalid(format!(
                "max_velocity must be positive and finite, got {}",
                m.max_velocity
            )));
        }
        check_unit_range("volume_range", m.volume_range)?;
        check_unit_range("decay_range", m.decay_range)?;
        if !(-1.0..=1.0).contains(&m.audio_pitch) {
            return Err(invalid(format!("audio pitch must be in [-1, 1], got {}", m.audio_pitch)));
        }
        m.sharpness.validate()?;

        let pb = &self.playback;
        if let Some(spacing) = pb.min_event_spacing {
            if !(spacing >= 0.0 && spacing.is_finite()) {
                return Err(invalid(format!("min_event_spacing must be >= 0, got {spacing}")));
            }
        }
        if !(pb.restart_interval >= 0.0 && pb.restart_interval.is_finite()) {
            return Err(invalid(format!(
                "restart_interval must be >= 0, got {}",
                pb.restart_interval
            )));
        }
        if pb.queue_capacity == 0 {
            return Err(invalid("queue_capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::Invalid(msg)
}

fn check_unit_range(name: &str, (lo, hi): (f32, f32)) -> Result<(), ConfigError> {
    if !((0.0..=1.0).contains(&lo) && (0.0..=1.0).contains(&hi) && lo <= hi) {
        return Err(invalid(format!("{name} must satisfy 0 <= lo <= hi <= 1, got ({lo}, {hi})")));
    }
    Ok(())
}
