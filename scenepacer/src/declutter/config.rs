//! Declutter tuning constants.
//!
//! These values were tuned empirically against a real marker set. They are
//! knobs, not derived invariants: dense datasets may need a larger separation
//! budget or more iterations, which the residual-collision counter in
//! [`DeclutterReport`](super::DeclutterReport) reveals.

use crate::geometry::Cartesian3;

/// Default initial leader length (metres).
pub const DEFAULT_BASE_LEADER_LENGTH: f64 = 50_000.0;

/// Default minimum distance between two label positions (metres).
pub const DEFAULT_MIN_SEPARATION: f64 = 80_000.0;

/// Default leader length cap (metres).
pub const DEFAULT_MAX_LEADER_LENGTH: f64 = 250_000.0;

/// Default collision pass cap.
pub const DEFAULT_MAX_ITERATIONS: u32 = 15;

/// Default rotation applied per collision (degrees).
pub const DEFAULT_ANGLE_STEP_DEG: f64 = 10.0;

/// Default leader growth per collision.
pub const DEFAULT_EXTENSION_FACTOR: f64 = 1.15;

/// Default amplitude of the direction-dependent length variation.
pub const DEFAULT_ANGLE_VARIATION_AMPLITUDE: f64 = 0.15;

/// Default number of length variation periods per full turn.
pub const DEFAULT_ANGLE_VARIATION_FREQUENCY: f64 = 3.0;

/// Default per-index length offsets, cycled by anchor index.
pub const DEFAULT_INDEX_OFFSETS: [f64; 5] = [0.0, 0.12, -0.08, 0.20, -0.04];

/// Axis that leader directions are rotated about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerticalAxis {
    /// Local vertical is the anchor's direction from the Earth's centre.
    Geocentric,
    /// One vertical for every anchor (flat local-frame scenes).
    Fixed(Cartesian3),
}

impl VerticalAxis {
    /// Local vertical at `anchor`, always unit-length.
    pub fn up_at(&self, anchor: Cartesian3) -> Cartesian3 {
        match self {
            VerticalAxis::Geocentric => anchor.normalize().unwrap_or(Cartesian3::UNIT_Z),
            VerticalAxis::Fixed(up) => up.normalize().unwrap_or(Cartesian3::UNIT_Z),
        }
    }
}

/// Parameters for one declutter pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclutterConfig {
    /// Leader length before variation (metres).
    pub base_leader_length: f64,

    /// Label pairs closer than this collide (metres).
    pub min_separation: f64,

    /// Leaders are never extended past this (metres).
    pub max_leader_length: f64,

    /// Collision passes before giving up.
    pub max_iterations: u32,

    /// Rotation applied to each label of a colliding pair (radians).
    pub angle_step_rad: f64,

    /// Multiplicative leader growth per collision.
    pub extension_factor: f64,

    /// Amplitude of `sin(frequency * azimuth)` length variation.
    pub angle_variation_amplitude: f64,

    /// Periods of the length variation per full turn.
    pub angle_variation_frequency: f64,

    /// Offsets added to the length factor, cycled by anchor index.
    pub index_offsets: Vec<f64>,

    /// Rotation axis selection.
    pub vertical: VerticalAxis,
}

impl Default for DeclutterConfig {
    fn default() -> Self {
        Self {
            base_leader_length: DEFAULT_BASE_LEADER_LENGTH,
            min_separation: DEFAULT_MIN_SEPARATION,
            max_leader_length: DEFAULT_MAX_LEADER_LENGTH,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            angle_step_rad: DEFAULT_ANGLE_STEP_DEG.to_radians(),
            extension_factor: DEFAULT_EXTENSION_FACTOR,
            angle_variation_amplitude: DEFAULT_ANGLE_VARIATION_AMPLITUDE,
            angle_variation_frequency: DEFAULT_ANGLE_VARIATION_FREQUENCY,
            index_offsets: DEFAULT_INDEX_OFFSETS.to_vec(),
            vertical: VerticalAxis::Geocentric,
        }
    }
}

impl DeclutterConfig {
    /// Set the leader length before variation.
    pub fn with_base_leader_length(mut self, length: f64) -> Self {
        self.base_leader_length = length;
        self
    }

    /// Set the collision distance.
    pub fn with_min_separation(mut self, distance: f64) -> Self {
        self.min_separation = distance;
        self
    }

    /// Set the leader length cap.
    pub fn with_max_leader_length(mut self, length: f64) -> Self {
        self.max_leader_length = length;
        self
    }

    /// Rotate every leader about one fixed axis.
    pub fn with_fixed_vertical(mut self, up: Cartesian3) -> Self {
        self.vertical = VerticalAxis::Fixed(up);
        self
    }

    /// Reason this config cannot be used, if any.
    fn problem(&self) -> Option<&'static str> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.base_leader_length) {
            return Some("base_leader_length must be positive");
        }
        if !positive(self.min_separation) {
            return Some("min_separation must be positive");
        }
        if !self.max_leader_length.is_finite() || self.max_leader_length < self.base_leader_length {
            return Some("max_leader_length must be at least base_leader_length");
        }
        if self.max_iterations == 0 {
            return Some("max_iterations must be positive");
        }
        if !positive(self.angle_step_rad) || self.angle_step_rad >= std::f64::consts::PI {
            return Some("angle_step must be in (0, 180) degrees");
        }
        if !self.extension_factor.is_finite() || self.extension_factor < 1.0 {
            return Some("extension_factor must be at least 1");
        }
        if self.index_offsets.is_empty() {
            return Some("index_offsets must not be empty");
        }
        let max_offset = self
            .index_offsets
            .iter()
            .fold(0.0_f64, |acc, o| acc.max(o.abs()));
        if !self.angle_variation_amplitude.is_finite()
            || !self.angle_variation_frequency.is_finite()
            || !self.index_offsets.iter().all(|o| o.is_finite())
            || self.angle_variation_amplitude.abs() + max_offset >= 1.0
        {
            return Some("length variation must stay below 100%");
        }
        if let VerticalAxis::Fixed(up) = self.vertical {
            if up.normalize().is_none() {
                return Some("fixed vertical axis must be non-zero");
            }
        }
        None
    }

    /// Return this config if usable, otherwise the defaults.
    pub fn validated(self) -> Self {
        match self.problem() {
            None => self,
            Some(reason) => {
                tracing::warn!(
                    reason,
                    base_leader_length = self.base_leader_length,
                    min_separation = self.min_separation,
                    max_leader_length = self.max_leader_length,
                    max_iterations = self.max_iterations,
                    "Invalid declutter config, using defaults"
                );
                Self::default()
            }
        }
    }
}
