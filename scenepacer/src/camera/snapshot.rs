//! Point-in-time camera state.

use std::time::Instant;

use crate::geometry::Cartesian3;

/// Camera state captured at a point in time.
///
/// Snapshots are plain values. A controller that captures one owns it
/// exclusively; the frame rate scheduler and the tile freeze controller never
/// share snapshots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSnapshot {
    /// World-space camera position (metres).
    pub position: Cartesian3,
    /// Heading in radians.
    pub heading: f64,
    /// Pitch in radians.
    pub pitch: f64,
    /// Roll in radians.
    pub roll: f64,
    /// Height above the ellipsoid (metres).
    pub height: f64,
    /// When this snapshot was captured.
    pub captured_at: Instant,
}

impl CameraSnapshot {
    /// Create a snapshot captured now.
    pub fn new(position: Cartesian3, heading: f64, pitch: f64, roll: f64, height: f64) -> Self {
        Self {
            position,
            heading,
            pitch,
            roll,
            height,
            captured_at: Instant::now(),
        }
    }

    /// Snapshot at `position` with level orientation.
    pub fn at(position: Cartesian3, height: f64) -> Self {
        Self::new(position, 0.0, 0.0, 0.0, height)
    }

    /// Copy of this snapshot moved by `offset`.
    pub fn translated(&self, offset: Cartesian3) -> Self {
        Self {
            position: self.position + offset,
            captured_at: Instant::now(),
            ..*self
        }
    }

    /// Copy of this snapshot at a different height.
    ///
    /// Only the height field changes; position is left untouched so zoom
    /// checks can be exercised independently of distance checks.
    pub fn with_height(&self, height: f64) -> Self {
        Self {
            height,
            captured_at: Instant::now(),
            ..*self
        }
    }

    /// Copy of this snapshot with a different heading.
    pub fn with_heading(&self, heading: f64) -> Self {
        Self {
            heading,
            captured_at: Instant::now(),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translated_moves_position_only() {
        let snap = CameraSnapshot::new(Cartesian3::new(1.0, 2.0, 3.0), 0.5, -0.2, 0.0, 1500.0);
        let moved = snap.translated(Cartesian3::new(10.0, 0.0, 0.0));

        assert_eq!(moved.position, Cartesian3::new(11.0, 2.0, 3.0));
        assert_eq!(moved.heading, 0.5);
        assert_eq!(moved.pitch, -0.2);
        assert_eq!(moved.height, 1500.0);
    }

    #[test]
    fn test_with_height_keeps_position() {
        let snap = CameraSnapshot::at(Cartesian3::UNIT_X, 1000.0);
        let zoomed = snap.with_height(800.0);

        assert_eq!(zoomed.position, snap.position);
        assert_eq!(zoomed.height, 800.0);
    }
}
