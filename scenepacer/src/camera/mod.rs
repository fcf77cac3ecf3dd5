//! Camera state and movement detection.
//!
//! Camera APIs emit change notifications on any floating-point drift, including
//! sub-millimetre numerical noise. Idle detection would never trigger if every
//! notification counted as movement, so all controllers go through a single
//! [`MovementDetector`] that filters notifications against fixed thresholds.
//!
//! # Data Flow
//!
//! ```text
//! camera changed ──► MovementDetector::publish ──┬──► FrameRateScheduler
//!                    (broadcast of snapshots)    └──► TileFreezeController
//! ```
//!
//! Each subscriber keeps its own last-known [`CameraSnapshot`] and asks the
//! detector whether the new snapshot differs meaningfully from it.

mod movement;
mod snapshot;

pub use movement::{
    has_moved_significantly, MovementDetector, MovementThresholds,
    DEFAULT_ANGLE_THRESHOLD_RAD, DEFAULT_POSITION_THRESHOLD_M,
};
pub use snapshot::CameraSnapshot;
