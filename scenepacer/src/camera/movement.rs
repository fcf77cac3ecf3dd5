//! Significant-movement filtering and camera event fan-out.
//!
//! # Detection Logic
//!
//! ```text
//! moved = |p1 - p0| > position_threshold
//!      OR angle(heading1, heading0) > angle_threshold
//!      OR |pitch1 - pitch0| > angle_threshold
//! ```
//!
//! Heading comparison is wrap-aware: a heading of `2π - ε` and one of `ε` are
//! `2ε` apart, not `2π - 2ε`.

use std::f64::consts::TAU;

use tokio::sync::broadcast;

use super::snapshot::CameraSnapshot;

/// Default position threshold (metres).
pub const DEFAULT_POSITION_THRESHOLD_M: f64 = 0.1;

/// Default heading/pitch threshold (radians).
pub const DEFAULT_ANGLE_THRESHOLD_RAD: f64 = 0.001;

/// Capacity of the camera event channel.
///
/// Camera events arrive at most once per rendered frame and subscribers drain
/// them on the same thread, so a small buffer is enough. A subscriber that
/// falls further behind sees a lag notice and resumes with newer snapshots.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Thresholds below which camera changes are treated as numerical noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementThresholds {
    /// Minimum position change (metres).
    pub position_m: f64,
    /// Minimum heading or pitch change (radians).
    pub angle_rad: f64,
}

impl Default for MovementThresholds {
    fn default() -> Self {
        Self {
            position_m: DEFAULT_POSITION_THRESHOLD_M,
            angle_rad: DEFAULT_ANGLE_THRESHOLD_RAD,
        }
    }
}

impl MovementThresholds {
    /// Return these thresholds if usable, otherwise the defaults.
    ///
    /// Non-positive or non-finite values are configuration errors; they are
    /// logged and replaced rather than failing startup.
    pub fn validated(self) -> Self {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(self.position_m) && valid(self.angle_rad) {
            self
        } else {
            tracing::warn!(
                position_m = self.position_m,
                angle_rad = self.angle_rad,
                "Invalid movement thresholds, using defaults"
            );
            Self::default()
        }
    }
}

/// Smallest absolute difference between two angles (radians).
fn wrapped_angle_delta(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

/// Check whether `current` differs meaningfully from `previous`.
///
/// Pure function: callers are responsible for replacing their own last-known
/// snapshot when this returns `true`.
pub fn has_moved_significantly(
    previous: &CameraSnapshot,
    current: &CameraSnapshot,
    thresholds: &MovementThresholds,
) -> bool {
    if previous.position.distance(current.position) > thresholds.position_m {
        return true;
    }
    if wrapped_angle_delta(previous.heading, current.heading) > thresholds.angle_rad {
        return true;
    }
    (previous.pitch - current.pitch).abs() > thresholds.angle_rad
}

/// Shared camera event source.
///
/// One detector is created per scene and handed to every controller as an
/// `Arc<MovementDetector>`. The host forwards its camera-changed callback to
/// [`MovementDetector::publish`]; each controller receives the snapshot on its
/// own subscription and filters it against its own last-known state. The
/// controllers never reference each other.
///
/// # Example
///
/// ```
/// use scenepacer::camera::{CameraSnapshot, MovementDetector, MovementThresholds};
/// use scenepacer::geometry::Cartesian3;
///
/// let detector = MovementDetector::new(MovementThresholds::default());
/// let mut rx = detector.subscribe();
///
/// let snapshot = CameraSnapshot::at(Cartesian3::new(0.0, 0.0, 6_400_000.0), 20_000.0);
/// assert_eq!(detector.publish(snapshot), 1);
/// assert_eq!(rx.try_recv().unwrap().position, snapshot.position);
/// ```
#[derive(Debug)]
pub struct MovementDetector {
    thresholds: MovementThresholds,
    sender: broadcast::Sender<CameraSnapshot>,
}

impl MovementDetector {
    /// Create a detector with the given thresholds.
    pub fn new(thresholds: MovementThresholds) -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            thresholds: thresholds.validated(),
            sender,
        }
    }

    /// Create a detector with default thresholds.
    pub fn with_defaults() -> Self {
        Self::new(MovementThresholds::default())
    }

    /// Thresholds in effect.
    pub fn thresholds(&self) -> &MovementThresholds {
        &self.thresholds
    }

    /// Apply this detector's thresholds to a pair of snapshots.
    pub fn has_moved_significantly(
        &self,
        previous: &CameraSnapshot,
        current: &CameraSnapshot,
    ) -> bool {
        has_moved_significantly(previous, current, &self.thresholds)
    }

    /// Forward a camera-changed notification to all subscribers.
    ///
    /// Returns the number of subscribers that will see the snapshot. Having
    /// no subscribers is not an error (controllers may be stopped).
    pub fn publish(&self, snapshot: CameraSnapshot) -> usize {
        self.sender.send(snapshot).unwrap_or(0)
    }

    /// Open a new subscription to camera-changed notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<CameraSnapshot> {
        self.sender.subscribe()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for MovementDetector {
    fn default() -> Self {
        Self::with_defaults()
    }
}
