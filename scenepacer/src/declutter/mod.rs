//! Label declutter engine.
//!
//! Places location labels near their anchors without excessive overlap by
//! rotating and extending leader lines. Runs once per marker-set load, not
//! per frame, and keeps no state between calls.
//!
//! ```
//! use scenepacer::declutter::{declutter, AnchorPoint, DeclutterConfig};
//! use scenepacer::geometry::Cartesian3;
//!
//! let anchors = vec![
//!     AnchorPoint::new(1, Cartesian3::new(100.0, 0.0, 0.0)),
//!     AnchorPoint::new(2, Cartesian3::new(100.0, 10.0, 0.0)),
//! ];
//! let config = DeclutterConfig::default()
//!     .with_base_leader_length(20.0)
//!     .with_min_separation(50.0)
//!     .with_max_leader_length(200.0)
//!     .with_fixed_vertical(Cartesian3::UNIT_Z);
//!
//! let placements = declutter(&anchors, Cartesian3::ZERO, &config);
//! assert!(placements[0].position.distance(placements[1].position) >= 50.0);
//! ```

mod config;
mod engine;
mod types;

pub use config::{
    DeclutterConfig, VerticalAxis, DEFAULT_ANGLE_STEP_DEG, DEFAULT_BASE_LEADER_LENGTH,
    DEFAULT_EXTENSION_FACTOR, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_LEADER_LENGTH,
    DEFAULT_MIN_SEPARATION,
};
pub use engine::{declutter, declutter_with_report, DeclutterReport};
pub use types::{AnchorId, AnchorPoint, LabelPlacement};
