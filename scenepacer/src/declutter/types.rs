//! Anchor and placement records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Cartesian3;

/// Caller-assigned identifier for an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchorId(pub u32);

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A real-world location a label refers to. Never moved by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub id: AnchorId,
    pub position: Cartesian3,
}

impl AnchorPoint {
    pub fn new(id: u32, position: Cartesian3) -> Self {
        Self {
            id: AnchorId(id),
            position,
        }
    }
}

/// Final position of one label, connected to its anchor by a leader line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelPlacement {
    pub anchor_id: AnchorId,
    /// Anchor the leader line starts from.
    pub anchor: Cartesian3,
    /// Label position (`anchor + direction * leader_length`).
    pub position: Cartesian3,
    /// Unit leader direction.
    pub direction: Cartesian3,
    pub leader_length: f64,
}

impl LabelPlacement {
    pub(crate) fn new(anchor: &AnchorPoint, direction: Cartesian3, leader_length: f64) -> Self {
        Self {
            anchor_id: anchor.id,
            anchor: anchor.position,
            position: anchor.position + direction * leader_length,
            direction,
            leader_length,
        }
    }

    /// Re-derive the label position after direction or length changed.
    pub(crate) fn update(&mut self, direction: Cartesian3, leader_length: f64) {
        self.direction = direction;
        self.leader_length = leader_length;
        self.position = self.anchor + direction * leader_length;
    }
}
