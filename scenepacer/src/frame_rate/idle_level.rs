//! Discrete idle levels.

use std::fmt;

/// How long the camera and network have been quiet.
///
/// Levels only ever reset to [`IdleLevel::Active`] or advance one step at a
/// time; see [`IdleLevel::step_towards`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum IdleLevel {
    /// User is interacting or tiles are streaming.
    #[default]
    Active,
    /// Recently stopped.
    Settling,
    /// Quiet for a while.
    Idle,
    /// Camera and network both quiet for a long time.
    DeepIdle,
}

impl IdleLevel {
    /// Numeric level, 0 (active) to 3 (deeply idle).
    pub fn as_u8(self) -> u8 {
        match self {
            IdleLevel::Active => 0,
            IdleLevel::Settling => 1,
            IdleLevel::Idle => 2,
            IdleLevel::DeepIdle => 3,
        }
    }

    /// Next deeper level, saturating at [`IdleLevel::DeepIdle`].
    pub fn next(self) -> Self {
        match self {
            IdleLevel::Active => IdleLevel::Settling,
            IdleLevel::Settling => IdleLevel::Idle,
            IdleLevel::Idle | IdleLevel::DeepIdle => IdleLevel::DeepIdle,
        }
    }

    /// Move one evaluation towards `target`.
    ///
    /// Resets straight to `Active` and otherwise advances at most one level.
    /// A lower non-active target holds the current level.
    pub fn step_towards(self, target: IdleLevel) -> Self {
        if target == IdleLevel::Active {
            IdleLevel::Active
        } else if target > self {
            self.next()
        } else {
            self
        }
    }

    pub fn is_active(self) -> bool {
        self == IdleLevel::Active
    }

    pub fn description(self) -> &'static str {
        match self {
            IdleLevel::Active => "full frame rate",
            IdleLevel::Settling => "camera settling",
            IdleLevel::Idle => "camera idle",
            IdleLevel::DeepIdle => "camera and network idle",
        }
    }
}

impl fmt::Display for IdleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{} ({})", self.as_u8(), self.description())
    }
}
