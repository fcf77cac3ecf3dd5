//! Tile freeze configuration.

use std::time::Duration;

/// Default evaluation period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Default stationary time before freezing.
pub const DEFAULT_FREEZE_DELAY: Duration = Duration::from_secs(3);

/// Default camera travel that unfreezes (metres).
pub const DEFAULT_MOVE_THRESHOLD_M: f64 = 100.0;

/// Default relative height change that unfreezes (fraction, 0.20 = 20%).
pub const DEFAULT_ZOOM_THRESHOLD: f64 = 0.20;

/// Screen-space error tolerance that stops all further detail requests.
pub const FROZEN_SCREEN_SPACE_ERROR: f64 = 1.0e9;

/// Configuration for [`TileFreezeController`](super::TileFreezeController).
#[derive(Debug, Clone, PartialEq)]
pub struct TileFreezeConfig {
    /// How often freeze state is re-evaluated.
    pub tick_interval: Duration,

    /// Time without significant movement before tiles freeze.
    pub freeze_delay: Duration,

    /// Distance from the frozen position that unfreezes (metres).
    pub move_threshold_m: f64,

    /// Relative height change that unfreezes.
    pub zoom_threshold: f64,

    /// Tolerance written while frozen.
    pub frozen_screen_space_error: f64,
}

impl Default for TileFreezeConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            freeze_delay: DEFAULT_FREEZE_DELAY,
            move_threshold_m: DEFAULT_MOVE_THRESHOLD_M,
            zoom_threshold: DEFAULT_ZOOM_THRESHOLD,
            frozen_screen_space_error: FROZEN_SCREEN_SPACE_ERROR,
        }
    }
}

impl TileFreezeConfig {
    fn problem(&self) -> Option<&'static str> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if self.tick_interval.is_zero() || self.freeze_delay.is_zero() {
            return Some("durations must be positive");
        }
        if !positive(self.move_threshold_m) {
            return Some("move_threshold_m must be positive");
        }
        if !positive(self.zoom_threshold) {
            return Some("zoom_threshold must be positive");
        }
        if !positive(self.frozen_screen_space_error) {
            return Some("frozen_screen_space_error must be positive");
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
                config = ?self,
                "Invalid tile freeze config, using defaults"
            );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = TileFreezeConfig::default();
        assert_eq!(c.freeze_delay, Duration::from_secs(3));
        assert_eq!(c.move_threshold_m, 100.0);
        assert_eq!(c.zoom_threshold, 0.20);
        assert_eq!(c.clone().validated(), c);
    }

    #[test]
    fn test_invalid_configs_fall_back() {
        let cases = [
            TileFreezeConfig {
                freeze_delay: Duration::ZERO,
                ..Default::default()
            },
            TileFreezeConfig {
                move_threshold_m: -10.0,
                ..Default::default()
            },
            TileFreezeConfig {
                zoom_threshold: f64::NAN,
                ..Default::default()
            },
        ];
        for config in cases {
            assert_eq!(config.validated(), TileFreezeConfig::default());
        }
    }
}
