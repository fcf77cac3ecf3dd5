//! Frame rate scheduler configuration.

use std::time::Duration;

use super::idle_level::IdleLevel;

/// Default evaluation period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Default idle time before level 1.
pub const DEFAULT_LEVEL1_AFTER: Duration = Duration::from_secs(2);

/// Default idle time before level 2.
pub const DEFAULT_LEVEL2_AFTER: Duration = Duration::from_secs(5);

/// Default idle time before level 3.
pub const DEFAULT_LEVEL3_AFTER: Duration = Duration::from_secs(20);

/// Default network quiet time required for level 3.
pub const DEFAULT_NETWORK_QUIET_AFTER: Duration = Duration::from_secs(10);

/// Default level 0 target rate (frames per second).
pub const DEFAULT_ACTIVE_FPS: f64 = 60.0;

/// Default target rate for every level above 0.
pub const DEFAULT_IDLE_FPS: f64 = 20.0;

/// Default floor for the idle rate.
pub const DEFAULT_MINIMUM_FPS: f64 = 10.0;

/// Configuration for [`FrameRateScheduler`](super::FrameRateScheduler).
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRateConfig {
    /// How often the idle level is re-evaluated.
    pub tick_interval: Duration,

    /// Idle time after which the level may reach 1.
    pub level1_after: Duration,

    /// Idle time after which the level may reach 2.
    pub level2_after: Duration,

    /// Idle time after which the level may reach 3 (network must also be quiet).
    pub level3_after: Duration,

    /// Time without tile loads before the network counts as quiet.
    pub network_quiet_after: Duration,

    /// Target rate at level 0.
    pub active_frame_rate: f64,

    /// Target rate at levels 1 to 3.
    pub idle_frame_rate: f64,

    /// The idle rate is never set below this.
    pub minimum_frame_rate: f64,
}

impl Default for FrameRateConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            level1_after: DEFAULT_LEVEL1_AFTER,
            level2_after: DEFAULT_LEVEL2_AFTER,
            level3_after: DEFAULT_LEVEL3_AFTER,
            network_quiet_after: DEFAULT_NETWORK_QUIET_AFTER,
            active_frame_rate: DEFAULT_ACTIVE_FPS,
            idle_frame_rate: DEFAULT_IDLE_FPS,
            minimum_frame_rate: DEFAULT_MINIMUM_FPS,
        }
    }
}

impl FrameRateConfig {
    /// Target frame rate for `level`.
    ///
    /// Every level above 0 shares one floor rate rather than scaling.
    pub fn rate_for(&self, level: IdleLevel) -> f64 {
        if level.is_active() {
            self.active_frame_rate
        } else {
            self.idle_frame_rate.max(self.minimum_frame_rate)
        }
    }

    /// Level the idle clocks call for, before step limiting.
    pub fn target_level(&self, camera_idle: Duration, network_idle: Duration) -> IdleLevel {
        let idle = camera_idle.min(network_idle);

        if idle > self.level3_after && network_idle > self.network_quiet_after {
            IdleLevel::DeepIdle
        } else if idle > self.level2_after {
            IdleLevel::Idle
        } else if idle > self.level1_after {
            IdleLevel::Settling
        } else {
            IdleLevel::Active
        }
    }

    fn problem(&self) -> Option<&'static str> {
        let durations = [
            self.tick_interval,
            self.level1_after,
            self.level2_after,
            self.level3_after,
            self.network_quiet_after,
        ];
        if durations.iter().any(Duration::is_zero) {
            return Some("durations must be positive");
        }
        if !(self.level1_after < self.level2_after && self.level2_after < self.level3_after) {
            return Some("level thresholds must be strictly increasing");
        }

        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.active_frame_rate)
            || !positive(self.idle_frame_rate)
            || !positive(self.minimum_frame_rate)
        {
            return Some("frame rates must be positive");
        }
        if self.minimum_frame_rate > self.active_frame_rate {
            return Some("minimum_frame_rate exceeds active_frame_rate");
        }
        None
    }

    /// Return this config if usable, otherwise the defaults.
    pub fn validated(self) -> Self {
        match self.problem() {
            None => self,
            Some(reason) => {
                tracing::warn!(reason, config = ?self, "Invalid frame rate config, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_target_level_thresholds() {
        let c = FrameRateConfig::default();
        assert_eq!(c.target_level(secs(1.0), secs(60.0)), IdleLevel::Active);
        assert_eq!(c.target_level(secs(2.5), secs(60.0)), IdleLevel::Settling);
        assert_eq!(c.target_level(secs(6.0), secs(60.0)), IdleLevel::Idle);
        assert_eq!(c.target_level(secs(25.0), secs(60.0)), IdleLevel::DeepIdle);
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        let c = FrameRateConfig::default();
        assert_eq!(c.target_level(secs(2.0), secs(2.0)), IdleLevel::Active);
        assert_eq!(c.target_level(secs(5.0), secs(60.0)), IdleLevel::Settling);
    }

    #[test]
    fn test_idle_time_is_minimum_of_clocks() {
        let c = FrameRateConfig::default();
        // Camera long idle, network busy recently.
        assert_eq!(c.target_level(secs(60.0), secs(3.0)), IdleLevel::Settling);
    }

    #[test]
    fn test_deep_idle_requires_quiet_network() {
        let c = FrameRateConfig {
            level3_after: secs(8.0),
            network_quiet_after: secs(30.0),
            ..Default::default()
        };
        // Both clocks past level3_after, but network not yet quiet.
        assert_eq!(c.target_level(secs(40.0), secs(20.0)), IdleLevel::Idle);
        assert_eq!(c.target_level(secs(40.0), secs(35.0)), IdleLevel::DeepIdle);
    }

    #[test]
    fn test_rate_for_levels() {
        let c = FrameRateConfig::default();
        assert_eq!(c.rate_for(IdleLevel::Active), 60.0);
        assert_eq!(c.rate_for(IdleLevel::Settling), 20.0);
        assert_eq!(c.rate_for(IdleLevel::DeepIdle), 20.0);
    }

    #[test]
    fn test_idle_rate_respects_minimum() {
        let c = FrameRateConfig {
            idle_frame_rate: 5.0,
            minimum_frame_rate: 15.0,
            ..Default::default()
        };
        assert_eq!(c.rate_for(IdleLevel::Idle), 15.0);
    }

    #[test]
    fn test_invalid_configs_fall_back() {
        let cases = [
            FrameRateConfig {
                tick_interval: Duration::ZERO,
                ..Default::default()
            },
            FrameRateConfig {
                level2_after: secs(1.0),
                ..Default::default()
            },
            FrameRateConfig {
                idle_frame_rate: -1.0,
                ..Default::default()
            },
            FrameRateConfig {
                minimum_frame_rate: 120.0,
                ..Default::default()
            },
        ];
        for config in cases {
            assert_eq!(config.validated(), FrameRateConfig::default());
        }
    }

    #[test]
    fn test_valid_config_kept() {
        let c = FrameRateConfig {
            active_frame_rate: 30.0,
            ..Default::default()
        };
        assert_eq!(c.clone().validated(), c);
    }
}
