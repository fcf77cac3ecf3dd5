//! Frame rate scheduling.
//!
//! Continuous full-rate rendering of a static view wastes CPU and heats the
//! device. The scheduler tracks how long the camera and the tile stream have
//! been idle, maps that to an [`IdleLevel`], and lowers the renderer's target
//! frame rate accordingly. Any significant camera movement, any tile load,
//! or a call to [`FrameRateScheduler::force_active`] restores the full rate.

mod config;
mod idle_level;
mod scheduler;

pub use config::{
    FrameRateConfig, DEFAULT_ACTIVE_FPS, DEFAULT_IDLE_FPS, DEFAULT_LEVEL1_AFTER,
    DEFAULT_LEVEL2_AFTER, DEFAULT_LEVEL3_AFTER, DEFAULT_MINIMUM_FPS, DEFAULT_NETWORK_QUIET_AFTER,
    DEFAULT_TICK_INTERVAL,
};
pub use idle_level::IdleLevel;
pub use scheduler::{FrameRateScheduler, FrameRateStatus};
