//! Tile stream freezing.
//!
//! Once the camera has been stationary for a while there is nothing new to
//! stream, yet a tile renderer keeps refining and re-requesting detail. The
//! freeze controller suspends detail requests after `freeze_delay` without
//! significant movement and resumes them when the camera leaves the frozen
//! view by distance or by zoom.

mod config;
mod controller;

pub use config::{
    TileFreezeConfig, DEFAULT_FREEZE_DELAY, DEFAULT_MOVE_THRESHOLD_M, DEFAULT_TICK_INTERVAL,
    DEFAULT_ZOOM_THRESHOLD, FROZEN_SCREEN_SPACE_ERROR,
};
pub use controller::{should_unfreeze, FreezeState, FreezeStatus, TileFreezeController};
