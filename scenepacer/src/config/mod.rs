//! Configuration file handling.
//!
//! Settings live in `~/.scenepacer/config.ini`:
//!
//! ```ini
//! [movement]
//! position_threshold_m = 0.1
//! angle_threshold_rad = 0.001
//!
//! [frame_rate]
//! tick_interval_ms = 500
//! level1_after_ms = 2000
//! level2_after_ms = 5000
//! level3_after_ms = 20000
//! network_quiet_after_ms = 10000
//! active_fps = 60
//! idle_fps = 20
//! minimum_fps = 10
//!
//! [tile_freeze]
//! tick_interval_ms = 1000
//! freeze_delay_ms = 3000
//! move_threshold_m = 100
//! zoom_threshold_percent = 20
//!
//! [declutter]
//! base_leader_length = 50000
//! min_separation = 80000
//! max_leader_length = 250000
//! max_iterations = 15
//! angle_step_deg = 10
//! extension_factor = 1.15
//!
//! [logging]
//! level = info
//! file =
//! ```

mod error;
mod file;

use std::path::PathBuf;

pub use error::ConfigError;
pub use file::ConfigFile;

/// Directory name under the user's home directory.
const CONFIG_DIR_NAME: &str = ".scenepacer";

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.ini";

/// `~/.scenepacer`, if the home directory is known.
pub fn config_directory() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME))
}

/// `~/.scenepacer/config.ini`, if the home directory is known.
pub fn config_file_path() -> Option<PathBuf> {
    config_directory().map(|dir| dir.join(CONFIG_FILE_NAME))
}
