//! INI-backed settings for every controller.
//!
//! Missing sections and keys keep their defaults. Values that do not parse
//! are errors; values that parse but make no sense (zero delays, inverted
//! thresholds) are left for each controller's `validated()` to replace.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use super::error::ConfigError;
use super::config_file_path;
use crate::camera::MovementThresholds;
use crate::declutter::DeclutterConfig;
use crate::frame_rate::FrameRateConfig;
use crate::logging::LoggingConfig;
use crate::tile_freeze::TileFreezeConfig;

const MOVEMENT: &str = "movement";
const FRAME_RATE: &str = "frame_rate";
const TILE_FREEZE: &str = "tile_freeze";
const DECLUTTER: &str = "declutter";
const LOGGING: &str = "logging";

/// Complete on-disk configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub movement: MovementThresholds,
    pub frame_rate: FrameRateConfig,
    pub tile_freeze: TileFreezeConfig,
    pub declutter: DeclutterConfig,
    pub logging: LoggingConfig,
}

/// Typed reader over one INI section.
struct SectionReader<'a> {
    name: &'static str,
    props: Option<&'a Properties>,
}

impl<'a> SectionReader<'a> {
    fn new(ini: &'a Ini, name: &'static str) -> Self {
        Self {
            name,
            props: ini.section(Some(name)),
        }
    }

    fn raw(&self, key: &'static str) -> Option<&'a str> {
        self.props
            .and_then(|p| p.get(key))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn parse<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        match self.raw(key) {
            None => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
                section: self.name,
                key,
                value: value.to_string(),
            }),
        }
    }

    fn f64(&self, key: &'static str, target: &mut f64) -> Result<(), ConfigError> {
        if let Some(v) = self.parse::<f64>(key)? {
            *target = v;
        }
        Ok(())
    }

    fn u32(&self, key: &'static str, target: &mut u32) -> Result<(), ConfigError> {
        if let Some(v) = self.parse::<u32>(key)? {
            *target = v;
        }
        Ok(())
    }

    fn millis(&self, key: &'static str, target: &mut Duration) -> Result<(), ConfigError> {
        if let Some(ms) = self.parse::<u64>(key)? {
            *target = Duration::from_millis(ms);
        }
        Ok(())
    }
}

impl ConfigFile {
    /// Load from the default location. A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path().ok_or(ConfigError::NoHomeDirectory)?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(e) => ConfigError::Parse(e.to_string()),
        })?;
        Self::from_ini(&ini)
    }

    /// Parse INI text.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let s = SectionReader::new(ini, MOVEMENT);
        s.f64("position_threshold_m", &mut config.movement.position_m)?;
        s.f64("angle_threshold_rad", &mut config.movement.angle_rad)?;

        let s = SectionReader::new(ini, FRAME_RATE);
        let fr = &mut config.frame_rate;
        s.millis("tick_interval_ms", &mut fr.tick_interval)?;
        s.millis("level1_after_ms", &mut fr.level1_after)?;
        s.millis("level2_after_ms", &mut fr.level2_after)?;
        s.millis("level3_after_ms", &mut fr.level3_after)?;
        s.millis("network_quiet_after_ms", &mut fr.network_quiet_after)?;
        s.f64("active_fps", &mut fr.active_frame_rate)?;
        s.f64("idle_fps", &mut fr.idle_frame_rate)?;
        s.f64("minimum_fps", &mut fr.minimum_frame_rate)?;

        let s = SectionReader::new(ini, TILE_FREEZE);
        let tf = &mut config.tile_freeze;
        s.millis("tick_interval_ms", &mut tf.tick_interval)?;
        s.millis("freeze_delay_ms", &mut tf.freeze_delay)?;
        s.f64("move_threshold_m", &mut tf.move_threshold_m)?;
        if let Some(percent) = s.parse::<f64>("zoom_threshold_percent")? {
            tf.zoom_threshold = percent / 100.0;
        }

        let s = SectionReader::new(ini, DECLUTTER);
        let dc = &mut config.declutter;
        s.f64("base_leader_length", &mut dc.base_leader_length)?;
        s.f64("min_separation", &mut dc.min_separation)?;
        s.f64("max_leader_length", &mut dc.max_leader_length)?;
        s.u32("max_iterations", &mut dc.max_iterations)?;
        if let Some(degrees) = s.parse::<f64>("angle_step_deg")? {
            dc.angle_step_rad = degrees.to_radians();
        }
        s.f64("extension_factor", &mut dc.extension_factor)?;

        let s = SectionReader::new(ini, LOGGING);
        if let Some(level) = s.raw("level") {
            config.logging.level = level.to_string();
        }
        config.logging.file = s.raw("file").map(Into::into);

        Ok(config)
    }

    /// Render every key as INI.
    pub fn to_ini(&self) -> Ini {
        let ms = |d: Duration| d.as_millis().to_string();
        let mut ini = Ini::new();

        ini.with_section(Some(MOVEMENT))
            .set("position_threshold_m", self.movement.position_m.to_string())
            .set("angle_threshold_rad", self.movement.angle_rad.to_string());

        let fr = &self.frame_rate;
        ini.with_section(Some(FRAME_RATE))
            .set("tick_interval_ms", ms(fr.tick_interval))
            .set("level1_after_ms", ms(fr.level1_after))
            .set("level2_after_ms", ms(fr.level2_after))
            .set("level3_after_ms", ms(fr.level3_after))
            .set("network_quiet_after_ms", ms(fr.network_quiet_after))
            .set("active_fps", fr.active_frame_rate.to_string())
            .set("idle_fps", fr.idle_frame_rate.to_string())
            .set("minimum_fps", fr.minimum_frame_rate.to_string());

        let tf = &self.tile_freeze;
        ini.with_section(Some(TILE_FREEZE))
            .set("tick_interval_ms", ms(tf.tick_interval))
            .set("freeze_delay_ms", ms(tf.freeze_delay))
            .set("move_threshold_m", tf.move_threshold_m.to_string())
            .set("zoom_threshold_percent", (tf.zoom_threshold * 100.0).to_string());

        let dc = &self.declutter;
        ini.with_section(Some(DECLUTTER))
            .set("base_leader_length", dc.base_leader_length.to_string())
            .set("min_separation", dc.min_separation.to_string())
            .set("max_leader_length", dc.max_leader_length.to_string())
            .set("max_iterations", dc.max_iterations.to_string())
            .set("angle_step_deg", dc.angle_step_rad.to_degrees().to_string())
            .set("extension_factor", dc.extension_factor.to_string());

        let file = self
            .logging
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        ini.with_section(Some(LOGGING))
            .set("level", self.logging.level.as_str())
            .set("file", file);

        ini
    }

    /// Every `(section, key, value)` in file order.
    pub fn entries(&self) -> Vec<(String, String, String)> {
        let ini = self.to_ini();
        let mut entries = Vec::new();
        for (section, props) in ini.iter() {
            let Some(section) = section else { continue };
            for (key, value) in props.iter() {
                entries.push((section.to_string(), key.to_string(), value.to_string()));
            }
        }
        entries
    }

    /// Write every key to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        self.to_ini().write_to_file(path).map_err(io_error)
    }

    /// Write to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_file_path().ok_or(ConfigError::NoHomeDirectory)?;
        self.save_to(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ConfigFile::from_ini_str("").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_partial_sections_override_only_given_keys() {
        let text = "\
[frame_rate]
idle_fps = 15
level3_after_ms = 30000

[tile_freeze]
zoom_threshold_percent = 35

[declutter]
angle_step_deg = 20
max_iterations = 25
";
        let config = ConfigFile::from_ini_str(text).unwrap();
        assert_eq!(config.frame_rate.idle_frame_rate, 15.0);
        assert_eq!(config.frame_rate.level3_after, Duration::from_secs(30));
        assert_eq!(config.frame_rate.active_frame_rate, 60.0);
        assert!((config.tile_freeze.zoom_threshold - 0.35).abs() < 1e-12);
        assert!((config.declutter.angle_step_rad - 20f64.to_radians()).abs() < 1e-12);
        assert_eq!(config.declutter.max_iterations, 25);
        assert_eq!(config.movement, MovementThresholds::default());
    }

    #[test]
    fn test_unparseable_value_is_error() {
        let err = ConfigFile::from_ini_str("[frame_rate]\nidle_fps = fast\n").unwrap_err();
        match err {
            ConfigError::InvalidValue {
                section,
                key,
                value,
            } => {
                assert_eq!(section, "frame_rate");
                assert_eq!(key, "idle_fps");
                assert_eq!(value, "fast");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_duration_is_error() {
        let err = ConfigFile::from_ini_str("[tile_freeze]\nfreeze_delay_ms = -5\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "freeze_delay_ms", .. }));
    }

    #[test]
    fn test_empty_value_keeps_default() {
        let config = ConfigFile::from_ini_str("[logging]\nlevel =\nfile =\n").unwrap();
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_logging_section() {
        let config =
            ConfigFile::from_ini_str("[logging]\nlevel = scenepacer=debug\nfile = /tmp/sp.log\n")
                .unwrap();
        assert_eq!(config.logging.level, "scenepacer=debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/sp.log")));
    }

    #[test]
    fn test_save_and_reload() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.frame_rate.idle_frame_rate = 24.0;
        config.tile_freeze.freeze_delay = Duration::from_millis(4500);
        config.declutter.min_separation = 120_000.0;
        config.logging.file = Some(temp.path().join("scenepacer.log"));
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded.frame_rate.idle_frame_rate, 24.0);
        assert_eq!(loaded.tile_freeze.freeze_delay, Duration::from_millis(4500));
        assert_eq!(loaded.declutter.min_separation, 120_000.0);
        assert_eq!(loaded.logging.file, config.logging.file);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = ConfigFile::load_from(&temp.path().join("absent.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_entries_cover_every_section() {
        let entries = ConfigFile::default().entries();
        for section in [MOVEMENT, FRAME_RATE, TILE_FREEZE, DECLUTTER, LOGGING] {
            assert!(entries.iter().any(|(s, _, _)| s == section), "missing [{section}]");
        }
        assert!(entries
            .iter()
            .any(|(s, k, v)| s == FRAME_RATE && k == "tick_interval_ms" && v == "500"));
    }
}
