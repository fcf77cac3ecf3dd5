//! Simulate command - watch both render pacing controllers react to a
//! scripted camera.
//!
//! The camera holds still except for jumps at the `--move-at` offsets. One
//! status line is printed per second; renderer state is restored on exit.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use scenepacer::camera::MovementDetector;
use scenepacer::config::ConfigFile;
use scenepacer::frame_rate::{FrameRateScheduler, FrameRateStatus};
use scenepacer::geometry::Cartesian3;
use scenepacer::scene::{SharedScene, SimulatedScene};
use scenepacer::tile_freeze::{FreezeStatus, TileFreezeController};

use crate::error::CliError;

/// Arguments for the simulate command.
#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// How long to run, in seconds
    #[arg(long, default_value_t = 30)]
    pub seconds: u64,

    /// Move the camera this many seconds in (repeatable)
    #[arg(long = "move-at", value_name = "S")]
    pub move_at: Vec<u64>,

    /// Distance of each scripted camera jump in metres
    #[arg(long, default_value_t = 1000.0)]
    pub move_distance: f64,
}

/// Run the simulate command.
pub fn run(args: SimulateArgs, config: &ConfigFile) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(format!("failed to build tokio runtime: {}", e)))?;

    runtime.block_on(simulate(&args, config, |line| println!("{}", line)))
}

/// Drive a simulated scene for `args.seconds`, reporting once per second.
async fn simulate(
    args: &SimulateArgs,
    config: &ConfigFile,
    mut report: impl FnMut(String),
) -> Result<(), CliError> {
    if !args.move_distance.is_finite() {
        return Err(CliError::Input("move distance must be finite".to_string()));
    }

    let scene = Arc::new(SimulatedScene::with_defaults());
    let shared: SharedScene = scene.clone();
    let detector = Arc::new(MovementDetector::new(config.movement));

    let frame_rate = Arc::new(FrameRateScheduler::new(
        Arc::clone(&shared),
        Arc::clone(&detector),
        config.frame_rate.clone(),
    ));
    let tile_freeze = Arc::new(TileFreezeController::new(
        shared,
        Arc::clone(&detector),
        config.tile_freeze.clone(),
    ));

    let frame_sub = frame_rate.start()?;
    let freeze_sub = match tile_freeze.start() {
        Ok(sub) => sub,
        Err(e) => {
            frame_rate.stop(frame_sub);
            return Err(e.into());
        }
    };

    tracing::info!(
        seconds = args.seconds,
        moves = args.move_at.len(),
        "Simulation started"
    );

    for second in 0..args.seconds {
        if args.move_at.contains(&second) {
            let moved = scene.move_camera(Cartesian3::new(args.move_distance, 0.0, 0.0));
            let receivers = detector.publish(moved);
            tracing::debug!(second, receivers, "Scripted camera move");
            report(format!("t={:>3}s  camera moved {} m", second, args.move_distance));
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
        report(status_line(
            second + 1,
            &frame_rate.status(),
            &tile_freeze.status(),
        ));
    }

    frame_rate.stop(frame_sub);
    tile_freeze.stop(freeze_sub);

    report(format!(
        "stopped: target frame rate {}, max screen space error {}",
        scene
            .observed_frame_rate()
            .map(|fps| format!("{:.0} fps", fps))
            .unwrap_or_else(|| "unset".to_string()),
        scene.observed_tile_detail().maximum_screen_space_error
    ));

    Ok(())
}

fn status_line(second: u64, frame_rate: &FrameRateStatus, freeze: &FreezeStatus) -> String {
    format!(
        concat!(
            "t={:>3}s  {}  {:>3.0} fps  ",
            "camera idle {:>5.1}s  network idle {:>5.1}s  tiles {}  freezes {}"
        ),
        second,
        frame_rate.level,
        frame_rate.target_frame_rate,
        frame_rate.camera_idle.as_secs_f64(),
        frame_rate.network_idle.as_secs_f64(),
        if freeze.frozen { "frozen" } else { "live" },
        freeze.freeze_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenepacer::frame_rate::{FrameRateConfig, IdleLevel};
    use scenepacer::tile_freeze::TileFreezeConfig;

    fn fast_config() -> ConfigFile {
        ConfigFile {
            frame_rate: FrameRateConfig {
                tick_interval: Duration::from_millis(50),
                level1_after: Duration::from_millis(200),
                level2_after: Duration::from_millis(400),
                level3_after: Duration::from_millis(800),
                network_quiet_after: Duration::from_millis(300),
                ..Default::default()
            },
            tile_freeze: TileFreezeConfig {
                tick_interval: Duration::from_millis(50),
                freeze_delay: Duration::from_millis(300),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_status_line_format() {
        let frame_rate = FrameRateStatus {
            level: IdleLevel::Active,
            target_frame_rate: 60.0,
            camera_idle: Duration::from_millis(1500),
            network_idle: Duration::from_secs(12),
            enabled: true,
            running: true,
            level_changes: 0,
            renderer_errors: 0,
        };
        let freeze = FreezeStatus {
            frozen: true,
            time_since_movement: Duration::from_secs(4),
            freeze_count: 2,
            last_frozen_duration: None,
            enabled: true,
            running: true,
        };

        let line = status_line(7, &frame_rate, &freeze);
        assert!(line.starts_with("t=  7s"));
        assert!(line.contains(" 60 fps"));
        assert!(line.contains("camera idle   1.5s"));
        assert!(line.contains("tiles frozen"));
        assert!(line.ends_with("freezes 2"));
    }

    #[tokio::test]
    async fn test_simulation_reports_each_second() {
        let args = SimulateArgs {
            seconds: 2,
            move_at: vec![1],
            move_distance: 1000.0,
        };
        let mut lines = Vec::new();
        simulate(&args, &fast_config(), |line| lines.push(line))
            .await
            .unwrap();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("t=  1s"));
        assert!(lines[0].contains("tiles frozen"));
        assert!(lines[1].contains("camera moved"));
        assert!(lines[2].starts_with("t=  2s"));
        assert!(lines[3].starts_with("stopped: target frame rate 60 fps"));
    }

    #[tokio::test]
    async fn test_simulation_rejects_non_finite_distance() {
        let args = SimulateArgs {
            seconds: 1,
            move_at: Vec::new(),
            move_distance: f64::NAN,
        };
        let result = simulate(&args, &ConfigFile::default(), |_| {}).await;
        assert!(matches!(result, Err(CliError::Input(_))));
    }

    #[test]
    fn test_run_builds_its_own_runtime() {
        let args = SimulateArgs {
            seconds: 0,
            move_at: Vec::new(),
            move_distance: 1000.0,
        };
        assert!(run(args, &fast_config()).is_ok());
    }
}
