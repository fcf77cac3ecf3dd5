//! Freeze/unfreeze state machine for tile detail requests.
//!
//! ```text
//!               no significant movement for freeze_delay
//!   ┌──────────┐ ───────────────────────────────────────► ┌────────┐
//!   │ Unfrozen │                                          │ Frozen │
//!   └──────────┘ ◄─────────────────────────────────────── └────────┘
//!        distance > move_threshold OR |Δh|/h0 > zoom_threshold
//! ```
//!
//! Freezing writes a huge screen-space error tolerance and disables
//! progressive refinement, so the renderer keeps drawing cached tiles but
//! requests nothing new. The pre-freeze settings are saved inside the
//! `Frozen` state and written back on unfreeze.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::config::TileFreezeConfig;
use crate::camera::{CameraSnapshot, MovementDetector};
use crate::runtime::{spawn_controller, RuntimeError, Subscription, TimedController};
use crate::scene::{SharedScene, TileCacheStats, TileDetailSettings};

/// Whether tile detail requests are suspended.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FreezeState {
    #[default]
    Unfrozen,
    Frozen {
        /// Camera state when the freeze began.
        snapshot: CameraSnapshot,
        /// Renderer settings to restore on unfreeze.
        saved: TileDetailSettings,
    },
}

impl FreezeState {
    pub fn is_frozen(&self) -> bool {
        matches!(self, FreezeState::Frozen { .. })
    }

    /// Camera snapshot taken at freeze time; `None` iff unfrozen.
    pub fn snapshot(&self) -> Option<&CameraSnapshot> {
        match self {
            FreezeState::Unfrozen => None,
            FreezeState::Frozen { snapshot, .. } => Some(snapshot),
        }
    }
}

/// Relative height change, guarding against a zero reference height.
fn relative_height_change(reference: f64, current: f64) -> f64 {
    (current - reference).abs() / reference.abs().max(1.0)
}

/// Check whether the camera has left the frozen view.
///
/// Both limits are exclusive: a change exactly at a threshold stays frozen.
pub fn should_unfreeze(
    frozen: &CameraSnapshot,
    current: &CameraSnapshot,
    config: &TileFreezeConfig,
) -> bool {
    frozen.position.distance(current.position) > config.move_threshold_m
        || relative_height_change(frozen.height, current.height) > config.zoom_threshold
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct FreezeStatus {
    pub frozen: bool,
    pub time_since_movement: Duration,
    /// Freezes since construction.
    pub freeze_count: u64,
    /// How long the most recent completed freeze lasted.
    pub last_frozen_duration: Option<Duration>,
    pub enabled: bool,
    pub running: bool,
}

#[derive(Debug)]
struct ControllerState {
    enabled: bool,
    running: bool,
    freeze: FreezeState,
    last_camera: Option<CameraSnapshot>,
    last_movement: Instant,
    frozen_at: Option<Instant>,
    freeze_count: u64,
    last_frozen_duration: Option<Duration>,
}

/// Suspends tile detail requests while the camera is stationary.
pub struct TileFreezeController {
    config: TileFreezeConfig,
    scene: SharedScene,
    detector: Arc<MovementDetector>,
    state: Mutex<ControllerState>,
}

impl TileFreezeController {
    /// Create a controller. Invalid configs fall back to the defaults.
    pub fn new(
        scene: SharedScene,
        detector: Arc<MovementDetector>,
        config: TileFreezeConfig,
    ) -> Self {
        Self {
            config: config.validated(),
            scene,
            detector,
            state: Mutex::new(ControllerState {
                enabled: true,
                running: false,
                freeze: FreezeState::Unfrozen,
                last_camera: None,
                last_movement: Instant::now(),
                frozen_at: None,
                freeze_count: 0,
                last_frozen_duration: None,
            }),
        }
    }

    pub fn with_defaults(scene: SharedScene, detector: Arc<MovementDetector>) -> Self {
        Self::new(scene, detector, TileFreezeConfig::default())
    }

    pub fn config(&self) -> &TileFreezeConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Start the evaluation task. The freeze clock starts now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self: &Arc<Self>) -> Result<Subscription, RuntimeError> {
        {
            let mut state = self.state.lock();
            if state.running {
                return Err(RuntimeError::AlreadyRunning(self.name()));
            }
            state.running = true;
        }

        let subscription = match spawn_controller(Arc::clone(self), self.detector.subscribe()) {
            Ok(subscription) => subscription,
            Err(e) => {
                self.state.lock().running = false;
                return Err(e);
            }
        };

        let mut state = self.state.lock();
        state.last_movement = Instant::now();
        state.last_camera = self.scene.camera().ok();

        tracing::info!(
            freeze_delay_ms = self.config.freeze_delay.as_millis() as u64,
            move_threshold_m = self.config.move_threshold_m,
            zoom_threshold = self.config.zoom_threshold,
            "Tile freeze controller started"
        );
        Ok(subscription)
    }

    /// Stop the evaluation task, unfreezing first if frozen.
    pub fn stop(&self, subscription: Subscription) {
        subscription.cancel();
        self.release();
    }

    /// Enable or disable freezing. Disabling unfreezes immediately.
    pub fn set_enabled(&self, enabled: bool) {
        let now = Instant::now();
        let mut state = self.state.lock();
        if state.enabled == enabled {
            return;
        }

        if enabled {
            state.enabled = true;
            state.last_movement = now;
            tracing::info!("Tile freezing enabled");
        } else {
            self.unfreeze(&mut state, now, "disabled");
            state.enabled = false;
            tracing::info!("Tile freezing disabled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn is_frozen(&self) -> bool {
        self.state.lock().freeze.is_frozen()
    }

    pub fn freeze_state(&self) -> FreezeState {
        self.state.lock().freeze
    }

    /// Unfreeze and restart the freeze clock, e.g. from a UI handler.
    pub fn force_active(&self) {
        self.force_active_at(Instant::now());
    }

    pub fn force_active_at(&self, now: Instant) {
        let mut state = self.state.lock();
        state.last_movement = now;
        self.unfreeze(&mut state, now, "forced");
    }

    pub fn status(&self) -> FreezeStatus {
        self.status_at(Instant::now())
    }

    pub fn status_at(&self, now: Instant) -> FreezeStatus {
        let state = self.state.lock();
        FreezeStatus {
            frozen: state.freeze.is_frozen(),
            time_since_movement: now.saturating_duration_since(state.last_movement),
            freeze_count: state.freeze_count,
            last_frozen_duration: state.last_frozen_duration,
            enabled: state.enabled,
            running: state.running,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Evaluation
    // ─────────────────────────────────────────────────────────────────────

    /// Evaluate freeze state as of `now`.
    ///
    /// Without cache statistics the tick does nothing: the controller
    /// neither freezes nor unfreezes early. While disabled or stopped it only
    /// retries a failed restore.
    pub fn tick_at(&self, now: Instant) {
        let mut state = self.state.lock();
        if !state.enabled || !state.running {
            self.unfreeze(&mut state, now, "restore retry");
            return;
        }

        let stats = match self.scene.tile_cache_stats() {
            Ok(Some(stats)) => stats,
            Ok(None) => {
                tracing::debug!("Tile cache statistics not available, skipping freeze tick");
                return;
            }
            Err(e) => {
                tracing::debug!(error = %e, "Renderer unavailable, skipping freeze tick");
                return;
            }
        };

        let freeze = state.freeze;
        match freeze {
            FreezeState::Unfrozen => {
                let stationary = now.saturating_duration_since(state.last_movement);
                if stationary >= self.config.freeze_delay {
                    self.freeze(&mut state, &stats, now);
                }
            }
            FreezeState::Frozen { snapshot, .. } => match self.scene.camera() {
                // Catches movement whose event was missed.
                Ok(current) if should_unfreeze(&snapshot, &current, &self.config) => {
                    self.unfreeze(&mut state, now, "camera left frozen view");
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "Could not read camera while frozen"),
            },
        }
    }

    /// React to a camera-changed notification received at `now`.
    ///
    /// Unfreezing here does not depend on cache statistics: user movement
    /// always restores detail.
    pub fn on_camera_changed_at(&self, snapshot: &CameraSnapshot, now: Instant) {
        let mut state = self.state.lock();
        if !state.enabled || !state.running {
            self.unfreeze(&mut state, now, "restore retry");
            return;
        }

        let moved = match &state.last_camera {
            Some(previous) => self.detector.has_moved_significantly(previous, snapshot),
            None => true,
        };
        if moved {
            state.last_camera = Some(*snapshot);
            state.last_movement = now;
        }

        let freeze = state.freeze;
        if let FreezeState::Frozen { snapshot: frozen, .. } = freeze {
            if should_unfreeze(&frozen, snapshot, &self.config) {
                self.unfreeze(&mut state, now, "camera left frozen view");
            }
        }
    }

    fn freeze(&self, state: &mut ControllerState, stats: &TileCacheStats, now: Instant) {
        let camera = match self.scene.camera() {
            Ok(camera) => camera,
            Err(e) => {
                tracing::debug!(error = %e, "Could not read camera, not freezing");
                return;
            }
        };
        let saved = match self.scene.tile_detail() {
            Ok(detail) => detail,
            Err(e) => {
                tracing::debug!(error = %e, "Could not read tile detail, not freezing");
                return;
            }
        };

        let frozen = TileDetailSettings {
            maximum_screen_space_error: self.config.frozen_screen_space_error,
            progressive_refinement: false,
        };
        if let Err(e) = self.scene.set_tile_detail(frozen) {
            tracing::warn!(error = %e, "Failed to freeze tile detail");
            return;
        }

        state.freeze = FreezeState::Frozen {
            snapshot: camera,
            saved,
        };
        state.frozen_at = Some(now);
        state.freeze_count += 1;

        tracing::info!(
            tiles_cached = stats.tiles_cached,
            memory_mb = stats.memory_bytes / (1024 * 1024),
            saved = %saved,
            "Tiles frozen"
        );
    }

    /// Restore the saved settings. Stays frozen if the write fails.
    fn unfreeze(&self, state: &mut ControllerState, now: Instant, reason: &'static str) {
        let FreezeState::Frozen { saved, .. } = state.freeze else {
            return;
        };

        if let Err(e) = self.scene.set_tile_detail(saved) {
            tracing::warn!(error = %e, reason, "Failed to restore tile detail, staying frozen");
            return;
        }

        let frozen_for = state
            .frozen_at
            .take()
            .map(|at| now.saturating_duration_since(at));
        state.freeze = FreezeState::Unfrozen;
        state.last_frozen_duration = frozen_for;
        state.last_movement = now;

        tracing::info!(
            reason,
            frozen_for_ms = frozen_for.map(|d| d.as_millis() as u64),
            restored = %saved,
            "Tiles unfrozen"
        );
    }

    fn release(&self) {
        let mut state = self.state.lock();
        if !state.running && !state.freeze.is_frozen() {
            return;
        }
        state.running = false;
        self.unfreeze(&mut state, Instant::now(), "stopped");
        tracing::info!("Tile freeze controller stopped");
    }
}

impl TimedController for TileFreezeController {
    fn name(&self) -> &'static str {
        "tile_freeze"
    }

    fn tick_interval(&self) -> Duration {
        self.config.tick_interval
    }

    fn tick(&self) {
        self.tick_at(Instant::now());
    }

    fn on_camera_changed(&self, snapshot: &CameraSnapshot) {
        self.on_camera_changed_at(snapshot, Instant::now());
    }

    fn shutdown(&self) {
        self.release();
    }
}

impl std::fmt::Debug for TileFreezeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileFreezeController")
            .field("config", &self.config)
            .field("state", &*self.state.lock())
            .finish()
    }
}
