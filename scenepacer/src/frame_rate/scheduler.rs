//! Idle-level state machine driving the renderer's target frame rate.
//!
//! # State Machine
//!
//! ```text
//!            significant movement / tiles loading / force_active
//!        ┌──────────────────────────────────────────────────────┐
//!        ▼                                                      │
//!     ┌────┐  idle > T1  ┌────┐  idle > T2  ┌────┐  idle > T3   ┌────┐
//!     │ L0 │────────────►│ L1 │────────────►│ L2 │─────────────►│ L3 │
//!     └────┘             └────┘             └────┘  & net quiet └────┘
//! ```
//!
//! `idle = min(camera_idle, network_idle)`. One step per evaluation; a reset
//! to L0 is immediate. Each level change pushes the new rate and requests one
//! render so the change is visible without waiting for the next frame.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::config::FrameRateConfig;
use super::idle_level::IdleLevel;
use crate::camera::{CameraSnapshot, MovementDetector};
use crate::runtime::{spawn_controller, RuntimeError, Subscription, TimedController};
use crate::scene::SharedScene;

/// Point-in-time view of the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRateStatus {
    pub level: IdleLevel,
    /// Rate the current level maps to.
    pub target_frame_rate: f64,
    pub camera_idle: Duration,
    pub network_idle: Duration,
    pub enabled: bool,
    pub running: bool,
    /// Level transitions since construction.
    pub level_changes: u64,
    /// Failed renderer writes since construction.
    pub renderer_errors: u64,
}

#[derive(Debug)]
struct SchedulerState {
    enabled: bool,
    running: bool,
    level: IdleLevel,
    last_camera: Option<CameraSnapshot>,
    last_movement: Instant,
    last_network_activity: Instant,
    /// Renderer rate before the current override (`None` inside = uncapped).
    baseline: Option<Option<f64>>,
    /// Whether the renderer currently holds a rate written by us.
    overridden: bool,
    level_changes: u64,
    renderer_errors: u64,
}

/// Throttles the renderer's frame rate while the camera and network are idle.
pub struct FrameRateScheduler {
    config: FrameRateConfig,
    scene: SharedScene,
    detector: Arc<MovementDetector>,
    state: Mutex<SchedulerState>,
}

impl FrameRateScheduler {
    /// Create a scheduler. Invalid configs fall back to the defaults.
    pub fn new(
        scene: SharedScene,
        detector: Arc<MovementDetector>,
        config: FrameRateConfig,
    ) -> Self {
        let now = Instant::now();
        Self {
            config: config.validated(),
            scene,
            detector,
            state: Mutex::new(SchedulerState {
                enabled: true,
                running: false,
                level: IdleLevel::Active,
                last_camera: None,
                last_movement: now,
                last_network_activity: now,
                baseline: None,
                overridden: false,
                level_changes: 0,
                renderer_errors: 0,
            }),
        }
    }

    pub fn with_defaults(scene: SharedScene, detector: Arc<MovementDetector>) -> Self {
        Self::new(scene, detector, FrameRateConfig::default())
    }

    pub fn config(&self) -> &FrameRateConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Capture the renderer's current rate, apply the active rate, and start
    /// the evaluation task.
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

        let now = Instant::now();
        let mut state = self.state.lock();
        self.capture_baseline(&mut state);
        state.last_camera = self.scene.camera().ok();
        state.last_movement = now;
        state.last_network_activity = now;
        state.level = IdleLevel::Active;
        if state.enabled {
            self.push_rate(&mut state, self.config.active_frame_rate);
        }

        tracing::info!(
            active_fps = self.config.active_frame_rate,
            idle_fps = self.config.rate_for(IdleLevel::Settling),
            "Frame rate scheduler started"
        );
        Ok(subscription)
    }

    /// Stop the evaluation task and restore the original frame rate.
    pub fn stop(&self, subscription: Subscription) {
        subscription.cancel();
        self.release();
    }

    /// Enable or disable throttling.
    ///
    /// Disabling restores the original rate. Re-enabling resets both idle
    /// clocks and re-applies the active rate.
    pub fn set_enabled(&self, enabled: bool) {
        let mut state = self.state.lock();
        if state.enabled == enabled {
            return;
        }
        state.enabled = enabled;

        if enabled {
            let now = Instant::now();
            state.last_movement = now;
            state.last_network_activity = now;
            state.level = IdleLevel::Active;
            if state.running {
                self.push_rate(&mut state, self.config.active_frame_rate);
            }
            tracing::info!("Frame rate throttling enabled");
        } else {
            self.restore_baseline(&mut state);
            state.level = IdleLevel::Active;
            tracing::info!("Frame rate throttling disabled");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn level(&self) -> IdleLevel {
        self.state.lock().level
    }

    /// Reset to full rate immediately, e.g. from a UI interaction handler.
    pub fn force_active(&self) {
        self.force_active_at(Instant::now());
    }

    pub fn force_active_at(&self, now: Instant) {
        let mut state = self.state.lock();
        state.last_movement = now;
        if state.enabled && state.running {
            self.change_level(&mut state, IdleLevel::Active, "forced");
        }
    }

    pub fn status(&self) -> FrameRateStatus {
        self.status_at(Instant::now())
    }

    pub fn status_at(&self, now: Instant) -> FrameRateStatus {
        let state = self.state.lock();
        FrameRateStatus {
            level: state.level,
            target_frame_rate: self.config.rate_for(state.level),
            camera_idle: now.saturating_duration_since(state.last_movement),
            network_idle: now.saturating_duration_since(state.last_network_activity),
            enabled: state.enabled,
            running: state.running,
            level_changes: state.level_changes,
            renderer_errors: state.renderer_errors,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Evaluation
    // ─────────────────────────────────────────────────────────────────────

    /// Evaluate the idle level as of `now`.
    ///
    /// While disabled or stopped this only retries a failed restore.
    pub fn tick_at(&self, now: Instant) {
        let mut state = self.state.lock();
        if !state.enabled || !state.running {
            self.restore_baseline(&mut state);
            return;
        }

        let loading = match self.scene.tiles_loading() {
            Ok(count) => count,
            Err(e) => {
                tracing::debug!(error = %e, "Renderer unavailable, skipping frame rate tick");
                return;
            }
        };

        if loading > 0 {
            state.last_network_activity = now;
            self.change_level(&mut state, IdleLevel::Active, "tiles loading");
            return;
        }

        let camera_idle = now.saturating_duration_since(state.last_movement);
        let network_idle = now.saturating_duration_since(state.last_network_activity);
        let target = self.config.target_level(camera_idle, network_idle);
        let next = state.level.step_towards(target);

        tracing::debug!(
            camera_idle_ms = camera_idle.as_millis() as u64,
            network_idle_ms = network_idle.as_millis() as u64,
            current = state.level.as_u8(),
            target = target.as_u8(),
            "Frame rate tick"
        );

        self.change_level(&mut state, next, "idle");
    }

    /// React to a camera-changed notification received at `now`.
    pub fn on_camera_changed_at(&self, snapshot: &CameraSnapshot, now: Instant) {
        let mut state = self.state.lock();
        if !state.enabled || !state.running {
            self.restore_baseline(&mut state);
            return;
        }

        let moved = match &state.last_camera {
            Some(previous) => self.detector.has_moved_significantly(previous, snapshot),
            None => true,
        };
        if !moved {
            return;
        }

        state.last_camera = Some(*snapshot);
        state.last_movement = now;
        self.change_level(&mut state, IdleLevel::Active, "camera moved");
    }

    fn change_level(&self, state: &mut SchedulerState, next: IdleLevel, reason: &'static str) {
        if state.level == next {
            return;
        }

        let previous = state.level;
        state.level = next;
        state.level_changes += 1;

        let fps = self.config.rate_for(next);
        tracing::info!(from = %previous, to = %next, fps, reason, "Idle level changed");
        self.push_rate(state, fps);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Renderer writes (never propagate failures)
    // ─────────────────────────────────────────────────────────────────────

    fn capture_baseline(&self, state: &mut SchedulerState) {
        if state.baseline.is_some() {
            return;
        }
        match self.scene.target_frame_rate() {
            Ok(rate) => state.baseline = Some(rate),
            Err(e) => tracing::warn!(error = %e, "Could not read original frame rate"),
        }
    }

    /// Write `fps`, but only once the original rate is known; an override
    /// that cannot be undone is never applied.
    fn push_rate(&self, state: &mut SchedulerState, fps: f64) {
        self.capture_baseline(state);
        if state.baseline.is_none() {
            state.renderer_errors += 1;
            tracing::warn!(fps, "Original frame rate unknown, not overriding");
            return;
        }

        if let Err(e) = self.scene.set_target_frame_rate(Some(fps)) {
            state.renderer_errors += 1;
            tracing::warn!(error = %e, fps, "Failed to set target frame rate");
            return;
        }
        state.overridden = true;

        self.request_render(state);
    }

    fn request_render(&self, state: &mut SchedulerState) {
        if let Err(e) = self.scene.request_render() {
            state.renderer_errors += 1;
            tracing::warn!(error = %e, "Failed to request render");
        }
    }

    fn restore_baseline(&self, state: &mut SchedulerState) {
        if !state.overridden {
            return;
        }
        let Some(original) = state.baseline else {
            return;
        };

        match self.scene.set_target_frame_rate(original) {
            Ok(()) => {
                state.overridden = false;
                state.baseline = None;
                self.request_render(state);
                tracing::info!(fps = ?original, "Restored original frame rate");
            }
            Err(e) => {
                state.renderer_errors += 1;
                tracing::warn!(error = %e, "Failed to restore original frame rate");
            }
        }
    }

    fn release(&self) {
        let mut state = self.state.lock();
        if !state.running && !state.overridden {
            return;
        }
        state.running = false;
        state.level = IdleLevel::Active;
        self.restore_baseline(&mut state);
        tracing::info!("Frame rate scheduler stopped");
    }
}

impl TimedController for FrameRateScheduler {
    fn name(&self) -> &'static str {
        "frame_rate"
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

impl std::fmt::Debug for FrameRateScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRateScheduler")
            .field("config", &self.config)
            .field("state", &*self.state.lock())
            .finish()
    }
}
