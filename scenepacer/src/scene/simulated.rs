//! In-memory renderer.
//!
//! `SimulatedScene` implements [`SceneHandle`] without any graphics. It records
//! every settings write so tests can assert what the controllers did, and it
//! can be disposed and revived to exercise the renderer-unavailable paths.
//! The CLI `simulate` command drives the controllers against it.

use parking_lot::Mutex;

use super::error::SceneError;
use super::traits::{SceneHandle, TileCacheStats, TileDetailSettings};
use crate::camera::CameraSnapshot;
use crate::geometry::Cartesian3;

/// Default simulated target frame rate.
const DEFAULT_TARGET_FPS: f64 = 60.0;

#[derive(Debug)]
struct SimulatedState {
    disposed: bool,
    reject_writes: bool,
    target_fps: Option<f64>,
    tiles_loading: u32,
    detail: TileDetailSettings,
    cache_stats: Option<TileCacheStats>,
    camera: CameraSnapshot,
    render_requests: u64,
    frame_rate_writes: u64,
    detail_writes: u64,
}

/// Renderer stand-in with observable settings.
#[derive(Debug)]
pub struct SimulatedScene {
    state: Mutex<SimulatedState>,
}

impl SimulatedScene {
    /// Create a scene with the camera at `camera`.
    pub fn new(camera: CameraSnapshot) -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                disposed: false,
                reject_writes: false,
                target_fps: Some(DEFAULT_TARGET_FPS),
                tiles_loading: 0,
                detail: TileDetailSettings::default(),
                cache_stats: Some(TileCacheStats::default()),
                camera,
                render_requests: 0,
                frame_rate_writes: 0,
                detail_writes: 0,
            }),
        }
    }

    /// Scene with the camera 20 km above (lon 0, lat 45).
    pub fn with_defaults() -> Self {
        let height = 20_000.0;
        Self::new(CameraSnapshot::at(
            Cartesian3::from_degrees(0.0, 45.0, height),
            height,
        ))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scripting
    // ─────────────────────────────────────────────────────────────────────

    /// Replace the camera state.
    pub fn set_camera(&self, camera: CameraSnapshot) {
        self.state.lock().camera = camera;
    }

    /// Move the camera by `offset` and return the new snapshot.
    pub fn move_camera(&self, offset: Cartesian3) -> CameraSnapshot {
        let mut state = self.state.lock();
        state.camera = state.camera.translated(offset);
        state.camera
    }

    /// Set the number of tiles in flight.
    pub fn set_tiles_loading(&self, count: u32) {
        self.state.lock().tiles_loading = count;
    }

    /// Set (or clear) the tile cache statistics.
    pub fn set_cache_stats(&self, stats: Option<TileCacheStats>) {
        self.state.lock().cache_stats = stats;
    }

    /// Replace the renderer's tile detail settings directly (host-side change).
    pub fn set_initial_tile_detail(&self, detail: TileDetailSettings) {
        self.state.lock().detail = detail;
    }

    /// Replace the renderer's target frame rate directly (host-side change).
    pub fn set_initial_frame_rate(&self, fps: Option<f64>) {
        self.state.lock().target_fps = fps;
    }

    /// Tear the renderer down; every call fails until [`revive`](Self::revive).
    pub fn dispose(&self) {
        self.state.lock().disposed = true;
    }

    /// Bring a disposed renderer back.
    pub fn revive(&self) {
        self.state.lock().disposed = false;
    }

    /// Make settings writes fail (reads still succeed).
    pub fn set_reject_writes(&self, reject: bool) {
        self.state.lock().reject_writes = reject;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Observation (never fails, for assertions)
    // ─────────────────────────────────────────────────────────────────────

    /// Target frame rate currently configured.
    pub fn observed_frame_rate(&self) -> Option<f64> {
        self.state.lock().target_fps
    }

    /// Tile detail settings currently configured.
    pub fn observed_tile_detail(&self) -> TileDetailSettings {
        self.state.lock().detail
    }

    /// Camera state currently configured.
    pub fn observed_camera(&self) -> CameraSnapshot {
        self.state.lock().camera
    }

    /// Number of render requests received.
    pub fn render_requests(&self) -> u64 {
        self.state.lock().render_requests
    }

    /// Number of successful frame rate writes.
    pub fn frame_rate_writes(&self) -> u64 {
        self.state.lock().frame_rate_writes
    }

    /// Number of successful tile detail writes.
    pub fn detail_writes(&self) -> u64 {
        self.state.lock().detail_writes
    }

    fn check_available(state: &SimulatedState) -> Result<(), SceneError> {
        if state.disposed {
            Err(SceneError::Disposed)
        } else {
            Ok(())
        }
    }

    fn check_writable(state: &SimulatedState, setting: &'static str) -> Result<(), SceneError> {
        Self::check_available(state)?;
        if state.reject_writes {
            return Err(SceneError::Rejected {
                setting,
                reason: "writes disabled".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for SimulatedScene {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SceneHandle for SimulatedScene {
    fn target_frame_rate(&self) -> Result<Option<f64>, SceneError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        Ok(state.target_fps)
    }

    fn set_target_frame_rate(&self, fps: Option<f64>) -> Result<(), SceneError> {
        let mut state = self.state.lock();
        Self::check_writable(&state, "target_frame_rate")?;
        state.target_fps = fps;
        state.frame_rate_writes += 1;
        Ok(())
    }

    fn request_render(&self) -> Result<(), SceneError> {
        let mut state = self.state.lock();
        Self::check_available(&state)?;
        state.render_requests += 1;
        Ok(())
    }

    fn tiles_loading(&self) -> Result<u32, SceneError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        Ok(state.tiles_loading)
    }

    fn tile_detail(&self) -> Result<TileDetailSettings, SceneError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        Ok(state.detail)
    }

    fn set_tile_detail(&self, settings: TileDetailSettings) -> Result<(), SceneError> {
        let mut state = self.state.lock();
        Self::check_writable(&state, "tile_detail")?;
        state.detail = settings;
        state.detail_writes += 1;
        Ok(())
    }

    fn tile_cache_stats(&self) -> Result<Option<TileCacheStats>, SceneError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        Ok(state.cache_stats)
    }

    fn camera(&self) -> Result<CameraSnapshot, SceneError> {
        let state = self.state.lock();
        Self::check_available(&state)?;
        Ok(state.camera)
    }
}
