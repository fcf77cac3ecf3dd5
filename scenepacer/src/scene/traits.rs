//! Renderer interface consumed by the controllers.

use std::fmt;
use std::sync::Arc;

use super::error::SceneError;
use crate::camera::CameraSnapshot;

/// Level-of-detail knobs on the streamed tile source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileDetailSettings {
    /// Screen-space error tolerance in pixels. Higher values request less
    /// detail; a very large value stops new detail requests entirely.
    pub maximum_screen_space_error: f64,
    /// Whether the renderer progressively refines tiles toward full detail.
    pub progressive_refinement: bool,
}

impl Default for TileDetailSettings {
    fn default() -> Self {
        Self {
            maximum_screen_space_error: 16.0,
            progressive_refinement: true,
        }
    }
}

impl fmt::Display for TileDetailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sse={} refine={}",
            self.maximum_screen_space_error, self.progressive_refinement
        )
    }
}

/// Tile cache statistics reported by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileCacheStats {
    /// Tiles currently held in the renderer's cache.
    pub tiles_cached: usize,
    /// Memory used by cached tiles (bytes).
    pub memory_bytes: u64,
}

/// The renderer as seen by the controllers.
///
/// Every call can fail: the renderer may be torn down between ticks, or not
/// yet ready. Implementations must not block; all writes are in-memory
/// settings that take effect on the next rendered frame.
///
/// # Implementors
///
/// - [`SimulatedScene`](super::SimulatedScene) - in-memory renderer for tests and the CLI
/// - Host adapters wrapping a real tile-streaming renderer
pub trait SceneHandle: Send + Sync {
    /// Current target frame rate. `None` means uncapped.
    fn target_frame_rate(&self) -> Result<Option<f64>, SceneError>;

    /// Set the target frame rate. `None` removes the cap.
    fn set_target_frame_rate(&self, fps: Option<f64>) -> Result<(), SceneError>;

    /// Request one render so a settings change is visible immediately.
    fn request_render(&self) -> Result<(), SceneError>;

    /// Number of tiles currently being fetched or processed.
    fn tiles_loading(&self) -> Result<u32, SceneError>;

    /// Current tile detail settings.
    fn tile_detail(&self) -> Result<TileDetailSettings, SceneError>;

    /// Replace the tile detail settings.
    fn set_tile_detail(&self, settings: TileDetailSettings) -> Result<(), SceneError>;

    /// Tile cache statistics, or `None` if the renderer has none yet.
    fn tile_cache_stats(&self) -> Result<Option<TileCacheStats>, SceneError>;

    /// Current camera state.
    fn camera(&self) -> Result<CameraSnapshot, SceneError>;
}

/// Shared renderer handle as held by the controllers.
pub type SharedScene = Arc<dyn SceneHandle>;
