//! Renderer seam.
//!
//! The controllers never reach a renderer through globals. Each one is handed
//! an `Arc<dyn SceneHandle>` at construction and talks to the renderer only
//! through that trait. This keeps the tile-streaming renderer a black box and
//! lets tests substitute [`SimulatedScene`].

mod error;
mod simulated;
mod traits;

pub use error::SceneError;
pub use simulated::SimulatedScene;
pub use traits::{SceneHandle, SharedScene, TileCacheStats, TileDetailSettings};
