//! ScenePacer - adaptive resource control for tiled 3D globe scenes
//!
//! This library keeps an interactively navigable tile-streaming scene cheap
//! to run when nobody is looking at anything new, and keeps its location
//! labels legible.
//!
//! # Components
//!
//! - [`camera`]: camera snapshots and the shared [`camera::MovementDetector`]
//!   that filters floating-point noise out of camera-changed notifications
//! - [`declutter`]: places labels on leader lines so they do not overlap
//! - [`frame_rate`]: lowers the renderer's target frame rate while idle
//! - [`tile_freeze`]: suspends tile detail requests while the camera is still
//! - [`scene`]: the [`scene::SceneHandle`] trait every controller talks to
//!
//! ```text
//! camera events ──► MovementDetector ──┬──► FrameRateScheduler ──► target frame rate
//!                                      └──► TileFreezeController ─► tile detail tolerance
//! ```
//!
//! The two controllers never reference each other; they may legitimately be
//! in different states (throttled but unfrozen, or the reverse).

pub mod camera;
pub mod config;
pub mod declutter;
pub mod frame_rate;
pub mod geometry;
pub mod logging;
pub mod runtime;
pub mod scene;
pub mod tile_freeze;
