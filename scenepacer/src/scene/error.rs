//! Renderer access errors.

use thiserror::Error;

/// Errors returned by a [`SceneHandle`](super::SceneHandle).
///
/// None of these are fatal to the host. Controllers treat every variant as
/// "do nothing this tick" and resume once the renderer answers again.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SceneError {
    /// The renderer has been torn down.
    #[error("Renderer has been disposed")]
    Disposed,

    /// The renderer exists but cannot answer right now.
    #[error("Renderer unavailable: {0}")]
    Unavailable(String),

    /// The renderer refused a settings write.
    #[error("Renderer rejected {setting}: {reason}")]
    Rejected {
        setting: &'static str,
        reason: String,
    },
}

impl SceneError {
    /// Whether this error means the renderer is gone rather than busy.
    pub fn is_disposed(&self) -> bool {
        matches!(self, SceneError::Disposed)
    }
}
