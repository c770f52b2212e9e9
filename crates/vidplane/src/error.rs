use thiserror::Error;

use crate::media::types::{MediaType, RendererKind};

/// Failures a playback object can run into.
///
/// None of these escape the object as a panic or propagate to the dispatch
/// controller. They put the object into `MediaState::Error` and are kept as
/// `last_error()` for diagnostics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// The native backend could not allocate its resources.
    #[error("native player could not be initialized for renderer {renderer:?}")]
    InitializationFailure { renderer: RendererKind },
    /// Invalid locator, unsupported codec or unreachable remote source.
    #[error("could not load '{locator}' for media type {media_type:?}")]
    LoadFailure {
        locator: String,
        media_type: MediaType,
    },
    /// The status query returned a value outside the known ordinals.
    #[error("backend reported unknown status value {0}")]
    TransientPollError(i32),
    /// Missing required configuration, detected before any native call.
    #[error("invalid configuration: {0}")]
    ConfigurationError(String),
}
