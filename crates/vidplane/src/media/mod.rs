pub mod backend;
pub mod locator;
pub mod simulated;
pub mod types;

pub use backend::{CURRENT_POSITION, MediaBackend};
pub use locator::ResolvedLocator;
pub use types::{MediaState, MediaType, NativeTextureHandle, RendererKind, VideoTextureDesc};
