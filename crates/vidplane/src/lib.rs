//! On-surface video playback for augmented scenes.
//!
//! Each video surface is a [`playback::PlaybackObject`] driving one native
//! player through the [`media::MediaBackend`] boundary. A [`scene::Scene`]
//! owns all of them, serializes their native loads through one
//! [`gate::LoadGate`] and routes taps through the
//! [`dispatch::DispatchController`], which keeps at most one video playing
//! on-texture.

pub mod dispatch;
pub mod error;
pub mod gate;
pub mod media;
pub mod playback;
pub mod registry;
pub mod scene;
pub mod settings;

#[cfg(test)]
mod testing;

pub use error::PlaybackError;
pub use registry::ObjectId;
pub use scene::Scene;
