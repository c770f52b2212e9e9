use super::locator::ResolvedLocator;
use super::types::{MediaType, NativeTextureHandle, RendererKind};

/// Seek argument for `play` meaning "continue from the current position".
pub const CURRENT_POSITION: f32 = -1.0;

/// Synchronous calls into one native player. Readiness after `load` is
/// only observable through `status` or `update_video_data`.
pub trait MediaBackend {
    /// Store the locators used by `load` and by full-screen playback.
    /// Called once at activation, before `init`.
    fn set_locator(&mut self, locator: &ResolvedLocator);

    fn init(&mut self, renderer: RendererKind) -> bool;

    /// Release every native resource. Safe to call on an uninitialized player.
    fn deinit(&mut self) -> bool;

    fn load(
        &mut self,
        locator: &str,
        media_type: MediaType,
        preload_on_texture: bool,
        seek_secs: f32,
    ) -> bool;

    /// A new `load` is required afterwards.
    fn unload(&mut self) -> bool;

    fn is_playable_on_texture(&self) -> bool;

    fn is_playable_fullscreen(&self) -> bool;

    /// Hand over the texture decoded frames are copied into.
    fn bind_texture(&mut self, handle: NativeTextureHandle) -> bool;

    /// Raw `MediaState` ordinal.
    fn status(&self) -> i32;

    /// Copy the latest decoded frame into the bound texture (only while
    /// playing) and return the raw status ordinal.
    fn update_video_data(&mut self) -> i32;

    /// Video frame width, `-1` while unknown.
    fn width(&self) -> i32;

    /// Video frame height, `-1` while unknown.
    fn height(&self) -> i32;

    /// Duration in seconds, `-1.0` while unknown.
    fn length(&self) -> f32;

    /// Full-screen playback may block until the overlay is dismissed.
    fn play(&mut self, fullscreen: bool, seek_secs: f32) -> bool;

    fn pause(&mut self) -> bool;

    fn stop(&mut self) -> bool;

    fn seek_to(&mut self, secs: f32) -> bool;

    /// Playback position in seconds, `-1.0` while unknown.
    fn current_position(&self) -> f32;

    fn set_volume(&mut self, volume: f32) -> bool;

    /// Network buffering progress, 0-100.
    fn buffering_percent(&self) -> i32;

    /// The application is about to be suspended.
    fn on_suspend_hint(&mut self);
}
