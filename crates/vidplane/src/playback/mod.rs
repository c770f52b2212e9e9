//! Playback state machine of one on-scene video.
//!
//! ```text
//!              init + load ok, status leaves NotReady
//!   NotReady ─────────────────────────────────────────▶ Ready
//!      │  ▲                                               │ play
//!      │  │ app suspend (any state but Error)             ▼
//!      │  └──────────────────────────────────────── Playing ◀──▶ Paused
//!      │                                                  │
//!      │ init/load/poll failure                           ├─▶ ReachedEnd
//!      ▼                                                  └─▶ Stopped
//!    Error (terminal)
//!
//!   Ready/Paused/Stopped/ReachedEnd ── play fullscreen ──▶ PlayingFullscreen ──▶ Ready
//! ```
//!
//! The cached state only changes from `tick`: commands are forwarded to the
//! backend and their effect is picked up by the next status poll.

pub mod config;
pub mod presentation;
pub mod task;
pub mod wait;

use std::rc::Rc;

use crate::error::PlaybackError;
use crate::gate::LoadGate;
use crate::media::backend::MediaBackend;
use crate::media::locator::{self, ResolvedLocator};
use crate::media::types::{MediaState, NativeTextureHandle, VideoTextureDesc};
use crate::registry::ObjectId;
use crate::settings::{Capabilities, Timings};
use config::PlaybackConfig;
use presentation::{
    Icon, IconTexture, MainChoice, MainTexture, PresentationSink, icon_scale, presentation_for,
    surface_aspect,
};
use task::{LoadRequest, LoadTask, TaskStep};

/// A state transition observed during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub id: ObjectId,
    pub from: MediaState,
    pub to: MediaState,
}

pub struct PlaybackObject {
    id: ObjectId,
    config: PlaybackConfig,
    locator: ResolvedLocator,
    backend: Box<dyn MediaBackend>,
    sink: Box<dyn PresentationSink>,
    gate: Rc<LoadGate>,
    caps: Capabilities,
    timings: Timings,

    state: MediaState,
    enabled: bool,
    activated: bool,
    app_paused: bool,
    /// Native side initialized, loaded and prepared.
    initialized: bool,
    task: Option<LoadTask>,
    playable_on_texture: bool,
    video_texture: Option<NativeTextureHandle>,
    /// Seconds to seek to on the next preparation or full-screen return.
    resume_offset: f32,
    last_error: Option<PlaybackError>,
    autoplay_done: bool,
    autoplay_pending: bool,
}

impl PlaybackObject {
    pub fn new(
        id: ObjectId,
        config: PlaybackConfig,
        backend: Box<dyn MediaBackend>,
        sink: Box<dyn PresentationSink>,
        gate: Rc<LoadGate>,
        caps: Capabilities,
        timings: Timings,
    ) -> Self {
        let locator = locator::resolve(&config.locator, caps.platform);
        Self {
            id,
            config,
            locator,
            backend,
            sink,
            gate,
            caps,
            timings,
            state: MediaState::NotReady,
            enabled: true,
            activated: false,
            app_paused: false,
            initialized: false,
            task: None,
            playable_on_texture: false,
            video_texture: None,
            resume_offset: 0.0,
            last_error: None,
            autoplay_done: false,
            autoplay_pending: false,
        }
    }

    /// Validate configuration and hand the locator to the backend.
    ///
    /// Loading starts on the next tick. A configuration error puts the
    /// object into `Error` without touching the native side.
    pub fn activate(&mut self) -> Result<(), PlaybackError> {
        if self.activated {
            return Ok(());
        }
        if let Err(e) = self.config.validate() {
            self.fail(e.clone());
            return Err(e);
        }
        self.backend.set_locator(&self.locator);
        self.activated = true;
        self.set_icon(Some(Icon::Busy));
        log::info!(
            "{} activated with '{}' ({:?})",
            self.id,
            self.locator.on_texture,
            self.config.media_type
        );
        Ok(())
    }

    pub fn tick(&mut self, dt: f32) -> Option<StateChange> {
        if !self.activated || !self.enabled || self.app_paused {
            return None;
        }
        if self.initialized {
            return self.poll();
        }

        if self.task.is_none() {
            self.task = Some(LoadTask::new(self.load_request(), Rc::clone(&self.gate)));
        }
        let task = self.task.as_mut()?;
        match task.step(self.backend.as_mut(), dt) {
            TaskStep::Pending => None,
            TaskStep::Failed(e) => {
                self.task = None;
                self.fail(e)
            }
            TaskStep::Prepared(reported) => {
                self.task = None;
                self.initialized = true;
                self.finish_prepare(reported)
            }
        }
    }

    /// Application pause (`true`) or resume (`false`).
    pub fn suspend(&mut self, paused: bool) -> Option<StateChange> {
        if !paused {
            if self.app_paused {
                self.app_paused = false;
                log::info!("{} resuming", self.id);
            }
            return None;
        }
        if self.app_paused {
            return None;
        }
        self.app_paused = true;
        if !self.activated {
            return None;
        }

        if self.initialized {
            self.backend.on_suspend_hint();
            let position = self.backend.current_position();
            if position >= 0.0 {
                self.resume_offset = position;
            }
        }
        if self.task.take().is_some() {
            log::debug!("{} dropped its in-flight load", self.id);
        }
        self.release_native();
        log::info!(
            "{} suspended, will resume at {:.2}s",
            self.id,
            self.resume_offset
        );

        if self.state == MediaState::Error {
            return None;
        }
        self.transition(MediaState::NotReady)
    }

    /// Release everything. The object cannot be used afterwards.
    pub fn teardown(&mut self) {
        self.task = None;
        if self.activated {
            self.release_native();
        }
        self.activated = false;
        self.enabled = false;
        log::info!("{} torn down", self.id);
    }

    // Commands

    /// Start or continue on-texture playback. `seek_secs` of
    /// [`crate::media::CURRENT_POSITION`] keeps the current position.
    pub fn play_on_texture(&mut self, seek_secs: f32) -> bool {
        if !self.accepts_commands() || !self.playable_on_texture {
            return false;
        }
        let ok = self.backend.play(false, seek_secs);
        if !ok {
            log::warn!("{} refused to play on texture", self.id);
        }
        ok
    }

    /// Hand off to the full-screen player. May block until it is dismissed.
    pub fn play_fullscreen(&mut self) -> bool {
        if !self.accepts_commands() || !self.backend.is_playable_fullscreen() {
            return false;
        }
        log::info!("{} playing full-screen '{}'", self.id, self.locator.fullscreen);
        let ok = self.backend.play(true, 0.0);
        if !ok {
            log::warn!("{} refused to play full-screen", self.id);
        }
        ok
    }

    pub fn pause(&mut self) -> bool {
        self.accepts_commands() && self.backend.pause()
    }

    pub fn stop(&mut self) -> bool {
        self.accepts_commands() && self.backend.stop()
    }

    pub fn seek_to(&mut self, secs: f32) -> bool {
        self.accepts_commands() && self.backend.seek_to(secs)
    }

    pub fn set_volume(&mut self, volume: f32) -> bool {
        self.accepts_commands() && self.backend.set_volume(volume)
    }

    pub fn show_busy_icon(&mut self) {
        if self.state != MediaState::Error {
            self.set_icon(Some(Icon::Busy));
        }
    }

    pub fn show_play_icon(&mut self) {
        if self.state != MediaState::Error {
            self.set_icon(Some(Icon::Play));
        }
    }

    // Queries

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn locator(&self) -> &ResolvedLocator {
        &self.locator
    }

    /// State as of the last tick.
    pub fn state(&self) -> MediaState {
        self.state
    }

    /// Live backend status, falling back to the cached state before
    /// preparation.
    pub fn status(&self) -> MediaState {
        if !self.initialized {
            return self.state;
        }
        MediaState::try_from(self.backend.status()).unwrap_or(MediaState::Error)
    }

    pub fn supports_on_texture(&self) -> bool {
        if self.initialized {
            self.playable_on_texture
        } else {
            self.config.media_type.allows_on_texture()
        }
    }

    pub fn supports_fullscreen(&self) -> bool {
        if self.initialized {
            self.backend.is_playable_fullscreen()
        } else {
            self.config.media_type.allows_fullscreen()
        }
    }

    pub fn current_position(&self) -> f32 {
        if self.initialized {
            self.backend.current_position()
        } else {
            -1.0
        }
    }

    pub fn length(&self) -> f32 {
        if self.initialized {
            self.backend.length()
        } else {
            -1.0
        }
    }

    pub fn buffering_percent(&self) -> i32 {
        self.backend.buffering_percent()
    }

    pub fn resume_offset(&self) -> f32 {
        self.resume_offset
    }

    pub fn last_error(&self) -> Option<&PlaybackError> {
        self.last_error.as_ref()
    }

    /// False once the object hit `Error` or was torn down.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_suspended(&self) -> bool {
        self.app_paused
    }

    pub fn is_loading(&self) -> bool {
        self.task.is_some()
    }

    /// One-shot: the object became ready and wants to auto-play.
    pub fn take_autoplay_request(&mut self) -> bool {
        std::mem::take(&mut self.autoplay_pending)
    }

    // Internals

    fn accepts_commands(&self) -> bool {
        if !self.enabled {
            log::warn!("{} is disabled, ignoring command", self.id);
            return false;
        }
        self.initialized && !self.app_paused
    }

    fn load_request(&self) -> LoadRequest {
        LoadRequest {
            id: self.id,
            renderer: self.caps.renderer,
            locator: self.locator.on_texture.clone(),
            media_type: self.config.media_type,
            gate_poll_secs: self.timings.gate_poll_secs,
            settle_secs: self.timings.post_load_settle(&self.caps),
        }
    }

    fn finish_prepare(&mut self, reported: MediaState) -> Option<StateChange> {
        self.playable_on_texture = self.backend.is_playable_on_texture();
        if self.playable_on_texture {
            let (width, height) = (self.backend.width(), self.backend.height());
            let desc = VideoTextureDesc::for_renderer(self.caps.renderer, width, height);
            let handle = self.sink.create_video_texture(desc);
            if !self.backend.bind_texture(handle) {
                log::warn!("{} could not bind frame texture", self.id);
            }
            self.video_texture = Some(handle);

            if let Some(aspect) = surface_aspect(width, height) {
                self.sink.set_surface_aspect(aspect);
            }
            let (x, y) = icon_scale(width, height);
            self.sink.set_icon_scale(x, y);

            if self.resume_offset > 0.0 {
                self.backend.seek_to(self.resume_offset);
            }
            log::info!(
                "{} prepared {}x{} ({:.1}s)",
                self.id,
                width,
                height,
                self.backend.length()
            );
        } else {
            log::info!("{} prepared for full-screen playback only", self.id);
        }
        self.transition(reported)
    }

    fn poll(&mut self) -> Option<StateChange> {
        let raw = if self.playable_on_texture {
            self.backend.update_video_data()
        } else {
            self.backend.status()
        };
        let polled = match MediaState::try_from(raw) {
            Ok(state) => state,
            Err(e) => return self.fail(e),
        };
        if polled.is_playing() {
            self.sink.frame_updated();
        }
        if polled == MediaState::Error {
            return self.fail(PlaybackError::LoadFailure {
                locator: self.locator.on_texture.clone(),
                media_type: self.config.media_type,
            });
        }
        self.transition(polled)
    }

    fn transition(&mut self, to: MediaState) -> Option<StateChange> {
        let from = self.state;
        if from == to {
            return None;
        }

        if to == MediaState::PlayingFullscreen {
            let position = self.backend.current_position();
            if position >= 0.0 {
                self.resume_offset = position;
            }
        }
        if from == MediaState::PlayingFullscreen
            && self.playable_on_texture
            && self.resume_offset > 0.0
        {
            self.backend.seek_to(self.resume_offset);
        }

        self.state = to;
        self.apply_presentation(to);
        if to == MediaState::Ready && self.config.auto_play && !self.autoplay_done {
            self.autoplay_done = true;
            self.autoplay_pending = true;
        }

        log::debug!(
            "{}: {} -> {}",
            self.id,
            from.display_name(),
            to.display_name()
        );
        Some(StateChange {
            id: self.id,
            from,
            to,
        })
    }

    fn fail(&mut self, error: PlaybackError) -> Option<StateChange> {
        log::error!("{}: {error}", self.id);
        self.last_error = Some(error);
        self.enabled = false;
        self.task = None;
        self.transition(MediaState::Error)
    }

    fn apply_presentation(&mut self, state: MediaState) {
        let p = presentation_for(state, self.config.keyframe.is_some());
        match p.main {
            MainChoice::Video => {
                if let Some(handle) = self.video_texture {
                    self.sink.set_main_texture(MainTexture::Video(handle));
                }
            }
            MainChoice::Keyframe => {
                if let Some(keyframe) = &self.config.keyframe {
                    self.sink.set_main_texture(MainTexture::Keyframe {
                        texture: keyframe,
                        flip_vertical: true,
                    });
                }
            }
            MainChoice::Unchanged => {}
        }
        self.set_icon(p.icon);
    }

    fn set_icon(&mut self, icon: Option<Icon>) {
        let icon = icon.map(|kind| IconTexture {
            kind,
            texture: self.config.icons.texture(kind),
        });
        self.sink.set_icon(icon);
    }

    fn release_native(&mut self) {
        self.backend.deinit();
        if self.video_texture.take().is_some() {
            self.sink.release_video_texture();
        }
        self.initialized = false;
        self.playable_on_texture = false;
    }
}
