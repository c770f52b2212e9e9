use std::cell::RefCell;
use std::rc::Rc;

use super::backend::{CURRENT_POSITION, MediaBackend};
use super::locator::ResolvedLocator;
use super::types::{MediaState, MediaType, NativeTextureHandle, RendererKind};

/// Static properties of the simulated media and platform.
#[derive(Debug, Clone)]
pub struct SimOptions {
    pub length_secs: f32,
    pub width: i32,
    pub height: i32,
    /// Status polls after `load` before the player reports `Ready`.
    pub prepare_polls: u32,
    /// Whether the platform can decode into a texture at all.
    pub on_texture_supported: bool,
    /// Full-screen playback reports `PlayingFullscreen` until dismissed
    /// instead of returning only once the overlay is gone.
    pub in_process_fullscreen: bool,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            length_secs: 10.0,
            width: 1280,
            height: 720,
            prepare_polls: 3,
            on_texture_supported: true,
            in_process_fullscreen: false,
        }
    }
}

/// Call counters exposed for diagnostics and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimCounters {
    pub init_calls: u32,
    pub deinit_calls: u32,
    pub load_calls: u32,
    pub play_calls: u32,
    pub pause_calls: u32,
    pub seek_calls: u32,
    pub fullscreen_sessions: u32,
    pub frames_uploaded: u64,
    pub suspend_hints: u32,
    pub last_play_seek: Option<f32>,
    pub last_fullscreen_locator: Option<String>,
}

#[derive(Debug)]
struct SimState {
    options: SimOptions,
    inited: bool,
    renderer: Option<RendererKind>,
    locator: Option<ResolvedLocator>,
    loaded: bool,
    loaded_type: Option<MediaType>,
    state: MediaState,
    prepare_remaining: u32,
    play_when_prepared: bool,
    pending_seek: f32,
    position: f32,
    volume: f32,
    buffering: i32,
    texture: Option<NativeTextureHandle>,
    fail_init: bool,
    fail_load: bool,
    fail_prepare: bool,
    status_override: Option<i32>,
    counters: SimCounters,
}

impl SimState {
    fn new(options: SimOptions) -> Self {
        Self {
            options,
            inited: false,
            renderer: None,
            locator: None,
            loaded: false,
            loaded_type: None,
            state: MediaState::NotReady,
            prepare_remaining: 0,
            play_when_prepared: false,
            pending_seek: 0.0,
            position: 0.0,
            volume: 1.0,
            buffering: 0,
            texture: None,
            fail_init: false,
            fail_load: false,
            fail_prepare: false,
            status_override: None,
            counters: SimCounters::default(),
        }
    }

    fn on_texture(&self) -> bool {
        self.loaded_type.is_some_and(|t| t.allows_on_texture())
    }

    fn fullscreen(&self) -> bool {
        self.loaded_type.is_some_and(|t| t.allows_fullscreen())
    }

    fn ready(&self) -> bool {
        !matches!(self.state, MediaState::NotReady | MediaState::Error)
    }

    /// On-texture queries are only answered once prepared.
    fn queryable(&self) -> bool {
        self.on_texture() && self.ready()
    }

    fn advance_prepare(&mut self) {
        if !self.loaded || !self.on_texture() || self.state != MediaState::NotReady {
            return;
        }
        self.prepare_remaining = self.prepare_remaining.saturating_sub(1);
        if self.prepare_remaining > 0 {
            return;
        }
        if self.fail_prepare {
            self.state = MediaState::Error;
            return;
        }
        self.state = MediaState::Ready;
        self.position = self.pending_seek.clamp(0.0, self.options.length_secs);
        if self.play_when_prepared {
            self.state = MediaState::Playing;
        }
    }

    fn reported_status(&self) -> i32 {
        self.status_override.unwrap_or(self.state.as_i32())
    }

    fn unload(&mut self) {
        self.loaded = false;
        self.loaded_type = None;
        self.state = MediaState::NotReady;
        self.texture = None;
        self.prepare_remaining = 0;
    }
}

/// Backend half, handed to a playback object. Media time only moves on
/// [`SimHandle::advance`].
pub struct SimulatedBackend {
    inner: Rc<RefCell<SimState>>,
}

/// Host half: drives media time and inspects the player.
#[derive(Clone)]
pub struct SimHandle {
    inner: Rc<RefCell<SimState>>,
}

impl SimulatedBackend {
    pub fn new(options: SimOptions) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SimState::new(options))),
        }
    }

    pub fn handle(&self) -> SimHandle {
        SimHandle {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl SimHandle {
    /// Advance media time by `dt` seconds.
    pub fn advance(&self, dt: f32) {
        let mut s = self.inner.borrow_mut();
        if s.state != MediaState::Playing {
            return;
        }
        s.position += dt;
        if s.position >= s.options.length_secs {
            s.position = s.options.length_secs;
            s.state = MediaState::ReachedEnd;
            log::debug!("Simulated player reached end of stream");
        }
    }

    /// Dismiss an in-process full-screen session.
    pub fn finish_fullscreen(&self) {
        let mut s = self.inner.borrow_mut();
        if s.state == MediaState::PlayingFullscreen {
            s.state = MediaState::Ready;
        }
    }

    pub fn fail_init(&self) {
        self.inner.borrow_mut().fail_init = true;
    }

    pub fn fail_load(&self) {
        self.inner.borrow_mut().fail_load = true;
    }

    pub fn fail_prepare(&self) {
        self.inner.borrow_mut().fail_prepare = true;
    }

    /// Force the raw value returned by status polls.
    pub fn inject_status(&self, raw: Option<i32>) {
        self.inner.borrow_mut().status_override = raw;
    }

    pub fn set_buffering(&self, percent: i32) {
        self.inner.borrow_mut().buffering = percent.clamp(0, 100);
    }

    pub fn state(&self) -> MediaState {
        self.inner.borrow().state
    }

    pub fn position(&self) -> f32 {
        self.inner.borrow().position
    }

    pub fn volume(&self) -> f32 {
        self.inner.borrow().volume
    }

    pub fn is_inited(&self) -> bool {
        self.inner.borrow().inited
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.borrow().loaded
    }

    pub fn renderer(&self) -> Option<RendererKind> {
        self.inner.borrow().renderer
    }

    pub fn bound_texture(&self) -> Option<NativeTextureHandle> {
        self.inner.borrow().texture
    }

    pub fn counters(&self) -> SimCounters {
        self.inner.borrow().counters.clone()
    }
}

impl MediaBackend for SimulatedBackend {
    fn set_locator(&mut self, locator: &ResolvedLocator) {
        self.inner.borrow_mut().locator = Some(locator.clone());
    }

    fn init(&mut self, renderer: RendererKind) -> bool {
        let mut s = self.inner.borrow_mut();
        s.counters.init_calls += 1;
        if s.fail_init {
            return false;
        }
        s.inited = true;
        s.renderer = Some(renderer);
        true
    }

    fn deinit(&mut self) -> bool {
        let mut s = self.inner.borrow_mut();
        s.counters.deinit_calls += 1;
        s.unload();
        s.inited = false;
        true
    }

    fn load(
        &mut self,
        locator: &str,
        media_type: MediaType,
        preload_on_texture: bool,
        seek_secs: f32,
    ) -> bool {
        let mut s = self.inner.borrow_mut();
        s.counters.load_calls += 1;
        if !s.inited {
            return false;
        }
        if s.loaded {
            log::debug!("Simulated player already loaded, unload first");
            return false;
        }
        if s.fail_load || locator.is_empty() {
            s.state = MediaState::Error;
            return false;
        }

        let on_texture = media_type.allows_on_texture() && s.options.on_texture_supported;
        let fullscreen = media_type.allows_fullscreen();
        s.loaded = true;
        s.loaded_type = MediaType::from_capabilities(on_texture, fullscreen);
        s.pending_seek = seek_secs.max(0.0);
        s.play_when_prepared = preload_on_texture;

        if on_texture {
            s.state = MediaState::NotReady;
            s.prepare_remaining = s.options.prepare_polls;
            if s.prepare_remaining == 0 {
                s.prepare_remaining = 1;
            }
        } else if fullscreen {
            // Nothing to prepare for the overlay
            s.state = MediaState::Ready;
        }
        true
    }

    fn unload(&mut self) -> bool {
        self.inner.borrow_mut().unload();
        true
    }

    fn is_playable_on_texture(&self) -> bool {
        self.inner.borrow().on_texture()
    }

    fn is_playable_fullscreen(&self) -> bool {
        self.inner.borrow().fullscreen()
    }

    fn bind_texture(&mut self, handle: NativeTextureHandle) -> bool {
        let mut s = self.inner.borrow_mut();
        if !s.on_texture() {
            return false;
        }
        s.texture = Some(handle);
        true
    }

    fn status(&self) -> i32 {
        let mut s = self.inner.borrow_mut();
        s.advance_prepare();
        s.reported_status()
    }

    fn update_video_data(&mut self) -> i32 {
        let mut s = self.inner.borrow_mut();
        if !s.on_texture() {
            return MediaState::NotReady.as_i32();
        }
        s.advance_prepare();
        if s.state == MediaState::Playing && s.texture.is_some() {
            s.counters.frames_uploaded += 1;
        }
        s.reported_status()
    }

    fn width(&self) -> i32 {
        let s = self.inner.borrow();
        if s.queryable() { s.options.width } else { -1 }
    }

    fn height(&self) -> i32 {
        let s = self.inner.borrow();
        if s.queryable() { s.options.height } else { -1 }
    }

    fn length(&self) -> f32 {
        let s = self.inner.borrow();
        if s.queryable() { s.options.length_secs } else { -1.0 }
    }

    fn play(&mut self, fullscreen: bool, seek_secs: f32) -> bool {
        let mut s = self.inner.borrow_mut();
        s.counters.play_calls += 1;
        s.counters.last_play_seek = Some(seek_secs);

        if fullscreen {
            if !s.fullscreen() {
                log::debug!("Cannot play fullscreen, it was not requested on load");
                return false;
            }
            s.counters.fullscreen_sessions += 1;
            s.counters.last_fullscreen_locator = s.locator.as_ref().map(|l| l.fullscreen.clone());
            if s.options.in_process_fullscreen {
                s.state = MediaState::PlayingFullscreen;
            }
            return true;
        }

        if !s.queryable() {
            return false;
        }
        if seek_secs != CURRENT_POSITION {
            s.position = seek_secs.clamp(0.0, s.options.length_secs);
        } else if s.state == MediaState::ReachedEnd {
            s.position = 0.0;
        }
        s.state = MediaState::Playing;
        true
    }

    fn pause(&mut self) -> bool {
        let mut s = self.inner.borrow_mut();
        s.counters.pause_calls += 1;
        if !s.queryable() || s.state != MediaState::Playing {
            return false;
        }
        s.state = MediaState::Paused;
        true
    }

    fn stop(&mut self) -> bool {
        let mut s = self.inner.borrow_mut();
        if !s.queryable() {
            return false;
        }
        s.state = MediaState::Stopped;
        true
    }

    fn seek_to(&mut self, secs: f32) -> bool {
        let mut s = self.inner.borrow_mut();
        s.counters.seek_calls += 1;
        if !s.queryable() {
            return false;
        }
        s.position = secs.clamp(0.0, s.options.length_secs);
        true
    }

    fn current_position(&self) -> f32 {
        let s = self.inner.borrow();
        if s.queryable() { s.position } else { -1.0 }
    }

    fn set_volume(&mut self, volume: f32) -> bool {
        let mut s = self.inner.borrow_mut();
        if !s.queryable() {
            return false;
        }
        s.volume = volume.clamp(0.0, 1.0);
        true
    }

    fn buffering_percent(&self) -> i32 {
        self.inner.borrow().buffering
    }

    fn on_suspend_hint(&mut self) {
        let mut s = self.inner.borrow_mut();
        s.counters.suspend_hints += 1;
        if s.state == MediaState::Playing {
            s.state = MediaState::Paused;
        }
    }
}
