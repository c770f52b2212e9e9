pub mod fullscreen;
pub mod gesture;
pub mod pick;

use glam::Vec2;

use crate::media::CURRENT_POSITION;
use crate::media::types::MediaState;
use crate::registry::{ObjectId, Registry};
use fullscreen::{DisplayHost, FullscreenPlan, FullscreenRequest, RequestStep};
use gesture::{Gesture, GestureConfig, PointerEvent, TapDetector};
use pick::HitTester;

/// What a tap resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapAction {
    /// Nothing was hit.
    Missed,
    /// Hit an object that does not take input right now.
    Ignored(ObjectId),
    PlayOnTexture(ObjectId),
    Paused(ObjectId),
    Fullscreen(ObjectId),
}

pub struct DispatchController {
    detector: TapDetector,
    plan: FullscreenPlan,
    requests: Vec<FullscreenRequest>,
    fullscreen_preferred: bool,
    went_to_fullscreen: bool,
}

impl DispatchController {
    pub fn new(gestures: GestureConfig, plan: FullscreenPlan) -> Self {
        Self {
            detector: TapDetector::new(gestures),
            plan,
            requests: Vec::new(),
            fullscreen_preferred: false,
            went_to_fullscreen: false,
        }
    }

    pub fn is_fullscreen_preferred(&self) -> bool {
        self.fullscreen_preferred
    }

    /// Feed one pointer event. Double taps resolve immediately.
    pub fn on_pointer(
        &mut self,
        event: PointerEvent,
        picker: &dyn HitTester,
        registry: &mut Registry,
    ) -> Option<TapAction> {
        let gesture = self.detector.on_pointer(event)?;
        Some(self.handle_gesture(gesture, picker, registry))
    }

    /// Per-frame work: flush a buffered single tap and advance the pending
    /// full-screen requests.
    pub fn update(
        &mut self,
        dt: f32,
        picker: &dyn HitTester,
        registry: &mut Registry,
        display: &mut dyn DisplayHost,
    ) -> Option<TapAction> {
        let action = self
            .detector
            .update(dt)
            .map(|gesture| self.handle_gesture(gesture, picker, registry));

        self.requests.retain_mut(|request| {
            match request.step(registry, display, dt) {
                RequestStep::Pending => true,
                RequestStep::Done => {
                    log::debug!("Full-screen request for {} finished", request.target());
                    false
                }
                RequestStep::Dropped => false,
            }
        });
        action
    }

    fn handle_gesture(
        &mut self,
        gesture: Gesture,
        picker: &dyn HitTester,
        registry: &mut Registry,
    ) -> TapAction {
        let (point, double) = match gesture {
            Gesture::SingleTap(p) => (p, false),
            Gesture::DoubleTap(p) => (p, true),
        };
        let Some(id) = Self::pick_video(point, picker, registry) else {
            return TapAction::Missed;
        };
        if double {
            self.double_tap(id, registry)
        } else {
            self.single_tap(id, registry)
        }
    }

    /// Earliest registered live object under `point`.
    fn pick_video(point: Vec2, picker: &dyn HitTester, registry: &Registry) -> Option<ObjectId> {
        picker
            .pick(point)
            .into_iter()
            .filter_map(|id| Some((registry.rank(id)?, id)))
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, id)| id)
    }

    pub fn single_tap(&mut self, id: ObjectId, registry: &mut Registry) -> TapAction {
        let Some(object) = registry.get(id) else {
            return TapAction::Missed;
        };
        if !object.is_enabled() {
            return TapAction::Ignored(id);
        }
        if self.fullscreen_preferred && object.supports_fullscreen() {
            return self.double_tap(id, registry);
        }

        if object.supports_on_texture() {
            if object.status() == MediaState::Playing {
                return if registry.get_mut(id).is_some_and(|o| o.pause()) {
                    TapAction::Paused(id)
                } else {
                    TapAction::Ignored(id)
                };
            }
            return self.play_on_texture(id, registry);
        }

        if !object.supports_fullscreen() {
            return TapAction::Ignored(id);
        }
        if let Some(object) = registry.get_mut(id) {
            object.show_busy_icon();
        }
        self.request_fullscreen(id);
        TapAction::Fullscreen(id)
    }

    pub fn double_tap(&mut self, id: ObjectId, registry: &mut Registry) -> TapAction {
        let Some(object) = registry.get_mut(id) else {
            return TapAction::Missed;
        };
        if !object.is_enabled() || !object.supports_fullscreen() {
            return TapAction::Ignored(id);
        }
        if object.supports_on_texture() {
            object.pause();
            object.seek_to(0.0);
        }
        object.show_busy_icon();
        self.request_fullscreen(id);
        TapAction::Fullscreen(id)
    }

    /// Start on-texture playback of `id`, pausing every other playing
    /// object first. Restarts from the beginning after end of stream.
    pub fn play_on_texture(&mut self, id: ObjectId, registry: &mut Registry) -> TapAction {
        let Some(object) = registry.get(id) else {
            return TapAction::Missed;
        };
        if !object.is_enabled() || !object.supports_on_texture() {
            return TapAction::Ignored(id);
        }
        let status = object.status();
        if !status.can_start_playback() {
            return TapAction::Ignored(id);
        }

        Self::pause_others(id, registry);
        let seek = if status == MediaState::ReachedEnd {
            0.0
        } else {
            CURRENT_POSITION
        };
        if registry
            .get_mut(id)
            .is_some_and(|o| o.play_on_texture(seek))
        {
            TapAction::PlayOnTexture(id)
        } else {
            TapAction::Ignored(id)
        }
    }

    /// Menu toggle. Enabling it also sends the currently playing object to
    /// full-screen.
    pub fn toggle_fullscreen_mode(
        &mut self,
        enabled: bool,
        registry: &mut Registry,
    ) -> Option<TapAction> {
        self.fullscreen_preferred = enabled;
        log::info!(
            "Full-screen preference {}",
            if enabled { "enabled" } else { "disabled" }
        );
        if !enabled {
            return None;
        }
        let playing = registry
            .iter()
            .find(|o| o.state() == MediaState::Playing)
            .map(|o| o.id())?;
        Some(self.double_tap(playing, registry))
    }

    /// One-shot flag: a full-screen request was issued since the last call.
    pub fn take_went_to_fullscreen(&mut self) -> bool {
        std::mem::take(&mut self.went_to_fullscreen)
    }

    pub fn pending_fullscreen(&self) -> usize {
        self.requests.len()
    }

    pub fn is_fullscreen_pending(&self, id: ObjectId) -> bool {
        self.requests.iter().any(|r| r.target() == id)
    }

    fn request_fullscreen(&mut self, id: ObjectId) {
        if self.is_fullscreen_pending(id) {
            log::debug!("Full-screen request for {id} already queued");
            return;
        }
        log::info!("Queued full-screen playback for {id}");
        self.requests
            .push(FullscreenRequest::new(id, self.plan.clone()));
        self.went_to_fullscreen = true;
    }

    fn pause_others(except: ObjectId, registry: &mut Registry) {
        for object in registry.iter_mut() {
            if object.id() == except {
                continue;
            }
            if object.state() == MediaState::Playing || object.status() == MediaState::Playing {
                log::debug!("Pausing {} for {except}", object.id());
                object.pause();
            }
        }
    }
}
