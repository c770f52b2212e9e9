use std::rc::Rc;

use crossbeam_channel::Receiver;

use crate::dispatch::fullscreen::{DisplayHost, FullscreenPlan};
use crate::dispatch::gesture::PointerEvent;
use crate::dispatch::pick::HitTester;
use crate::dispatch::{DispatchController, TapAction};
use crate::gate::LoadGate;
use crate::media::backend::MediaBackend;
use crate::media::types::MediaState;
use crate::playback::config::PlaybackConfig;
use crate::playback::presentation::PresentationSink;
use crate::playback::{PlaybackObject, StateChange};
use crate::registry::{ObjectId, Registry};
use crate::settings::{Capabilities, SceneSettings, Timings};

/// Owns the registry, load gate and dispatch controller. Each `tick`
/// handles input first, then full-screen requests, then polls objects in
/// registration order.
pub struct Scene {
    registry: Registry,
    gate: Rc<LoadGate>,
    controller: DispatchController,
    picker: Box<dyn HitTester>,
    display: Box<dyn DisplayHost>,
    caps: Capabilities,
    timings: Timings,
    pointer_rx: Option<Receiver<PointerEvent>>,
    pending_pointer: Vec<PointerEvent>,
    suspended: bool,
    frame: u64,
}

impl Scene {
    pub fn new(
        settings: &SceneSettings,
        picker: Box<dyn HitTester>,
        display: Box<dyn DisplayHost>,
    ) -> Self {
        let caps = settings.capabilities();
        let timings = settings.timings.clone();
        let mut controller = DispatchController::new(
            settings.gestures.clone(),
            FullscreenPlan::new(&caps, &timings),
        );
        let mut registry = Registry::new();
        if settings.fullscreen_preferred {
            controller.toggle_fullscreen_mode(true, &mut registry);
        }
        log::info!(
            "Scene for {} ({:?})",
            caps.platform.display_name(),
            caps.renderer
        );
        Self {
            registry,
            gate: LoadGate::new(),
            controller,
            picker,
            display,
            caps,
            timings,
            pointer_rx: None,
            pending_pointer: Vec::new(),
            suspended: false,
            frame: 0,
        }
    }

    /// Register and activate a playback object. Loading starts next tick.
    ///
    /// An invalid configuration is logged and leaves the object registered
    /// in `Error`.
    pub fn spawn(
        &mut self,
        config: PlaybackConfig,
        backend: Box<dyn MediaBackend>,
        sink: Box<dyn PresentationSink>,
    ) -> ObjectId {
        let id = self.registry.allocate_id();
        let mut object = PlaybackObject::new(
            id,
            config,
            backend,
            sink,
            Rc::clone(&self.gate),
            self.caps.clone(),
            self.timings.clone(),
        );
        if let Err(e) = object.activate() {
            log::error!("{id} not started: {e}");
        }
        if self.suspended {
            object.suspend(true);
        }
        self.registry.register(object);
        id
    }

    /// Tear down and remove an object. Pending full-screen requests for it
    /// are dropped on the next tick.
    pub fn despawn(&mut self, id: ObjectId) -> bool {
        let Some(mut object) = self.registry.deregister(id) else {
            return false;
        };
        let was_fullscreen = object.state() == MediaState::PlayingFullscreen;
        object.teardown();
        if was_fullscreen && self.caps.supports_in_process_fullscreen {
            self.display.set_tracking_enabled(true);
        }
        true
    }

    /// Pointer events sent on `rx` are drained at the start of every tick.
    pub fn attach_pointer_channel(&mut self, rx: Receiver<PointerEvent>) {
        self.pointer_rx = Some(rx);
    }

    pub fn push_pointer(&mut self, event: PointerEvent) {
        self.pending_pointer.push(event);
    }

    /// Application pause (`true`) or resume (`false`).
    pub fn suspend(&mut self, paused: bool) -> Vec<StateChange> {
        if self.suspended == paused {
            return Vec::new();
        }
        self.suspended = paused;
        log::info!("Scene {}", if paused { "suspended" } else { "resumed" });
        let changes: Vec<StateChange> = self
            .registry
            .iter_mut()
            .filter_map(|object| object.suspend(paused))
            .collect();
        self.update_tracking(&changes);
        changes
    }

    pub fn tick(&mut self, dt: f32) -> Vec<StateChange> {
        self.frame += 1;
        if self.suspended {
            return Vec::new();
        }

        if let Some(rx) = &self.pointer_rx {
            self.pending_pointer.extend(rx.try_iter());
        }
        for event in std::mem::take(&mut self.pending_pointer) {
            if let Some(action) =
                self.controller
                    .on_pointer(event, self.picker.as_ref(), &mut self.registry)
            {
                log::debug!("Frame {}: {action:?}", self.frame);
            }
        }
        if let Some(action) = self.controller.update(
            dt,
            self.picker.as_ref(),
            &mut self.registry,
            self.display.as_mut(),
        ) {
            log::debug!("Frame {}: {action:?}", self.frame);
        }

        let changes: Vec<StateChange> = self
            .registry
            .iter_mut()
            .filter_map(|object| object.tick(dt))
            .collect();

        self.update_tracking(&changes);

        let autoplay: Vec<ObjectId> = self
            .registry
            .iter_mut()
            .filter_map(|object| object.take_autoplay_request().then_some(object.id()))
            .collect();
        for id in autoplay {
            log::info!("Auto-playing {id}");
            self.controller.play_on_texture(id, &mut self.registry);
        }

        changes
    }

    /// Tracking is off while an object plays in-process full-screen.
    fn update_tracking(&mut self, changes: &[StateChange]) {
        if !self.caps.supports_in_process_fullscreen {
            return;
        }
        for change in changes {
            if change.to == MediaState::PlayingFullscreen {
                self.display.set_tracking_enabled(false);
            } else if change.from == MediaState::PlayingFullscreen {
                self.display.set_tracking_enabled(true);
            }
        }
    }

    // Commands routed through the controller

    pub fn single_tap(&mut self, id: ObjectId) -> TapAction {
        self.controller.single_tap(id, &mut self.registry)
    }

    pub fn double_tap(&mut self, id: ObjectId) -> TapAction {
        self.controller.double_tap(id, &mut self.registry)
    }

    pub fn play_on_texture(&mut self, id: ObjectId) -> TapAction {
        self.controller.play_on_texture(id, &mut self.registry)
    }

    pub fn toggle_fullscreen_mode(&mut self, enabled: bool) -> Option<TapAction> {
        self.controller
            .toggle_fullscreen_mode(enabled, &mut self.registry)
    }

    pub fn take_went_to_fullscreen(&mut self) -> bool {
        self.controller.take_went_to_fullscreen()
    }

    // Queries

    pub fn object(&self, id: ObjectId) -> Option<&PlaybackObject> {
        self.registry.get(id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut PlaybackObject> {
        self.registry.get_mut(id)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn controller(&self) -> &DispatchController {
        &self.controller
    }

    pub fn gate(&self) -> &Rc<LoadGate> {
        &self.gate
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Objects whose cached state is `Playing`.
    pub fn playing(&self) -> Vec<ObjectId> {
        self.registry
            .iter()
            .filter(|o| o.state() == MediaState::Playing)
            .map(PlaybackObject::id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    use crate::dispatch::fullscreen::Orientation;
    use crate::media::simulated::{SimHandle, SimOptions, SimulatedBackend};
    use crate::media::types::{MediaType, RendererKind};
    use crate::playback::presentation::Icon;
    use crate::settings::Platform;
    use crate::testing::{
        DisplayEvent, DisplayLog, FixedPicker, SinkLog, recording_display, recording_sink,
    };

    const DT: f32 = 0.1;

    struct Harness {
        scene: Scene,
        picker: FixedPicker,
        display: DisplayLog,
    }

    struct Spawned {
        id: ObjectId,
        sim: SimHandle,
        sink: SinkLog,
    }

    fn harness(platform: Platform) -> Harness {
        let settings = SceneSettings {
            platform,
            renderer: RendererKind::Metal,
            ..SceneSettings::default()
        };
        let picker = FixedPicker::default();
        let (display_box, display) = recording_display();
        let scene = Scene::new(&settings, Box::new(picker.clone()), display_box);
        Harness {
            scene,
            picker,
            display,
        }
    }

    impl Harness {
        fn spawn_with(&mut self, config: PlaybackConfig, options: SimOptions) -> Spawned {
            let backend = SimulatedBackend::new(options);
            let sim = backend.handle();
            let (sink_box, sink) = recording_sink();
            let id = self.scene.spawn(config, Box::new(backend), sink_box);
            Spawned { id, sim, sink }
        }

        fn spawn(&mut self, media_type: MediaType) -> Spawned {
            let mut config = PlaybackConfig::new("clip.mp4");
            config.media_type = media_type;
            self.spawn_with(config, SimOptions::default())
        }

        fn run(&mut self, ticks: usize) -> Vec<StateChange> {
            (0..ticks).flat_map(|_| self.scene.tick(DT)).collect()
        }

        fn tap(&mut self, target: ObjectId) {
            self.picker.aim(&[target]);
            let at = Vec2::new(320.0, 240.0);
            self.scene.push_pointer(PointerEvent::Down(at));
            self.scene.push_pointer(PointerEvent::Up(at));
        }

        fn state(&self, id: ObjectId) -> MediaState {
            self.scene.object(id).map(|o| o.state()).unwrap()
        }

        fn assert_single_active(&self) {
            assert!(self.scene.playing().len() <= 1, "{:?}", self.scene.playing());
        }
    }

    #[test]
    fn tap_switches_active_video() {
        let mut h = harness(Platform::Android);
        let a = h.spawn(MediaType::OnTexture);
        let b = h.spawn(MediaType::OnTexture);
        h.run(10);
        assert_eq!(h.state(a.id), MediaState::Ready);

        h.tap(b.id);
        h.run(7);
        assert_eq!(h.state(b.id), MediaState::Playing);

        h.scene.object_mut(a.id).unwrap().seek_to(2.5);
        b.sim.advance(1.0);
        h.tap(a.id);
        h.run(7);
        assert_eq!(h.state(b.id), MediaState::Paused);
        assert_eq!(h.state(a.id), MediaState::Playing);
        assert!((a.sim.position() - 2.5).abs() < 1e-4);
        assert_eq!(a.sink.icon(), Some(None));
        assert_eq!(b.sink.icon(), Some(Some(Icon::Play)));
        h.assert_single_active();
    }

    #[test]
    fn fullscreen_only_tap_runs_handoff() {
        let mut h = harness(Platform::Android);
        let c = h.spawn(MediaType::Fullscreen);
        assert_eq!(h.state(c.id), MediaState::NotReady);

        assert_eq!(h.scene.single_tap(c.id), TapAction::Fullscreen(c.id));
        assert_eq!(c.sink.icon(), Some(Some(Icon::Busy)));
        assert!(h.scene.take_went_to_fullscreen());

        h.run(30);
        assert_eq!(c.sim.counters().fullscreen_sessions, 1);
        assert_eq!(
            c.sim.counters().last_fullscreen_locator.as_deref(),
            Some("clip.mp4")
        );
        assert_eq!(h.state(c.id), MediaState::Ready);
        assert_eq!(c.sink.icon(), Some(Some(Icon::Play)));
        assert_eq!(h.scene.controller().pending_fullscreen(), 0);
        assert_eq!(
            h.display.events(),
            vec![
                DisplayEvent::Orientation(Orientation::LandscapeLeft),
                DisplayEvent::Orientation(Orientation::LandscapeLeft),
                DisplayEvent::Orientation(Orientation::Portrait),
            ]
        );
    }

    #[test]
    fn same_frame_activation_serializes_loads() {
        let mut h = harness(Platform::Wsa);
        let a = h.spawn(MediaType::OnTexture);
        let b = h.spawn(MediaType::OnTexture);

        h.run(2);
        assert_eq!(a.sim.counters().load_calls, 1);
        assert_eq!(b.sim.counters().load_calls, 0);
        assert_eq!(h.scene.gate().holder(), Some(a.id));

        // A keeps the gate through its 1.5s settle
        let mut b_loaded_at = None;
        for frame in 3..60 {
            h.scene.tick(DT);
            if h.scene.gate().is_locked() {
                let holders = [a.id, b.id]
                    .iter()
                    .filter(|id| h.scene.gate().holder() == Some(**id))
                    .count();
                assert_eq!(holders, 1);
            }
            if b_loaded_at.is_none() && b.sim.counters().load_calls == 1 {
                b_loaded_at = Some(frame);
                assert!(!h.scene.gate().is_locked() || h.scene.gate().holder() == Some(b.id));
            }
        }
        let b_loaded_at = b_loaded_at.unwrap();
        assert!(b_loaded_at >= 17, "B loaded at frame {b_loaded_at}");
        assert_eq!(h.state(a.id), MediaState::Ready);
        assert_eq!(h.state(b.id), MediaState::Ready);
        assert_eq!(h.scene.gate().acquisitions(), 2);
    }

    #[test]
    fn suspend_resume_keeps_position() {
        let mut h = harness(Platform::Ios);
        let a = h.spawn(MediaType::OnTexture);
        h.run(10);
        assert_eq!(h.scene.play_on_texture(a.id), TapAction::PlayOnTexture(a.id));
        h.run(1);
        a.sim.advance(6.0);

        let changes = h.scene.suspend(true);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].to, MediaState::NotReady);
        assert!(h.run(5).is_empty());

        h.scene.suspend(false);
        h.run(10);
        assert_eq!(h.state(a.id), MediaState::Ready);
        h.scene.single_tap(a.id);
        h.run(1);
        assert_eq!(h.state(a.id), MediaState::Playing);
        let position = h.scene.object(a.id).unwrap().current_position();
        assert!((position - 6.0).abs() < 1e-4, "{position}");
    }

    #[test]
    fn spawn_while_suspended_waits_for_resume() {
        let mut h = harness(Platform::Desktop);
        h.scene.suspend(true);
        let a = h.spawn(MediaType::OnTexture);
        h.run(5);
        assert_eq!(a.sim.counters().init_calls, 0);
        h.scene.suspend(false);
        h.run(10);
        assert_eq!(h.state(a.id), MediaState::Ready);
    }

    #[test]
    fn in_process_fullscreen_toggles_tracking() {
        let mut h = harness(Platform::Ios);
        let mut config = PlaybackConfig::new("clip.mp4");
        config.media_type = MediaType::OnTextureFullscreen;
        let a = h.spawn_with(
            config,
            SimOptions {
                in_process_fullscreen: true,
                ..SimOptions::default()
            },
        );
        h.run(10);
        assert_eq!(h.scene.double_tap(a.id), TapAction::Fullscreen(a.id));
        h.run(10);
        assert_eq!(h.state(a.id), MediaState::PlayingFullscreen);
        assert!(h.display.events().contains(&DisplayEvent::Tracking(false)));

        a.sim.finish_fullscreen();
        h.run(1);
        assert_eq!(h.state(a.id), MediaState::Ready);
        assert_eq!(h.display.events().last(), Some(&DisplayEvent::Tracking(true)));
    }

    fn fullscreen_on_ios(h: &mut Harness) -> Spawned {
        let a = h.spawn_with(
            PlaybackConfig::new("clip.mp4"),
            SimOptions {
                in_process_fullscreen: true,
                ..SimOptions::default()
            },
        );
        h.run(10);
        h.scene.double_tap(a.id);
        h.run(10);
        assert_eq!(h.state(a.id), MediaState::PlayingFullscreen);
        a
    }

    fn last_tracking(display: &DisplayLog) -> Option<DisplayEvent> {
        display
            .events()
            .into_iter()
            .rev()
            .find(|e| matches!(e, DisplayEvent::Tracking(_)))
    }

    #[test]
    fn suspend_during_fullscreen_restores_tracking() {
        let mut h = harness(Platform::Ios);
        let a = fullscreen_on_ios(&mut h);
        assert_eq!(last_tracking(&h.display), Some(DisplayEvent::Tracking(false)));

        let changes = h.scene.suspend(true);
        assert!(changes.iter().any(|c| c.id == a.id
            && c.from == MediaState::PlayingFullscreen
            && c.to == MediaState::NotReady));
        assert_eq!(last_tracking(&h.display), Some(DisplayEvent::Tracking(true)));

        h.scene.suspend(false);
        h.run(20);
        assert_eq!(last_tracking(&h.display), Some(DisplayEvent::Tracking(true)));
    }

    #[test]
    fn despawn_during_fullscreen_restores_tracking() {
        let mut h = harness(Platform::Ios);
        let a = fullscreen_on_ios(&mut h);
        assert!(h.scene.despawn(a.id));
        assert_eq!(last_tracking(&h.display), Some(DisplayEvent::Tracking(true)));
        h.run(20);
        assert_eq!(last_tracking(&h.display), Some(DisplayEvent::Tracking(true)));
    }

    #[test]
    fn despawn_outside_fullscreen_leaves_tracking_alone() {
        let mut h = harness(Platform::Ios);
        let a = h.spawn(MediaType::OnTexture);
        h.run(10);
        assert!(h.scene.despawn(a.id));
        assert_eq!(last_tracking(&h.display), None);
    }

    #[test]
    fn autoplay_keeps_single_active() {
        let mut h = harness(Platform::Desktop);
        let mut config = PlaybackConfig::new("clip.mp4");
        config.auto_play = true;
        let a = h.spawn_with(config.clone(), SimOptions::default());
        let b = h.spawn_with(config, SimOptions::default());
        for _ in 0..15 {
            h.scene.tick(DT);
            h.assert_single_active();
        }
        let playing = h.scene.playing();
        assert_eq!(playing.len(), 1);
        assert!(playing[0] == a.id || playing[0] == b.id);
    }

    #[test]
    fn taps_never_leave_two_playing() {
        let mut h = harness(Platform::Desktop);
        let ids: Vec<ObjectId> = (0..3).map(|_| h.spawn(MediaType::OnTexture).id).collect();
        h.run(10);
        for round in 0..12 {
            let target = ids[(round * 7 + 1) % ids.len()];
            h.tap(target);
            for _ in 0..7 {
                h.scene.tick(DT);
                h.assert_single_active();
            }
        }
    }

    #[test]
    fn pointer_channel_drained_each_tick() {
        let mut h = harness(Platform::Desktop);
        let a = h.spawn(MediaType::OnTexture);
        h.run(10);
        let (tx, rx) = crossbeam_channel::unbounded();
        h.scene.attach_pointer_channel(rx);
        h.picker.aim(&[a.id]);

        let at = Vec2::new(10.0, 10.0);
        std::thread::spawn(move || {
            tx.send(PointerEvent::Down(at)).unwrap();
            tx.send(PointerEvent::Up(at)).unwrap();
        })
        .join()
        .unwrap();

        h.run(7);
        assert_eq!(h.state(a.id), MediaState::Playing);
    }

    #[test]
    fn drag_does_not_play() {
        let mut h = harness(Platform::Desktop);
        let a = h.spawn(MediaType::OnTexture);
        h.run(10);
        h.picker.aim(&[a.id]);
        h.scene.push_pointer(PointerEvent::Down(Vec2::ZERO));
        h.scene.push_pointer(PointerEvent::Up(Vec2::new(100.0, 0.0)));
        h.run(10);
        assert_eq!(h.state(a.id), MediaState::Ready);
        assert_eq!(a.sim.counters().play_calls, 0);
    }

    #[test]
    fn invalid_config_registers_in_error() {
        let mut h = harness(Platform::Desktop);
        let bad = h.spawn_with(PlaybackConfig::new(""), SimOptions::default());
        assert_eq!(h.state(bad.id), MediaState::Error);
        h.run(5);
        assert_eq!(bad.sim.counters().init_calls, 0);
        assert_eq!(h.scene.gate().acquisitions(), 0);
        assert_eq!(h.scene.single_tap(bad.id), TapAction::Ignored(bad.id));
    }

    #[test]
    fn despawn_mid_load_frees_gate_for_others() {
        let mut h = harness(Platform::Wsa);
        let a = h.spawn(MediaType::OnTexture);
        let b = h.spawn(MediaType::OnTexture);
        h.run(2);
        assert_eq!(h.scene.gate().holder(), Some(a.id));
        assert!(h.scene.despawn(a.id));
        assert!(!h.scene.gate().is_locked());
        assert!(!a.sim.is_inited());
        assert!(!h.scene.despawn(a.id));
        h.run(30);
        assert_eq!(b.sim.counters().load_calls, 1);
        assert_eq!(h.scene.registry().len(), 1);
    }
}
