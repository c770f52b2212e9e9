use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use crate::dispatch::fullscreen::{DisplayHost, Orientation};
use crate::dispatch::pick::HitTester;
use crate::gate::LoadGate;
use crate::media::simulated::{SimHandle, SimOptions, SimulatedBackend};
use crate::media::types::{NativeTextureHandle, VideoTextureDesc};
use crate::playback::PlaybackObject;
use crate::playback::config::PlaybackConfig;
use crate::playback::presentation::{Icon, IconTexture, MainTexture, PresentationSink};
use crate::registry::{ObjectId, Registry};
use crate::settings::{Capabilities, Timings};

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    MainVideo(NativeTextureHandle),
    MainKeyframe { name: String, flip_vertical: bool },
    Icon(Option<Icon>),
    FrameUpdated,
    CreateTexture(VideoTextureDesc),
    ReleaseTexture,
    Aspect(f32),
    IconScale(f32, f32),
}

#[derive(Debug, Clone, Default)]
pub struct SinkLog(Rc<RefCell<Vec<SinkEvent>>>);

impl SinkLog {
    pub fn events(&self) -> Vec<SinkEvent> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Most recent icon call, `None` if the icon was never touched.
    pub fn icon(&self) -> Option<Option<Icon>> {
        self.0.borrow().iter().rev().find_map(|e| match e {
            SinkEvent::Icon(icon) => Some(*icon),
            _ => None,
        })
    }

    pub fn main(&self) -> Option<SinkEvent> {
        self.0
            .borrow()
            .iter()
            .rev()
            .find(|e| matches!(e, SinkEvent::MainVideo(_) | SinkEvent::MainKeyframe { .. }))
            .cloned()
    }

    pub fn count(&self, pred: impl Fn(&SinkEvent) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| pred(e)).count()
    }
}

pub struct RecordingSink {
    log: SinkLog,
    next_handle: u64,
}

pub fn recording_sink() -> (Box<dyn PresentationSink>, SinkLog) {
    let log = SinkLog::default();
    let sink = RecordingSink {
        log: log.clone(),
        next_handle: 100,
    };
    (Box::new(sink), log)
}

impl RecordingSink {
    fn push(&self, event: SinkEvent) {
        self.log.0.borrow_mut().push(event);
    }
}

impl PresentationSink for RecordingSink {
    fn set_main_texture(&mut self, texture: MainTexture<'_>) {
        self.push(match texture {
            MainTexture::Video(handle) => SinkEvent::MainVideo(handle),
            MainTexture::Keyframe {
                texture,
                flip_vertical,
            } => SinkEvent::MainKeyframe {
                name: texture.0.clone(),
                flip_vertical,
            },
        });
    }

    fn set_icon(&mut self, icon: Option<IconTexture<'_>>) {
        self.push(SinkEvent::Icon(icon.map(|i| i.kind)));
    }

    fn frame_updated(&mut self) {
        self.push(SinkEvent::FrameUpdated);
    }

    fn create_video_texture(&mut self, desc: VideoTextureDesc) -> NativeTextureHandle {
        self.push(SinkEvent::CreateTexture(desc));
        self.next_handle += 1;
        NativeTextureHandle(self.next_handle)
    }

    fn release_video_texture(&mut self) {
        self.push(SinkEvent::ReleaseTexture);
    }

    fn set_surface_aspect(&mut self, aspect: f32) {
        self.push(SinkEvent::Aspect(aspect));
    }

    fn set_icon_scale(&mut self, x: f32, y: f32) {
        self.push(SinkEvent::IconScale(x, y));
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayEvent {
    Orientation(Orientation),
    Tracking(bool),
}

#[derive(Debug, Clone, Default)]
pub struct DisplayLog(Rc<RefCell<Vec<DisplayEvent>>>);

impl DisplayLog {
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.0.borrow().clone()
    }
}

pub struct RecordingDisplay {
    log: DisplayLog,
}

pub fn recording_display() -> (Box<dyn DisplayHost>, DisplayLog) {
    let log = DisplayLog::default();
    (Box::new(RecordingDisplay { log: log.clone() }), log)
}

impl DisplayHost for RecordingDisplay {
    fn set_orientation(&mut self, orientation: Orientation) {
        self.log
            .0
            .borrow_mut()
            .push(DisplayEvent::Orientation(orientation));
    }

    fn set_tracking_enabled(&mut self, enabled: bool) {
        self.log.0.borrow_mut().push(DisplayEvent::Tracking(enabled));
    }
}

/// Hit tester returning a fixed candidate list for every point.
#[derive(Debug, Clone, Default)]
pub struct FixedPicker(pub Rc<RefCell<Vec<ObjectId>>>);

impl FixedPicker {
    pub fn aim(&self, ids: &[ObjectId]) {
        *self.0.borrow_mut() = ids.to_vec();
    }
}

impl HitTester for FixedPicker {
    fn pick(&self, _point: Vec2) -> Vec<ObjectId> {
        self.0.borrow().clone()
    }
}

/// Create, activate and register a simulated object.
pub fn spawn_sim(
    registry: &mut Registry,
    gate: &Rc<LoadGate>,
    config: PlaybackConfig,
    options: SimOptions,
    caps: &Capabilities,
) -> (ObjectId, SimHandle, SinkLog) {
    let id = registry.allocate_id();
    let backend = SimulatedBackend::new(options);
    let sim = backend.handle();
    let (sink, log) = recording_sink();
    let mut object = PlaybackObject::new(
        id,
        config,
        Box::new(backend),
        sink,
        Rc::clone(gate),
        caps.clone(),
        Timings::default(),
    );
    object.activate().unwrap();
    registry.register(object);
    (id, sim, log)
}

pub fn tick_all(registry: &mut Registry, dt: f32, ticks: usize) {
    for _ in 0..ticks {
        for object in registry.iter_mut() {
            object.tick(dt);
        }
    }
}
