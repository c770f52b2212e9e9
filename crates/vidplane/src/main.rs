use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::Result;
use glam::{Mat4, Vec2, Vec3};

use vidplane::Scene;
use vidplane::dispatch::fullscreen::{DisplayHost, Orientation};
use vidplane::dispatch::gesture::PointerEvent;
use vidplane::dispatch::pick::{Camera, HitTester, QuadPicker};
use vidplane::media::simulated::{SimHandle, SimOptions, SimulatedBackend};
use vidplane::media::types::{MediaState, MediaType, NativeTextureHandle, VideoTextureDesc};
use vidplane::playback::config::PlaybackConfig;
use vidplane::playback::presentation::{IconTexture, MainTexture, PresentationSink, TextureRef};
use vidplane::registry::ObjectId;
use vidplane::settings::SceneSettings;

const FPS: f32 = 60.0;
const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

/// Host sink that only logs what a renderer would do.
struct LogSink {
    name: String,
    next_texture: u64,
}

impl PresentationSink for LogSink {
    fn set_main_texture(&mut self, texture: MainTexture<'_>) {
        match texture {
            MainTexture::Video(handle) => log::debug!("[{}] main <- video {:?}", self.name, handle),
            MainTexture::Keyframe { texture, .. } => {
                log::debug!("[{}] main <- keyframe {}", self.name, texture.0);
            }
        }
    }

    fn set_icon(&mut self, icon: Option<IconTexture<'_>>) {
        match icon {
            Some(icon) => log::debug!("[{}] icon {:?} ({})", self.name, icon.kind, icon.texture.0),
            None => log::debug!("[{}] icon hidden", self.name),
        }
    }

    fn frame_updated(&mut self) {
        log::trace!("[{}] frame", self.name);
    }

    fn create_video_texture(&mut self, desc: VideoTextureDesc) -> NativeTextureHandle {
        self.next_texture += 1;
        log::debug!("[{}] texture {:?}", self.name, desc);
        NativeTextureHandle(self.next_texture)
    }

    fn release_video_texture(&mut self) {
        log::debug!("[{}] texture released", self.name);
    }

    fn set_surface_aspect(&mut self, aspect: f32) {
        log::debug!("[{}] aspect {aspect:.3}", self.name);
    }

    fn set_icon_scale(&mut self, x: f32, y: f32) {
        log::trace!("[{}] icon scale {x:.2}x{y:.2}", self.name);
    }
}

struct LogDisplay;

impl DisplayHost for LogDisplay {
    fn set_orientation(&mut self, orientation: Orientation) {
        log::info!("Display orientation -> {orientation:?}");
    }

    fn set_tracking_enabled(&mut self, enabled: bool) {
        log::info!("Tracking {}", if enabled { "resumed" } else { "paused" });
    }
}

/// Lets the demo place quads after the scene owns the picker.
#[derive(Clone)]
struct SharedPicker(Rc<RefCell<QuadPicker>>);

impl HitTester for SharedPicker {
    fn pick(&self, point: Vec2) -> Vec<ObjectId> {
        self.0.borrow().pick(point)
    }
}

fn demo_settings() -> SceneSettings {
    let mut first = PlaybackConfig::new("VuforiaSizzleReel_1.mp4");
    first.keyframe = Some(TextureRef::new("keyframes/sizzle_1.png"));
    let mut second = PlaybackConfig::new("VuforiaSizzleReel_2.mp4");
    second.media_type = MediaType::OnTexture;
    second.auto_play = true;
    let mut third = PlaybackConfig::new("https://example.com/trailer.mp4");
    third.media_type = MediaType::Fullscreen;
    SceneSettings {
        objects: vec![first, second, third],
        ..SceneSettings::default()
    }
}

fn surface_transform(index: usize) -> Mat4 {
    let x = (index as f32 - 1.0) * 2.4;
    Mat4::from_translation(Vec3::new(x, 0.0, 0.0)) * Mat4::from_scale(Vec3::new(2.0, 1.125, 1.0))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // vidplane [scene.json] [--save]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut settings = match args.iter().find(|a| !a.starts_with("--")) {
        Some(path) => SceneSettings::load_from(Path::new(path))?,
        None => SceneSettings::load(),
    };
    if settings.objects.is_empty() {
        log::info!("No videos configured, using the demo scene");
        settings = demo_settings();
    }
    if args.iter().any(|a| a == "--save") {
        settings.save();
    }

    let camera = Camera::new(
        Mat4::look_at_rh(Vec3::new(0.0, 0.0, 6.0), Vec3::ZERO, Vec3::Y),
        Mat4::perspective_rh(50f32.to_radians(), VIEWPORT.x / VIEWPORT.y, 0.1, 100.0),
        VIEWPORT,
    );
    let picker = SharedPicker(Rc::new(RefCell::new(QuadPicker::new(camera))));
    let mut scene = Scene::new(&settings, Box::new(picker.clone()), Box::new(LogDisplay));

    let mut videos: Vec<(ObjectId, SimHandle, Vec2)> = Vec::new();
    for (index, config) in settings.objects.iter().enumerate() {
        let backend = SimulatedBackend::new(SimOptions {
            in_process_fullscreen: scene.capabilities().supports_in_process_fullscreen,
            prepare_polls: 20 + 10 * index as u32,
            ..SimOptions::default()
        });
        let sim = backend.handle();
        let sink = LogSink {
            name: config.locator.clone(),
            next_texture: 0,
        };
        let id = scene.spawn(config.clone(), Box::new(backend), Box::new(sink));

        let transform = surface_transform(index);
        picker.0.borrow_mut().set_quad(id, transform);
        let center = camera
            .world_to_screen(transform.transform_point3(Vec3::ZERO))
            .unwrap_or(VIEWPORT * 0.5);
        videos.push((id, sim, center));
    }

    // Scripted taps, fed through the same channel an input thread would use
    let (tx, rx) = crossbeam_channel::unbounded();
    scene.attach_pointer_channel(rx);
    let script: Vec<(u32, PointerEvent)> = videos
        .iter()
        .enumerate()
        .flat_map(|(i, (_, _, at))| {
            let start = 90 + 150 * i as u32;
            [(start, PointerEvent::Down(*at)), (start + 6, PointerEvent::Up(*at))]
        })
        .collect();

    let dt = 1.0 / FPS;
    let total_frames = 900;
    let mut fullscreen_frames = 0;
    for frame in 0..total_frames {
        for (_, event) in script.iter().filter(|(at, _)| *at == frame) {
            tx.send(*event)?;
        }
        if frame == 600 {
            scene.suspend(true);
        } else if frame == 640 {
            scene.suspend(false);
        }

        for change in scene.tick(dt) {
            log::info!(
                "{}: {} -> {}",
                change.id,
                change.from.display_name(),
                change.to.display_name()
            );
        }
        if scene.take_went_to_fullscreen() {
            log::info!("Frame {frame}: handing off to full-screen playback");
        }

        for (id, sim, _) in &videos {
            sim.advance(dt);
            // The user closes an in-process overlay after two seconds
            if sim.state() == MediaState::PlayingFullscreen {
                fullscreen_frames += 1;
                if fullscreen_frames >= (2.0 * FPS) as u32 {
                    log::info!("{id}: closing full-screen overlay");
                    sim.finish_fullscreen();
                    fullscreen_frames = 0;
                }
            }
        }
    }

    for (id, sim, _) in &videos {
        if let Some(object) = scene.object(*id) {
            log::info!(
                "{id} '{}': {} at {:.2}s, {} frames uploaded",
                object.config().locator,
                object.state().display_name(),
                sim.position(),
                sim.counters().frames_uploaded
            );
        }
    }
    Ok(())
}
