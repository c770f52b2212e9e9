use serde::{Deserialize, Serialize};

use crate::media::types::{MediaState, NativeTextureHandle, VideoTextureDesc};

/// Status icon drawn over the video surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Play,
    Busy,
    Error,
}

/// Host-side name of a texture asset (icon or keyframe).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureRef(pub String);

impl TextureRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// What the video surface's main material shows.
#[derive(Debug, Clone, PartialEq)]
pub enum MainTexture<'a> {
    /// The frame texture the backend decodes into.
    Video(NativeTextureHandle),
    /// Still image shown while the video is idle. Keyframes come from image
    /// files and are stored bottom-up relative to decoded video frames.
    Keyframe {
        texture: &'a TextureRef,
        flip_vertical: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IconTexture<'a> {
    pub kind: Icon,
    pub texture: &'a TextureRef,
}

/// Rendering side effects of one playback object.
///
/// Implemented by the host engine. Every call happens on the render thread
/// from within `Scene::tick`.
pub trait PresentationSink {
    fn set_main_texture(&mut self, texture: MainTexture<'_>);

    /// `None` hides the icon.
    fn set_icon(&mut self, icon: Option<IconTexture<'_>>);

    /// A new video frame was written into the frame texture.
    fn frame_updated(&mut self);

    fn create_video_texture(&mut self, desc: VideoTextureDesc) -> NativeTextureHandle;

    fn release_video_texture(&mut self);

    /// Height over width of the decoded video.
    fn set_surface_aspect(&mut self, aspect: f32);

    fn set_icon_scale(&mut self, x: f32, y: f32);
}

/// Main texture choice for a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainChoice {
    Video,
    Keyframe,
    Unchanged,
}

/// Side effects applied on entering a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub main: MainChoice,
    pub icon: Option<Icon>,
}

/// Texture and icon for the state just entered.
///
/// Idle states fall back to leaving the main texture alone when the object
/// has no keyframe configured.
pub fn presentation_for(state: MediaState, has_keyframe: bool) -> Presentation {
    let keyframe = if has_keyframe {
        MainChoice::Keyframe
    } else {
        MainChoice::Unchanged
    };
    match state {
        MediaState::Playing => Presentation {
            main: MainChoice::Video,
            icon: None,
        },
        MediaState::Paused => Presentation {
            main: MainChoice::Video,
            icon: Some(Icon::Play),
        },
        MediaState::Ready | MediaState::ReachedEnd | MediaState::Stopped => Presentation {
            main: keyframe,
            icon: Some(Icon::Play),
        },
        MediaState::NotReady | MediaState::PlayingFullscreen => Presentation {
            main: MainChoice::Unchanged,
            icon: Some(Icon::Busy),
        },
        MediaState::Error => Presentation {
            main: MainChoice::Unchanged,
            icon: Some(Icon::Error),
        },
    }
}

/// Icon scale so the icon fills half of the surface's narrowest side.
pub fn icon_scale(video_width: i32, video_height: i32) -> (f32, f32) {
    if video_width <= 0 || video_height <= 0 {
        return (0.5, 0.5);
    }
    let (w, h) = (video_width as f32, video_height as f32);
    if w > h {
        (0.5 * h / w, 0.5)
    } else {
        (0.5, 0.5 * w / h)
    }
}

/// Height over width, `None` while the size is unknown.
pub fn surface_aspect(video_width: i32, video_height: i32) -> Option<f32> {
    (video_width > 0 && video_height > 0).then(|| video_height as f32 / video_width as f32)
}
