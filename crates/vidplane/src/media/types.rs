use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;

/// Playback state reported by a media backend.
///
/// The ordinals are shared with every native backend and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum MediaState {
    ReachedEnd = 0,
    Paused = 1,
    Stopped = 2,
    Playing = 3,
    Ready = 4,
    NotReady = 5,
    Error = 6,
    /// Only reported where full-screen playback runs in-process.
    PlayingFullscreen = 7,
}

/// State of a playback object. Same value set as the backend status.
pub type PlaybackState = MediaState;

impl MediaState {
    pub const ALL: &[MediaState] = &[
        MediaState::ReachedEnd,
        MediaState::Paused,
        MediaState::Stopped,
        MediaState::Playing,
        MediaState::Ready,
        MediaState::NotReady,
        MediaState::Error,
        MediaState::PlayingFullscreen,
    ];

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_i32() == value)
    }

    /// Playing either on the surface or in the full-screen overlay.
    pub fn is_playing(self) -> bool {
        matches!(self, MediaState::Playing | MediaState::PlayingFullscreen)
    }

    /// States from which an on-texture play command is accepted.
    pub fn can_start_playback(self) -> bool {
        matches!(
            self,
            MediaState::Ready | MediaState::Paused | MediaState::Stopped | MediaState::ReachedEnd
        )
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MediaState::ReachedEnd => "Reached End",
            MediaState::Paused => "Paused",
            MediaState::Stopped => "Stopped",
            MediaState::Playing => "Playing",
            MediaState::Ready => "Ready",
            MediaState::NotReady => "Not Ready",
            MediaState::Error => "Error",
            MediaState::PlayingFullscreen => "Playing Fullscreen",
        }
    }
}

impl TryFrom<i32> for MediaState {
    type Error = PlaybackError;

    fn try_from(value: i32) -> Result<Self, PlaybackError> {
        Self::from_i32(value).ok_or(PlaybackError::TransientPollError(value))
    }
}

/// Presentation modes a resource supports. Set at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    OnTexture,
    Fullscreen,
    #[default]
    OnTextureFullscreen,
}

impl MediaType {
    pub fn allows_on_texture(self) -> bool {
        matches!(self, MediaType::OnTexture | MediaType::OnTextureFullscreen)
    }

    pub fn allows_fullscreen(self) -> bool {
        matches!(self, MediaType::Fullscreen | MediaType::OnTextureFullscreen)
    }

    /// Combine the two capabilities back into a media type.
    pub fn from_capabilities(on_texture: bool, fullscreen: bool) -> Option<Self> {
        match (on_texture, fullscreen) {
            (true, true) => Some(MediaType::OnTextureFullscreen),
            (true, false) => Some(MediaType::OnTexture),
            (false, true) => Some(MediaType::Fullscreen),
            (false, false) => None,
        }
    }
}

/// Graphics API the host renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    Gl20,
    Gl30,
    Metal,
    Direct3D11,
}

impl RendererKind {
    pub fn is_opengl(self) -> bool {
        matches!(self, RendererKind::Gl20 | RendererKind::Gl30)
    }
}

/// Pixel layout of the frame texture the backend writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureFormat {
    Rgb565,
    Bgra32,
}

impl TextureFormat {
    pub fn for_renderer(renderer: RendererKind) -> Self {
        if renderer.is_opengl() {
            TextureFormat::Rgb565
        } else {
            TextureFormat::Bgra32
        }
    }
}

/// Opaque native texture id/pointer handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeTextureHandle(pub u64);

/// Allocation request for a frame texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoTextureDesc {
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
}

impl VideoTextureDesc {
    /// OpenGL backends upload with glTexImage and resize the texture themselves,
    /// Metal and D3D need the real size and a 4-byte format up front.
    pub fn for_renderer(renderer: RendererKind, video_width: i32, video_height: i32) -> Self {
        let format = TextureFormat::for_renderer(renderer);
        match format {
            TextureFormat::Rgb565 => Self {
                format,
                width: 0,
                height: 0,
            },
            TextureFormat::Bgra32 => Self {
                format,
                width: video_width.max(0) as u32,
                height: video_height.max(0) as u32,
            },
        }
    }
}
