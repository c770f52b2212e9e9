use serde::{Deserialize, Serialize};

use super::presentation::{Icon, TextureRef};
use crate::error::PlaybackError;
use crate::media::types::MediaType;

/// Icon textures shown over the video surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconSet {
    #[serde(default = "default_play_icon")]
    pub play: TextureRef,
    #[serde(default = "default_busy_icon")]
    pub busy: TextureRef,
    #[serde(default = "default_error_icon")]
    pub error: TextureRef,
}

fn default_play_icon() -> TextureRef {
    TextureRef::new("icons/play.png")
}

fn default_busy_icon() -> TextureRef {
    TextureRef::new("icons/busy.png")
}

fn default_error_icon() -> TextureRef {
    TextureRef::new("icons/error.png")
}

impl Default for IconSet {
    fn default() -> Self {
        Self {
            play: default_play_icon(),
            busy: default_busy_icon(),
            error: default_error_icon(),
        }
    }
}

impl IconSet {
    pub fn texture(&self, icon: Icon) -> &TextureRef {
        match icon {
            Icon::Play => &self.play,
            Icon::Busy => &self.busy,
            Icon::Error => &self.error,
        }
    }
}

/// Configuration of one video surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Local asset name or remote URL.
    pub locator: String,
    /// Start on-texture playback as soon as the video is ready.
    #[serde(default)]
    pub auto_play: bool,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub icons: IconSet,
    #[serde(default)]
    pub keyframe: Option<TextureRef>,
}

impl PlaybackConfig {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            auto_play: false,
            media_type: MediaType::default(),
            icons: IconSet::default(),
            keyframe: None,
        }
    }

    pub fn validate(&self) -> Result<(), PlaybackError> {
        if self.locator.trim().is_empty() {
            return Err(PlaybackError::ConfigurationError(
                "video locator is empty".into(),
            ));
        }
        Ok(())
    }
}
