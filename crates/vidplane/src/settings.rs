use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::dispatch::fullscreen::Orientation;
use crate::dispatch::gesture::GestureConfig;
use crate::media::types::RendererKind;
use crate::playback::config::PlaybackConfig;

/// Target platform family. Decides locator prefixes and full-screen behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Android,
    Ios,
    Wsa,
    Desktop,
}

impl Platform {
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Android => "Android",
            Platform::Ios => "iOS",
            Platform::Wsa => "Windows Store",
            Platform::Desktop => "Desktop",
        }
    }
}

/// Platform-conditional behavior, resolved once per scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Capabilities {
    pub platform: Platform,
    pub renderer: RendererKind,
    /// Full-screen playback reports `PlayingFullscreen` while the overlay is up.
    pub supports_in_process_fullscreen: bool,
    /// Orientation requested before full-screen playback starts.
    pub fullscreen_orientation: Option<Orientation>,
    /// Rotate back through landscape to portrait once full-screen playback returns.
    pub restore_orientation_after_fullscreen: bool,
    /// Keep the load gate held this long after `load` returns.
    pub post_load_settle_secs: f32,
}

impl Capabilities {
    pub fn for_platform(platform: Platform, renderer: RendererKind) -> Self {
        match platform {
            Platform::Android => Self {
                platform,
                renderer,
                supports_in_process_fullscreen: false,
                fullscreen_orientation: Some(Orientation::LandscapeLeft),
                restore_orientation_after_fullscreen: true,
                post_load_settle_secs: 0.0,
            },
            Platform::Ios => Self {
                platform,
                renderer,
                supports_in_process_fullscreen: true,
                fullscreen_orientation: Some(Orientation::AutoRotation),
                restore_orientation_after_fullscreen: true,
                post_load_settle_secs: 0.0,
            },
            Platform::Wsa => Self {
                platform,
                renderer,
                supports_in_process_fullscreen: true,
                fullscreen_orientation: Some(Orientation::AutoRotation),
                restore_orientation_after_fullscreen: true,
                post_load_settle_secs: 1.5,
            },
            Platform::Desktop => Self {
                platform,
                renderer,
                supports_in_process_fullscreen: false,
                fullscreen_orientation: None,
                restore_orientation_after_fullscreen: false,
                post_load_settle_secs: 0.0,
            },
        }
    }
}

/// Waits used by the load and full-screen sequences, in seconds unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    #[serde(default = "default_gate_poll")]
    pub gate_poll_secs: f32,
    #[serde(default = "default_orientation_settle")]
    pub orientation_settle_secs: f32,
    #[serde(default = "default_orientation_restore")]
    pub orientation_restore_secs: f32,
    /// Overrides the platform's post-load settle when set.
    #[serde(default)]
    pub post_load_settle_secs: Option<f32>,
    /// Frames to wait after full-screen play returns.
    #[serde(default = "default_fullscreen_return_frames")]
    pub fullscreen_return_frames: u32,
}

fn default_gate_poll() -> f32 {
    0.5
}

fn default_orientation_settle() -> f32 {
    0.3
}

fn default_orientation_restore() -> f32 {
    0.7
}

fn default_fullscreen_return_frames() -> u32 {
    2
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            gate_poll_secs: default_gate_poll(),
            orientation_settle_secs: default_orientation_settle(),
            orientation_restore_secs: default_orientation_restore(),
            post_load_settle_secs: None,
            fullscreen_return_frames: default_fullscreen_return_frames(),
        }
    }
}

impl Timings {
    pub fn post_load_settle(&self, caps: &Capabilities) -> f32 {
        self.post_load_settle_secs
            .unwrap_or(caps.post_load_settle_secs)
            .max(0.0)
    }
}

/// Scene description persisted at `~/.config/vidplane/scene.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSettings {
    pub version: u32,
    #[serde(default = "default_platform")]
    pub platform: Platform,
    #[serde(default = "default_renderer")]
    pub renderer: RendererKind,
    #[serde(default)]
    pub fullscreen_preferred: bool,
    #[serde(default)]
    pub timings: Timings,
    #[serde(default)]
    pub gestures: GestureConfig,
    #[serde(default)]
    pub objects: Vec<PlaybackConfig>,
}

fn default_platform() -> Platform {
    Platform::Desktop
}

fn default_renderer() -> RendererKind {
    RendererKind::Gl30
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            version: 1,
            platform: default_platform(),
            renderer: default_renderer(),
            fullscreen_preferred: false,
            timings: Timings::default(),
            gestures: GestureConfig::default(),
            objects: Vec::new(),
        }
    }
}

impl SceneSettings {
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vidplane").join("scene.json"))
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_platform(self.platform, self.renderer)
    }

    /// Load from the user config dir, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::debug!("Using default scene settings: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        let Some(path) = Self::settings_path() else {
            return;
        };
        if let Err(e) = self.save_to(&path) {
            log::error!("Failed to save scene settings: {e}");
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)?;
        for (i, object) in settings.objects.iter().enumerate() {
            if let Err(e) = object.validate() {
                anyhow::bail!("object {i} in {}: {e}", path.display());
            }
        }
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Saved scene settings to {}", path.display());
        Ok(())
    }
}
