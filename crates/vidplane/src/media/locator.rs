use crate::settings::Platform;

/// Locators derived from one configured source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocator {
    /// What the configuration said.
    pub source: String,
    /// Handed to the on-texture decoder at load time.
    pub on_texture: String,
    /// Handed to the full-screen overlay.
    pub fullscreen: String,
}

impl ResolvedLocator {
    pub fn is_remote(&self) -> bool {
        is_remote(&self.source)
    }
}

pub fn is_remote(locator: &str) -> bool {
    locator.contains("://")
}

pub fn resolve(source: &str, platform: Platform) -> ResolvedLocator {
    let source = source.trim();
    let remote = is_remote(source);
    let (on_texture, fullscreen) = match platform {
        Platform::Android => {
            // Relative names are opened from the APK assets by both players
            let fullscreen = if remote || !source.starts_with('/') {
                source.to_string()
            } else {
                format!("file://{source}")
            };
            (source.to_string(), fullscreen)
        }
        Platform::Ios => {
            let on_texture = if remote {
                source.to_string()
            } else {
                format!("Data/Raw/{source}")
            };
            (on_texture, source.to_string())
        }
        Platform::Wsa => {
            let on_texture = if remote {
                source.to_string()
            } else {
                format!("ms-appx:///Data/StreamingAssets/{source}")
            };
            (on_texture.clone(), on_texture)
        }
        Platform::Desktop => (source.to_string(), source.to_string()),
    };

    ResolvedLocator {
        source: source.to_string(),
        on_texture,
        fullscreen,
    }
}
