use crate::assets;
use std::path::PathBuf;
use std::time::Duration;

/// Default HTTP timeout for remote image references.
pub const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontConfig {
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
    /// Fonts consulted for glyphs the main faces lack (Devanagari notes).
    pub fallbacks: Vec<PathBuf>,
}

/// Settings that shape a render but are not part of the record.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub fonts: FontConfig,
    /// Image reference for the controller of examination's signature
    pub controller_signature: String,
    /// `None` disables the HTTP timeout
    pub image_timeout: Option<Duration>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            fonts: FontConfig::default(),
            controller_signature: assets::CONTROLLER_SIGNATURE.to_string(),
            image_timeout: Some(Duration::from_secs(DEFAULT_IMAGE_TIMEOUT_SECS)),
        }
    }
}
