//! Image references: resolving them to bytes, decoding, and data URLs.

use crate::assets;
use crate::error::ImageError;
use ::image::imageops::FilterType;
use ::image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Decoded Images
// ============================================================================

/// A decoded image, ready to be scaled into a destination rectangle.
pub enum LoadedImage {
    Raster(DynamicImage),
    Vector(usvg::Tree),
}

impl fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.size();
        match self {
            LoadedImage::Raster(_) => write!(f, "Raster({}x{})", w, h),
            LoadedImage::Vector(_) => write!(f, "Vector({}x{})", w, h),
        }
    }
}

impl LoadedImage {
    /// Decode SVG or any raster format the `image` crate understands.
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        if looks_like_svg(bytes) {
            let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())
                .map_err(|e| ImageError::Decode(e.to_string()))?;
            return Ok(LoadedImage::Vector(tree));
        }
        let img = ::image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;
        Ok(LoadedImage::Raster(img))
    }

    /// Intrinsic size in pixels.
    pub fn size(&self) -> (u32, u32) {
        match self {
            LoadedImage::Raster(img) => img.dimensions(),
            LoadedImage::Vector(tree) => {
                let size = tree.size();
                (size.width().ceil() as u32, size.height().ceil() as u32)
            }
        }
    }

    /// Produce straight-alpha RGBA pixels stretched to exactly `width` x `height`.
    pub fn render(&self, width: u32, height: u32) -> Result<RgbaImage, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::Empty);
        }
        match self {
            LoadedImage::Raster(img) => {
                if img.width() == 0 || img.height() == 0 {
                    return Err(ImageError::Empty);
                }
                Ok(::image::imageops::resize(&img.to_rgba8(), width, height, FilterType::Triangle))
            }
            LoadedImage::Vector(tree) => {
                let size = tree.size();
                let mut pixmap = Pixmap::new(width, height).ok_or(ImageError::Empty)?;
                let transform = Transform::from_scale(
                    width as f32 / size.width(),
                    height as f32 / size.height(),
                );
                resvg::render(tree, transform, &mut pixmap.as_mut());

                let mut out = RgbaImage::new(width, height);
                for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
                    let c = src.demultiply();
                    *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
                }
                Ok(out)
            }
        }
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    body.iter()
        .find(|b| !b.is_ascii_whitespace())
        .map(|b| *b == b'<')
        .unwrap_or(false)
}

// ============================================================================
// Data URLs
// ============================================================================

pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// Split a `data:` URL into its media type and payload bytes.
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>), ImageError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ImageError::DataUrl("missing data: prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::DataUrl("missing ',' separator".to_string()))?;

    match header.strip_suffix(";base64") {
        Some(mime) => {
            let bytes = BASE64
                .decode(payload.trim())
                .map_err(|e| ImageError::DataUrl(e.to_string()))?;
            Ok((mime.to_string(), bytes))
        }
        None => {
            let mime = header.split(';').next().unwrap_or_default();
            Ok((mime.to_string(), payload.as_bytes().to_vec()))
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Resolves an image reference into a decoded image.
pub trait ImageLoader {
    fn load(&self, reference: &str) -> Result<LoadedImage, ImageError>;
}

/// Loader for data URLs, bundled assets, HTTP(S) URLs and local files.
pub struct SourceLoader {
    agent: ureq::Agent,
}

impl SourceLoader {
    /// `timeout` bounds each HTTP request; `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        SourceLoader {
            agent: builder.build(),
        }
    }

    fn fetch(&self, reference: &str) -> Result<Vec<u8>, ImageError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ImageError::MissingReference);
        }

        if reference.starts_with("data:") {
            let (_, bytes) = decode_data_url(reference)?;
            return Ok(bytes);
        }

        if reference.starts_with("http://") || reference.starts_with("https://") {
            let response = self.agent.get(reference).call().map_err(|e| ImageError::Fetch {
                url: reference.to_string(),
                message: e.to_string(),
            })?;

            let mut bytes = Vec::new();
            response
                .into_reader()
                .read_to_end(&mut bytes)
                .map_err(|e| ImageError::Fetch {
                    url: reference.to_string(),
                    message: format!("Failed to read response: {}", e),
                })?;
            return Ok(bytes);
        }

        if let Some(bytes) = assets::bundled(reference) {
            return Ok(bytes.to_vec());
        }

        std::fs::read(reference).map_err(|source| ImageError::Read {
            path: PathBuf::from(reference),
            source,
        })
    }
}

impl Default for SourceLoader {
    fn default() -> Self {
        SourceLoader::new(None)
    }
}

impl ImageLoader for SourceLoader {
    fn load(&self, reference: &str) -> Result<LoadedImage, ImageError> {
        let bytes = self.fetch(reference)?;
        log::debug!("Loaded {} bytes for {}", bytes.len(), describe_reference(reference));
        LoadedImage::decode(&bytes)
    }
}

/// Short description for logs; data URLs are not printed in full.
pub fn describe_reference(reference: &str) -> String {
    if reference.starts_with("data:") {
        let header = reference.split(',').next().unwrap_or("data:");
        format!("{},… ({} chars)", header, reference.len())
    } else {
        reference.to_string()
    }
}
