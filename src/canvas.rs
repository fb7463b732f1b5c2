//! Drawing surfaces.
//!
//! The admit card layout draws through the [`Canvas`] trait. [`RasterCanvas`]
//! paints into an RGBA buffer; [`DisplayList`] only records what was asked
//! for, which is how the layout geometry is checked.

use crate::error::{ImageError, RenderError};
use crate::media::{to_data_url, LoadedImage};
use ::image::{ImageFormat, Rgba, RgbaImage};
use rustybuzz::UnicodeBuffer;
use rusttype::{point, Font, GlyphId, Scale};
use std::io::Cursor;
use std::path::{Path, PathBuf};

// ============================================================================
// Primitives
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Em size in pixels
    pub size: f32,
    pub bold: bool,
}

impl TextStyle {
    pub const fn regular(size: f32) -> Self {
        TextStyle { size, bold: false }
    }

    pub const fn bold(size: f32) -> Self {
        TextStyle { size, bold: true }
    }
}

/// Horizontal anchoring of text relative to its x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

pub trait Canvas {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>);
    /// One-pixel outline.
    fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>);
    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgba<u8>);
    /// `y` is the alphabetic baseline.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, style: TextStyle, align: Align, color: Rgba<u8>);
    /// Stretch `image` into `rect`.
    fn draw_image(&mut self, image: &LoadedImage, rect: Rect) -> Result<(), ImageError>;
}

// ============================================================================
// Display List
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        color: Rgba<u8>,
    },
    StrokeRect {
        rect: Rect,
        color: Rgba<u8>,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        color: Rgba<u8>,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        style: TextStyle,
        align: Align,
        color: Rgba<u8>,
    },
    Image {
        rect: Rect,
        source_size: (u32, u32),
    },
}

/// A canvas that records every call instead of painting.
#[derive(Debug, Default)]
pub struct DisplayList {
    width: u32,
    height: u32,
    pub ops: Vec<DrawOp>,
}

impl DisplayList {
    pub fn new(width: u32, height: u32) -> Self {
        DisplayList {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// The first text op with exactly this content.
    pub fn find_text(&self, text: &str) -> Option<&DrawOp> {
        self.ops
            .iter()
            .find(|op| matches!(op, DrawOp::Text { text: t, .. } if t == text))
    }

    pub fn images(&self) -> Vec<&DrawOp> {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .collect()
    }
}

impl Canvas for DisplayList {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        self.ops.push(DrawOp::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        self.ops.push(DrawOp::StrokeRect { rect, color });
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgba<u8>) {
        self.ops.push(DrawOp::Line { from, to, color });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, style: TextStyle, align: Align, color: Rgba<u8>) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            style,
            align,
            color,
        });
    }

    fn draw_image(&mut self, image: &LoadedImage, rect: Rect) -> Result<(), ImageError> {
        self.ops.push(DrawOp::Image {
            rect,
            source_size: image.size(),
        });
        Ok(())
    }
}

// ============================================================================
// Fonts
// ============================================================================

/// Regular/bold pairs tried in order when no font is configured.
const FONT_CANDIDATES: &[(&str, &str)] = &[
    (
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/noto/NotoSans-Bold.ttf",
    ),
    (
        "/Library/Fonts/Arial.ttf",
        "/Library/Fonts/Arial Bold.ttf",
    ),
    (
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    ),
    ("C:\\Windows\\Fonts\\arial.ttf", "C:\\Windows\\Fonts\\arialbd.ttf"),
];

/// Fonts covering Devanagari, used for glyphs the main fonts lack.
const FALLBACK_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoSansDevanagari-Regular.ttf",
    "/usr/share/fonts/noto/NotoSansDevanagari-Regular.ttf",
    "/usr/share/fonts/google-noto/NotoSansDevanagari-Regular.ttf",
    "/usr/share/fonts/truetype/lohit-devanagari/Lohit-Devanagari.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/System/Library/Fonts/Supplemental/Devanagari Sangam MN.ttc",
    "C:\\Windows\\Fonts\\Nirmala.ttf",
];

struct FontFace {
    font: Font<'static>,
    /// Raw font file, kept for the shaper
    data: Vec<u8>,
}

impl FontFace {
    fn load(path: &Path) -> Result<Self, RenderError> {
        let data = std::fs::read(path).map_err(|e| RenderError::FontLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let font = Font::try_from_vec(data.clone())
            .filter(|_| rustybuzz::Face::from_slice(&data, 0).is_some())
            .ok_or_else(|| RenderError::FontLoad {
                path: path.to_path_buf(),
                message: "not a TrueType/OpenType font".to_string(),
            })?;
        Ok(FontFace { font, data })
    }

    fn covers(&self, c: char) -> bool {
        self.font.glyph(c).id().0 != 0
    }

    fn units_per_em(&self) -> f32 {
        self.font.units_per_em().max(1) as f32
    }

    /// rusttype scales by ascent-to-descent height; convert from an em size.
    fn scale(&self, size: f32) -> Scale {
        let v = self.font.v_metrics_unscaled();
        Scale::uniform(size * (v.ascent - v.descent) / self.units_per_em())
    }
}

/// A glyph placed on a line. `x` is the pen position from the line start and
/// `y` the offset below the baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ShapedGlyph {
    face: usize,
    id: u16,
    x: f32,
    y: f32,
}

pub struct FontSet {
    regular: FontFace,
    bold: FontFace,
    fallbacks: Vec<FontFace>,
}

impl FontSet {
    /// Load the configured fonts, falling back to discovery for anything unset.
    ///
    /// A missing bold face reuses the regular one. Fallback fonts that fail to
    /// load are skipped with a warning.
    pub fn load(
        regular: Option<&Path>,
        bold: Option<&Path>,
        fallbacks: &[PathBuf],
    ) -> Result<Self, RenderError> {
        let (regular, discovered_bold) = match regular {
            Some(path) => (FontFace::load(path)?, None),
            None => discover_pair()?,
        };

        let bold = match bold {
            Some(path) => FontFace::load(path)?,
            None => match discovered_bold {
                Some(face) => face,
                None => {
                    log::warn!("No bold font available, using the regular face for bold text");
                    FontFace {
                        font: regular.font.clone(),
                        data: regular.data.clone(),
                    }
                }
            },
        };

        let mut loaded = Vec::new();
        let configured = !fallbacks.is_empty();
        let candidates: Vec<PathBuf> = if configured {
            fallbacks.to_vec()
        } else {
            FALLBACK_CANDIDATES.iter().map(PathBuf::from).collect()
        };
        for path in candidates {
            if !configured && !path.exists() {
                continue;
            }
            match FontFace::load(&path) {
                Ok(face) => {
                    log::debug!("Using fallback font {}", path.display());
                    loaded.push(face);
                }
                Err(e) => log::warn!("{}", e),
            }
        }

        let devanagari = std::iter::once(&regular)
            .chain(&loaded)
            .any(|face| face.covers('\u{0915}'));
        if !devanagari {
            log::warn!(
                "No font with Devanagari glyphs found; Hindi text will be drawn as missing glyphs. Configure a fallback font."
            );
        }

        Ok(FontSet {
            regular,
            bold,
            fallbacks: loaded,
        })
    }

    /// Discover fonts from the usual system locations.
    pub fn discover() -> Result<Self, RenderError> {
        Self::load(None, None, &[])
    }

    /// Index 0 is the primary face for the style, then the fallbacks in order.
    fn face(&self, index: usize, bold: bool) -> &FontFace {
        let primary = if bold { &self.bold } else { &self.regular };
        match index {
            0 => primary,
            i => self.fallbacks.get(i - 1).unwrap_or(primary),
        }
    }

    fn font_for(&self, c: char, bold: bool) -> usize {
        if c.is_whitespace() || self.face(0, bold).covers(c) {
            return 0;
        }
        self.fallbacks
            .iter()
            .position(|face| face.covers(c))
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Split `text` into runs that share a face. Spaces and joiners stay in
    /// the run they appear in.
    fn runs<'t>(&self, text: &'t str, bold: bool) -> Vec<(usize, &'t str)> {
        let mut runs = Vec::new();
        let mut start = 0;
        let mut current: Option<usize> = None;
        for (i, c) in text.char_indices() {
            let joins = c.is_whitespace() || c == '\u{200C}' || c == '\u{200D}';
            let face = match current {
                Some(face) if joins => face,
                _ => self.font_for(c, bold),
            };
            if current != Some(face) {
                if let Some(prev) = current {
                    runs.push((prev, &text[start..i]));
                }
                start = i;
                current = Some(face);
            }
        }
        if let Some(face) = current {
            runs.push((face, &text[start..]));
        }
        runs
    }

    /// Shape a single line with rustybuzz, run by run, returning the placed
    /// glyphs and the total advance width.
    fn shape(&self, text: &str, style: TextStyle) -> (Vec<ShapedGlyph>, f32) {
        let mut glyphs = Vec::with_capacity(text.len());
        let mut caret = 0.0f32;

        for (index, run) in self.runs(text, style.bold) {
            let face = self.face(index, style.bold);
            let Some(shaper) = rustybuzz::Face::from_slice(&face.data, 0) else {
                continue;
            };
            let mut buffer = UnicodeBuffer::new();
            buffer.push_str(run);
            buffer.guess_segment_properties();
            let output = rustybuzz::shape(&shaper, &[], buffer);

            let scale = style.size / face.units_per_em();
            for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
                glyphs.push(ShapedGlyph {
                    face: index,
                    id: info.glyph_id as u16,
                    x: caret + pos.x_offset as f32 * scale,
                    y: -(pos.y_offset as f32) * scale,
                });
                caret += pos.x_advance as f32 * scale;
            }
        }

        (glyphs, caret)
    }

    pub fn measure(&self, text: &str, style: TextStyle) -> f32 {
        self.shape(text, style).1
    }
}

fn discover_pair() -> Result<(FontFace, Option<FontFace>), RenderError> {
    for (regular, bold) in FONT_CANDIDATES {
        let regular_path = Path::new(regular);
        if !regular_path.exists() {
            continue;
        }
        let regular_face = match FontFace::load(regular_path) {
            Ok(face) => face,
            Err(e) => {
                log::warn!("{}", e);
                continue;
            }
        };
        let bold_face = FontFace::load(Path::new(bold)).ok();
        log::debug!("Using system font {}", regular);
        return Ok((regular_face, bold_face));
    }

    let tried = FONT_CANDIDATES
        .iter()
        .map(|(regular, _)| *regular)
        .collect::<Vec<_>>()
        .join(", ");
    Err(RenderError::FontUnavailable(tried))
}

// ============================================================================
// Raster Canvas
// ============================================================================

pub struct RasterCanvas<'f> {
    image: RgbaImage,
    fonts: &'f FontSet,
}

impl<'f> RasterCanvas<'f> {
    pub fn new(width: u32, height: u32, fonts: &'f FontSet) -> Self {
        RasterCanvas {
            image: RgbaImage::new(width, height),
            fonts,
        }
    }

    pub fn into_raster(self) -> Raster {
        Raster { image: self.image }
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        let alpha = (color[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        if alpha >= 1.0 {
            *dst = color;
            return;
        }
        for i in 0..3 {
            dst[i] = (color[i] as f32 * alpha + dst[i] as f32 * (1.0 - alpha)).round() as u8;
        }
        dst[3] = (255.0 * alpha + dst[3] as f32 * (1.0 - alpha)).round() as u8;
    }
}

impl Canvas for RasterCanvas<'_> {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let x0 = rect.x.round() as i64;
        let y0 = rect.y.round() as i64;
        let x1 = (rect.x + rect.w).round() as i64;
        let y1 = (rect.y + rect.h).round() as i64;
        for y in y0.max(0)..y1.min(self.image.height() as i64) {
            for x in x0.max(0)..x1.min(self.image.width() as i64) {
                self.blend(x, y, color, 1.0);
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let (x0, y0) = (rect.x, rect.y);
        let (x1, y1) = (rect.x + rect.w, rect.y + rect.h);
        self.line((x0, y0), (x1, y0), color);
        self.line((x1, y0), (x1, y1), color);
        self.line((x1, y1), (x0, y1), color);
        self.line((x0, y1), (x0, y0), color);
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), color: Rgba<u8>) {
        // Bresenham on the rounded end points.
        let (mut x, mut y) = (from.0.round() as i64, from.1.round() as i64);
        let (x1, y1) = (to.0.round() as i64, to.1.round() as i64);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.blend(x, y, color, 1.0);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, style: TextStyle, align: Align, color: Rgba<u8>) {
        let fonts = self.fonts;
        let (glyphs, width) = fonts.shape(text, style);
        let start_x = match align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
        };

        for shaped in glyphs {
            let face = fonts.face(shaped.face, style.bold);
            let positioned = face
                .font
                .glyph(GlyphId(shaped.id))
                .scaled(face.scale(style.size))
                .positioned(point(start_x + shaped.x, y + shaped.y));
            if let Some(bb) = positioned.pixel_bounding_box() {
                positioned.draw(|gx, gy, coverage| {
                    let px = bb.min.x as i64 + gx as i64;
                    let py = bb.min.y as i64 + gy as i64;
                    self.blend(px, py, color, coverage);
                });
            }
        }
    }

    fn draw_image(&mut self, image: &LoadedImage, rect: Rect) -> Result<(), ImageError> {
        let width = rect.w.round() as u32;
        let height = rect.h.round() as u32;
        let pixels = image.render(width, height)?;
        ::image::imageops::overlay(
            &mut self.image,
            &pixels,
            rect.x.round() as i64,
            rect.y.round() as i64,
        );
        Ok(())
    }
}

// ============================================================================
// Raster Output
// ============================================================================

/// The flattened admit card image.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    image: RgbaImage,
}

impl Raster {
    pub fn from_image(image: RgbaImage) -> Self {
        Raster { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.image.get_pixel_checked(x, y).copied()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut buf = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(buf)
    }

    pub fn to_data_url(&self) -> Result<String, RenderError> {
        Ok(to_data_url("image/png", &self.to_png()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn fonts() -> Option<FontSet> {
        match FontSet::discover() {
            Ok(fonts) => Some(fonts),
            Err(e) => {
                eprintln!("skipping raster test: {}", e);
                None
            }
        }
    }

    #[test]
    fn display_list_records_calls_in_order() {
        let mut list = DisplayList::new(10, 10);
        list.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), WHITE);
        list.fill_text("hi", 1.0, 2.0, TextStyle::bold(14.0), Align::Center, RED);
        assert_eq!(list.ops.len(), 2);
        assert!(matches!(list.ops[0], DrawOp::FillRect { .. }));
        assert_eq!(
            list.find_text("hi"),
            Some(&DrawOp::Text {
                text: "hi".to_string(),
                x: 1.0,
                y: 2.0,
                style: TextStyle::bold(14.0),
                align: Align::Center,
                color: RED,
            })
        );
    }

    #[test]
    fn fill_rect_is_clipped_to_canvas() {
        let Some(fonts) = fonts() else { return };
        let mut canvas = RasterCanvas::new(20, 20, &fonts);
        canvas.fill_rect(Rect::new(-5.0, -5.0, 100.0, 100.0), RED);
        let raster = canvas.into_raster();
        assert_eq!(raster.pixel(0, 0), Some(RED));
        assert_eq!(raster.pixel(19, 19), Some(RED));
    }

    #[test]
    fn stroke_rect_leaves_interior_untouched() {
        let Some(fonts) = fonts() else { return };
        let mut canvas = RasterCanvas::new(20, 20, &fonts);
        canvas.fill_rect(Rect::new(0.0, 0.0, 20.0, 20.0), WHITE);
        canvas.stroke_rect(Rect::new(2.0, 2.0, 10.0, 10.0), RED);
        let raster = canvas.into_raster();
        assert_eq!(raster.pixel(2, 2), Some(RED));
        assert_eq!(raster.pixel(12, 7), Some(RED));
        assert_eq!(raster.pixel(7, 7), Some(WHITE));
    }

    #[test]
    fn centered_text_straddles_anchor() {
        let Some(fonts) = fonts() else { return };
        let style = TextStyle::bold(20.0);
        let width = fonts.measure("Photo", style);
        assert!(width > 20.0);

        let mut canvas = RasterCanvas::new(200, 50, &fonts);
        canvas.fill_rect(Rect::new(0.0, 0.0, 200.0, 50.0), WHITE);
        canvas.fill_text("Photo", 100.0, 30.0, style, Align::Center, RED);
        let raster = canvas.into_raster();

        let inked = |range: std::ops::Range<u32>| {
            range.into_iter().any(|x| (10..40).any(|y| raster.pixel(x, y) != Some(WHITE)))
        };
        assert!(inked(70..100));
        assert!(inked(100..130));
        assert!(!inked(0..60));
    }

    #[test]
    fn pre_base_vowel_sign_is_placed_before_its_consonant() {
        let Some(fonts) = fonts() else { return };
        let ka = fonts.font_for('\u{0915}', false);
        let face = fonts.face(ka, false);
        if !face.covers('\u{0915}') {
            eprintln!("skipping: no Devanagari font");
            return;
        }
        let ka_id = face.font.glyph('\u{0915}').id().0;

        // क followed by ि is stored consonant first but drawn sign first
        let (glyphs, width) = fonts.shape("\u{0915}\u{093F}", TextStyle::regular(12.0));
        let ka_x = glyphs
            .iter()
            .find(|g| g.id == ka_id)
            .map(|g| g.x)
            .expect("consonant glyph missing");
        let sign_x = glyphs
            .iter()
            .find(|g| g.id != ka_id)
            .map(|g| g.x)
            .expect("vowel sign glyph missing");
        assert!(sign_x < ka_x, "sign at {}, consonant at {}", sign_x, ka_x);
        assert!(width > 0.0);
    }

    #[test]
    fn latin_text_is_a_single_run() {
        let Some(fonts) = fonts() else { return };
        assert_eq!(fonts.runs("Print Date & Time :", true), vec![(0, "Print Date & Time :")]);
        let (glyphs, width) = fonts.shape("AB", TextStyle::regular(14.0));
        assert_eq!(glyphs.len(), 2);
        assert_eq!(glyphs[0].x, 0.0);
        assert!(glyphs[1].x > 0.0 && glyphs[1].x < width);
    }

    #[test]
    fn pixel_outside_raster_is_none() {
        let raster = Raster::from_image(RgbaImage::from_pixel(4, 4, WHITE));
        assert_eq!(raster.pixel(3, 3), Some(WHITE));
        assert_eq!(raster.pixel(4, 0), None);
    }

    #[test]
    fn png_encoding_produces_png_signature() {
        let raster = Raster::from_image(RgbaImage::from_pixel(4, 4, WHITE));
        let png = raster.to_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        assert!(raster.to_data_url().unwrap().starts_with("data:image/png;base64,"));
    }
}
