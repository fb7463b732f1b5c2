//! PNG, PDF and print output for a rendered admit card.

use crate::canvas::Raster;
use crate::error::ExportError;
use ::image::{Rgb, RgbImage, Rgba};
use printpdf::*;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

// ============================================================================
// Constants
// ============================================================================

/// A4 portrait in mm
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

const FILE_PREFIX: &str = "admit-card";

// ============================================================================
// File Names
// ============================================================================

/// `admit-card-<roll>` with the roll number trimmed and made filename safe.
pub fn file_stem(roll_number: &str) -> Result<String, ExportError> {
    let sanitized = roll_number
        .trim()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect::<String>();
    if sanitized.is_empty() {
        return Err(ExportError::MissingRollNumber);
    }
    Ok(format!("{}-{}", FILE_PREFIX, sanitized))
}

fn output_path(dir: &Path, roll_number: &str, suffix: &str) -> Result<PathBuf, ExportError> {
    let name = format!("{}{}", file_stem(roll_number)?, suffix);
    fs::create_dir_all(dir)?;
    Ok(dir.join(name))
}

// ============================================================================
// PNG
// ============================================================================

pub fn write_png(raster: &Raster, dir: &Path, roll_number: &str) -> Result<PathBuf, ExportError> {
    let path = output_path(dir, roll_number, ".png")?;
    let bytes = raster.to_png().map_err(|e| ExportError::Png(e.to_string()))?;
    fs::write(&path, bytes)?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}

// ============================================================================
// PDF
// ============================================================================

/// Flatten onto white; the PDF image has no alpha channel.
fn composite_on_white(raster: &Raster) -> RgbImage {
    let (width, height) = (raster.width(), raster.height());
    let mut rgb = RgbImage::new(width, height);
    for (x, y, pixel) in raster.image().enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0;
        let over = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        rgb.put_pixel(x, y, Rgb([over(r), over(g), over(b)]));
    }
    rgb
}

/// Printed height of the raster when it spans the full page width.
pub fn image_height_mm(raster: &Raster) -> f32 {
    PAGE_WIDTH_MM * raster.height() as f32 / raster.width() as f32
}

/// Single A4 page with the raster across its full width, anchored at the top.
pub fn pdf_bytes(raster: &Raster, title: &str) -> Result<Vec<u8>, ExportError> {
    let (doc, page, layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let layer = doc.get_page(page).get_layer(layer);

    let (width_px, height_px) = (raster.width(), raster.height());
    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: composite_on_white(raster).into_raw(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // DPI that maps the pixel width onto the page width
    let dpi = width_px as f32 / (PAGE_WIDTH_MM / 25.4);
    image.add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(0.0)),
            translate_y: Some(Mm(PAGE_HEIGHT_MM - image_height_mm(raster))),
            dpi: Some(dpi),
            ..Default::default()
        },
    );

    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    writer
        .into_inner()
        .map_err(|e| ExportError::Pdf(e.to_string()))
}

pub fn write_pdf(raster: &Raster, dir: &Path, roll_number: &str) -> Result<PathBuf, ExportError> {
    let path = output_path(dir, roll_number, ".pdf")?;
    fs::write(&path, pdf_bytes(raster, "Admit Card")?)?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}

// ============================================================================
// Print
// ============================================================================

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A page holding only the card image that prints itself and closes on load.
pub fn print_page_html(raster: &Raster, candidate_name: &str) -> Result<String, ExportError> {
    let data_url = raster
        .to_data_url()
        .map_err(|e| ExportError::Png(e.to_string()))?;
    Ok(format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{} - Admit Card</title>\n\
         <style>body {{ margin: 0; }} img {{ width: 100%; }}</style>\n\
         </head>\n\
         <body onload=\"window.print();window.close()\">\n\
         <img src=\"{}\" alt=\"Admit Card\">\n\
         </body>\n\
         </html>\n",
        escape_html(candidate_name.trim()),
        data_url
    ))
}

pub fn write_print_page(
    raster: &Raster,
    dir: &Path,
    roll_number: &str,
    candidate_name: &str,
) -> Result<PathBuf, ExportError> {
    let path = output_path(dir, roll_number, "-print.html")?;
    fs::write(&path, print_page_html(raster, candidate_name)?)?;
    Ok(path)
}

/// Write the print page and hand it to the system browser.
pub fn print(
    raster: &Raster,
    dir: &Path,
    roll_number: &str,
    candidate_name: &str,
) -> Result<PathBuf, ExportError> {
    let path = write_print_page(raster, dir, roll_number, candidate_name)?;
    let target = fs::canonicalize(&path)?;
    webbrowser::open(&target.to_string_lossy()).map_err(|e| ExportError::Print(e.to_string()))?;
    log::info!("Opened print page {}", path.display());
    Ok(path)
}
