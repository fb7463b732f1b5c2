//! Admit card layout.
//!
//! Everything is placed at fixed pixel coordinates on an 800x1130 page
//! (A4 at 96 DPI). A cursor only comes into play below the subject table,
//! whose height depends on the number of rows.

use crate::canvas::{Align, Canvas, FontSet, Raster, RasterCanvas, Rect, TextStyle};
use crate::config::RenderConfig;
use crate::error::{ImageError, RenderError};
use crate::media::{describe_reference, ImageLoader, SourceLoader};
use crate::record::{DocumentRecord, SubjectRow, TextField};
use chrono::NaiveDateTime;
use std::cell::RefCell;
use std::rc::Rc;

// ============================================================================
// Layout Constants
// ============================================================================

pub mod layout {
    use crate::canvas::Rect;
    use ::image::Rgba;

    pub const CANVAS_WIDTH: u32 = 800;
    pub const CANVAS_HEIGHT: u32 = 1130;
    const W: f32 = CANVAS_WIDTH as f32;

    pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
    pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    pub const PHOTO_PLACEHOLDER_FILL: Rgba<u8> = Rgba([0xb3, 0x00, 0x00, 255]);
    pub const TABLE_HEADER_FILL: Rgba<u8> = Rgba([0xb3, 0xd7, 0xff, 255]);
    pub const TABLE_EVEN_ROW_FILL: Rgba<u8> = Rgba([0xf2, 0xf2, 0xf2, 255]);
    pub const TABLE_ODD_ROW_FILL: Rgba<u8> = WHITE;

    /// Institution logo, top-left
    pub const LOGO: Rect = Rect::new(30.0, 60.0, 120.0, 120.0);

    /// Baselines of the two centred header lines
    pub const TITLE_Y: f32 = 75.0;
    pub const SESSION_Y: f32 = 105.0;

    /// Student photo, top-right, with a border 5px outside it
    pub const PHOTO: Rect = Rect::new(W - 180.0, 180.0, 120.0, 140.0);
    pub const PHOTO_BORDER: Rect = Rect::new(W - 185.0, 175.0, 130.0, 150.0);
    /// Drawn when the photo cannot be loaded. It sits 30px right of the photo slot.
    pub const PHOTO_PLACEHOLDER: Rect = Rect::new(W - 150.0, 180.0, 120.0, 140.0);
    /// Student signature, 2px under the photo
    pub const SIGNATURE: Rect = Rect::new(W - 180.0, 180.0 + 140.0 + 2.0, 120.0, 30.0);

    /// Key/value grid
    pub const LABEL_X: f32 = 30.0;
    pub const VALUE_X: f32 = 170.0;
    pub const SECOND_LABEL_X: f32 = 330.0;
    pub const SECOND_VALUE_X: f32 = 420.0;

    /// Subject table
    pub const TABLE_X: f32 = 30.0;
    pub const TABLE_Y: f32 = 520.0;
    pub const TABLE_WIDTH: f32 = W - 60.0;
    pub const TABLE_ROW_HEIGHT: f32 = 30.0;
    pub const PAPER_COL_WIDTH: f32 = 100.0;
    pub const SUBJECT_COL_WIDTH: f32 = 150.0;
    /// Subject name column takes what is left of the table width
    pub const SUBJECT_NAME_COL_WIDTH: f32 = TABLE_WIDTH - PAPER_COL_WIDTH - SUBJECT_COL_WIDTH;
    /// Baseline offset of cell text from the row top
    pub const CELL_BASELINE: f32 = TABLE_ROW_HEIGHT / 2.0 + 5.0;
    pub const SUBJECT_NAME_PADDING: f32 = 10.0;

    /// Left margin of the note and instruction text
    pub const TEXT_X: f32 = 30.0;
    pub const NOTE_GAP: f32 = 40.0;

    /// Controller signature, relative to the cursor after the notes
    pub const CONTROLLER_SIGNATURE_X: f32 = W - 200.0;
    pub const CONTROLLER_SIGNATURE_RISE: f32 = 20.0;
    pub const CONTROLLER_SIGNATURE_WIDTH: f32 = 180.0;
    pub const CONTROLLER_SIGNATURE_HEIGHT: f32 = 60.0;
    pub const CONTROLLER_LABEL_X: f32 = W - 110.0;
    pub const CONTROLLER_LABEL_DROP: f32 = 60.0;

    pub const INSTRUCTIONS_GAP: f32 = 80.0;
    pub const INSTRUCTIONS_HEADING_X: f32 = W / 6.2;
    pub const ROLL_NUMBER_X: f32 = W / 2.2;
    /// The bottom roll number is drawn this far above the cursor
    pub const ROLL_NUMBER_RISE: f32 = 18.0;
    pub const PRINT_STAMP_VALUE_X: f32 = 150.0;
}

use layout::*;

const TITLE_STYLE: TextStyle = TextStyle::bold(24.0);
const SESSION_STYLE: TextStyle = TextStyle::regular(16.0);
const PLACEHOLDER_STYLE: TextStyle = TextStyle::bold(20.0);
const LABEL_STYLE: TextStyle = TextStyle::bold(14.0);
const VALUE_STYLE: TextStyle = TextStyle::regular(14.0);
const CELL_STYLE: TextStyle = TextStyle::regular(12.0);
const BODY_STYLE: TextStyle = TextStyle::regular(12.0);
const SMALL_HEADING_STYLE: TextStyle = TextStyle::bold(12.0);

// ============================================================================
// Static Text
// ============================================================================

enum DetailValue {
    Text(TextField),
    ExamCategory,
    ExamType,
    Category,
    Gender,
}

struct DetailCell {
    label: &'static str,
    label_at: (f32, f32),
    value_at: (f32, f32),
    value: DetailValue,
}

const fn cell(label: &'static str, label_x: f32, value_x: f32, y: f32, value: DetailValue) -> DetailCell {
    DetailCell {
        label,
        label_at: (label_x, y),
        value_at: (value_x, y),
        value,
    }
}

/// The key/value grid. "Exam Form Number" breaks the grid: no colon, and its
/// value sits one line lower under the label.
const DETAILS: &[DetailCell] = &[
    cell("Exam Center Name :", LABEL_X, VALUE_X, 200.0, DetailValue::Text(TextField::ExamCenterName)),
    cell("College Name :", LABEL_X, VALUE_X, 230.0, DetailValue::Text(TextField::CollegeName)),
    cell("Program Name :", LABEL_X, VALUE_X, 260.0, DetailValue::Text(TextField::ProgramName)),
    cell("Candidate Name :", LABEL_X, VALUE_X, 290.0, DetailValue::Text(TextField::CandidateName)),
    cell("Father's Name :", LABEL_X, VALUE_X, 320.0, DetailValue::Text(TextField::FatherName)),
    cell("Mother's Name :", LABEL_X, VALUE_X, 350.0, DetailValue::Text(TextField::MotherName)),
    cell("Enrollment Number :", LABEL_X, VALUE_X, 390.0, DetailValue::Text(TextField::EnrollmentNumber)),
    cell("Roll Number :", SECOND_LABEL_X, SECOND_VALUE_X, 390.0, DetailValue::Text(TextField::RollNumber)),
    DetailCell {
        label: "Exam Form Number",
        label_at: (615.0, 390.0),
        value_at: (650.0, 410.0),
        value: DetailValue::Text(TextField::ExamFormNumber),
    },
    cell("Exam Category :", LABEL_X, VALUE_X, 420.0, DetailValue::ExamCategory),
    cell("Exam Type :", SECOND_LABEL_X, SECOND_VALUE_X, 420.0, DetailValue::ExamType),
    cell("Category :", LABEL_X, VALUE_X, 450.0, DetailValue::Category),
    cell("Gender :", SECOND_LABEL_X, SECOND_VALUE_X, 450.0, DetailValue::Gender),
    cell("Semester / Year :", LABEL_X, VALUE_X, 480.0, DetailValue::Text(TextField::SemesterYear)),
];

const TABLE_HEADINGS: [&str; 3] = ["Paper . No.", "Subject", "Subject Name"];

const NOTE_HEADING: &str = "Note";

/// Note lines with the cursor advance taken before each one.
const NOTE_LINES: &[(f32, &str)] = &[
    (25.0, "आपके द्वारा परीक्षा फार्म में दिए गए अर्हता विवरण की जाचोपरांत कोई अनियमितता या कूटरचित तथ्य तथा"),
    (20.0, "प्रवेशित (काउंसलिंग, विश्वविद्यालय) के निर्देशों के विपरीत पाए जाने पर परीक्षाफल निरस्त कर दिया जाएगा।"),
    (25.0, "Students failing to bring this Admit Card along with a valid Government issued photo"),
    (20.0, "identity proof shall not be allowed to appear in the examination. This Admit Card is"),
    (20.0, "provisional - The result shall be declared subject to eligibility of the candidate"),
];

const CONTROLLER_LABEL: &str = "Controller Of Examination";

const INSTRUCTIONS_HEADING: &str = "अभ्यर्थियों के लिए आवश्यक निर्देश";

const INSTRUCTION_LINES: &[(f32, &str)] = &[
    (30.0, "1. अभ्यर्थी को परीक्षा केंद्र मेश प्रवेश पत्र के साथ भारत सरकार द्वारा जारी फोटो पहचान पत्र लाना अनिवार्य है।"),
    (25.0, "2. उत्तर पुस्तिका पर अपने अनुक्रमांक निम्न्वतलिखें - अनुक्रमांक ( अंकों में)"),
];
const ROLL_NUMBER_GAP: f32 = 30.0;
const PRINT_STAMP_GAP: f32 = 40.0;
const PRINT_STAMP_LABEL: &str = "Print Date & Time :";

/// `MM/DD/YY    hh:mm AM`, as printed at the foot of the card.
pub fn format_print_timestamp(at: &NaiveDateTime) -> String {
    at.format("%m/%d/%y    %I:%M %p").to_string()
}

// ============================================================================
// Layout
// ============================================================================

/// What happened to one image region of the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOutcome {
    Drawn,
    /// Region left empty
    Skipped,
    /// The "Photo Here" block was drawn instead
    Placeholder,
    /// Another image was drawn in its place
    Substituted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub logo: ImageOutcome,
    pub photo: ImageOutcome,
    pub signature: ImageOutcome,
    pub controller_signature: ImageOutcome,
    /// Header row plus one row per subject
    pub table: Rect,
    /// Baseline of the print stamp, the last thing drawn
    pub last_baseline: f32,
}

fn load_and_draw<C: Canvas>(
    canvas: &mut C,
    loader: &dyn ImageLoader,
    reference: &str,
    rect: Rect,
) -> Result<(), ImageError> {
    let image = loader.load(reference)?;
    canvas.draw_image(&image, rect)
}

/// Lay out a complete admit card on `canvas`.
///
/// Image failures only affect their own region; this never fails.
pub fn draw_admit_card<C: Canvas>(
    canvas: &mut C,
    record: &DocumentRecord,
    loader: &dyn ImageLoader,
    controller_signature: &str,
    printed_at: &str,
) -> RenderSummary {
    let width = canvas.width() as f32;
    let height = canvas.height() as f32;
    canvas.fill_rect(Rect::new(0.0, 0.0, width, height), WHITE);

    let logo = draw_logo(canvas, loader, record);
    draw_header(canvas, record);
    let (photo, signature) = draw_photo_block(canvas, loader, record);
    draw_details(canvas, record);

    let table = draw_subject_table(canvas, &record.subjects);
    let y = draw_notes(canvas, table.y + table.h);
    let controller = draw_controller_signature(canvas, loader, record, controller_signature, y);
    let y = draw_instructions(canvas, record, y);
    let last_baseline = draw_print_stamp(canvas, printed_at, y);

    RenderSummary {
        logo,
        photo,
        signature,
        controller_signature: controller,
        table,
        last_baseline,
    }
}

fn draw_logo<C: Canvas>(canvas: &mut C, loader: &dyn ImageLoader, record: &DocumentRecord) -> ImageOutcome {
    match load_and_draw(canvas, loader, &record.school_logo, LOGO) {
        Ok(()) => ImageOutcome::Drawn,
        Err(e) => {
            log::error!(
                "Could not load university logo {}: {}",
                describe_reference(&record.school_logo),
                e
            );
            ImageOutcome::Skipped
        }
    }
}

fn draw_header<C: Canvas>(canvas: &mut C, record: &DocumentRecord) {
    let center = canvas.width() as f32 / 2.0;
    canvas.fill_text(&record.school_name, center, TITLE_Y, TITLE_STYLE, Align::Center, BLACK);
    canvas.fill_text(
        &format!("Provisional Admit Card (Session-{})", record.session_years),
        center,
        SESSION_Y,
        SESSION_STYLE,
        Align::Center,
        BLACK,
    );
}

/// Photo with its border and the signature below it. The signature is only
/// attempted once the photo is on the card.
fn draw_photo_block<C: Canvas>(
    canvas: &mut C,
    loader: &dyn ImageLoader,
    record: &DocumentRecord,
) -> (ImageOutcome, ImageOutcome) {
    let photo = loader
        .load(&record.student_photo)
        .and_then(|image| {
            canvas.stroke_rect(PHOTO_BORDER, BLACK);
            canvas.draw_image(&image, PHOTO)
        });

    if let Err(e) = photo {
        log::error!(
            "Could not load student photo {}: {}",
            describe_reference(&record.student_photo),
            e
        );
        draw_photo_placeholder(canvas);
        return (ImageOutcome::Placeholder, ImageOutcome::Skipped);
    }

    let signature = match load_and_draw(canvas, loader, &record.student_signature, SIGNATURE) {
        Ok(()) => ImageOutcome::Drawn,
        Err(e) => {
            log::error!(
                "Could not load student signature {}: {}",
                describe_reference(&record.student_signature),
                e
            );
            ImageOutcome::Skipped
        }
    };
    (ImageOutcome::Drawn, signature)
}

fn draw_photo_placeholder<C: Canvas>(canvas: &mut C) {
    let r = PHOTO_PLACEHOLDER;
    canvas.fill_rect(r, PHOTO_PLACEHOLDER_FILL);
    let cx = r.x + r.w / 2.0;
    let cy = r.y + r.h / 2.0;
    canvas.fill_text("Photo", cx, cy - 10.0, PLACEHOLDER_STYLE, Align::Center, WHITE);
    canvas.fill_text("Here", cx, cy + 20.0, PLACEHOLDER_STYLE, Align::Center, WHITE);
}

fn draw_details<C: Canvas>(canvas: &mut C, record: &DocumentRecord) {
    for detail in DETAILS {
        let value = match &detail.value {
            DetailValue::Text(field) => record.text(*field),
            DetailValue::ExamCategory => record.exam_category.as_str(),
            DetailValue::ExamType => record.exam_type.as_str(),
            DetailValue::Category => record.category.as_str(),
            DetailValue::Gender => record.gender.as_str(),
        };
        let (lx, ly) = detail.label_at;
        let (vx, vy) = detail.value_at;
        canvas.fill_text(detail.label, lx, ly, LABEL_STYLE, Align::Left, BLACK);
        canvas.fill_text(value, vx, vy, VALUE_STYLE, Align::Left, BLACK);
    }
}

// ============================================================================
// Subject Table
// ============================================================================

fn draw_row_frame<C: Canvas>(canvas: &mut C, y: f32, fill: ::image::Rgba<u8>) {
    let row = Rect::new(TABLE_X, y, TABLE_WIDTH, TABLE_ROW_HEIGHT);
    canvas.fill_rect(row, fill);
    canvas.stroke_rect(row, BLACK);

    let first = TABLE_X + PAPER_COL_WIDTH;
    let second = first + SUBJECT_COL_WIDTH;
    canvas.line((first, y), (first, y + TABLE_ROW_HEIGHT), BLACK);
    canvas.line((second, y), (second, y + TABLE_ROW_HEIGHT), BLACK);
}

fn column_centers() -> [f32; 3] {
    [
        TABLE_X + PAPER_COL_WIDTH / 2.0,
        TABLE_X + PAPER_COL_WIDTH + SUBJECT_COL_WIDTH / 2.0,
        TABLE_X + PAPER_COL_WIDTH + SUBJECT_COL_WIDTH + SUBJECT_NAME_COL_WIDTH / 2.0,
    ]
}

/// Header plus one fixed-height row per subject. Long text is not wrapped.
/// Returns the area covered by the table.
fn draw_subject_table<C: Canvas>(canvas: &mut C, subjects: &[SubjectRow]) -> Rect {
    let centers = column_centers();
    let mut y = TABLE_Y;

    draw_row_frame(canvas, y, TABLE_HEADER_FILL);
    for (heading, x) in TABLE_HEADINGS.iter().zip(centers) {
        canvas.fill_text(heading, x, y + CELL_BASELINE, LABEL_STYLE, Align::Center, BLACK);
    }
    y += TABLE_ROW_HEIGHT;

    for (index, subject) in subjects.iter().enumerate() {
        let fill = if index % 2 == 0 {
            TABLE_EVEN_ROW_FILL
        } else {
            TABLE_ODD_ROW_FILL
        };
        draw_row_frame(canvas, y, fill);

        let baseline = y + CELL_BASELINE;
        canvas.fill_text(&subject.paper_no, centers[0], baseline, CELL_STYLE, Align::Center, BLACK);
        canvas.fill_text(&subject.subject, centers[1], baseline, CELL_STYLE, Align::Center, BLACK);
        canvas.fill_text(
            &subject.subject_name,
            TABLE_X + PAPER_COL_WIDTH + SUBJECT_COL_WIDTH + SUBJECT_NAME_PADDING,
            baseline,
            CELL_STYLE,
            Align::Left,
            BLACK,
        );
        y += TABLE_ROW_HEIGHT;
    }

    Rect::new(TABLE_X, TABLE_Y, TABLE_WIDTH, y - TABLE_Y)
}

// ============================================================================
// Notes, Signatures and Footer
// ============================================================================

/// Returns the cursor after the last note line.
fn draw_notes<C: Canvas>(canvas: &mut C, table_bottom: f32) -> f32 {
    let mut y = table_bottom + NOTE_GAP;
    canvas.fill_text(NOTE_HEADING, TEXT_X, y, LABEL_STYLE, Align::Left, BLACK);
    for (advance, line) in NOTE_LINES {
        y += advance;
        canvas.fill_text(line, TEXT_X, y, BODY_STYLE, Align::Left, BLACK);
    }
    y
}

/// The controller's signature falls back to the student's own signature.
fn draw_controller_signature<C: Canvas>(
    canvas: &mut C,
    loader: &dyn ImageLoader,
    record: &DocumentRecord,
    reference: &str,
    y: f32,
) -> ImageOutcome {
    let rect = Rect::new(
        CONTROLLER_SIGNATURE_X,
        y - CONTROLLER_SIGNATURE_RISE,
        CONTROLLER_SIGNATURE_WIDTH,
        CONTROLLER_SIGNATURE_HEIGHT,
    );

    let outcome = match load_and_draw(canvas, loader, reference, rect) {
        Ok(()) => ImageOutcome::Drawn,
        Err(e) => {
            log::info!(
                "Could not load controller signature {} ({}), using student signature as fallback",
                describe_reference(reference),
                e
            );
            match load_and_draw(canvas, loader, &record.student_signature, rect) {
                Ok(()) => ImageOutcome::Substituted,
                Err(e) => {
                    log::error!("Could not load controller signature: {}", e);
                    return ImageOutcome::Skipped;
                }
            }
        }
    };

    canvas.fill_text(
        CONTROLLER_LABEL,
        CONTROLLER_LABEL_X,
        y + CONTROLLER_LABEL_DROP,
        SMALL_HEADING_STYLE,
        Align::Center,
        BLACK,
    );
    outcome
}

/// Instructions and the roll number repeated for the answer book.
/// Returns the cursor below the roll number.
fn draw_instructions<C: Canvas>(canvas: &mut C, record: &DocumentRecord, y: f32) -> f32 {
    let mut y = y + INSTRUCTIONS_GAP;
    canvas.fill_text(
        INSTRUCTIONS_HEADING,
        INSTRUCTIONS_HEADING_X,
        y,
        SMALL_HEADING_STYLE,
        Align::Center,
        BLACK,
    );

    for (advance, line) in INSTRUCTION_LINES {
        y += advance;
        canvas.fill_text(line, TEXT_X, y, BODY_STYLE, Align::Left, BLACK);
    }

    y += ROLL_NUMBER_GAP;
    canvas.fill_text(
        &record.roll_number,
        ROLL_NUMBER_X,
        y - ROLL_NUMBER_RISE,
        LABEL_STYLE,
        Align::Left,
        BLACK,
    );
    y
}

fn draw_print_stamp<C: Canvas>(canvas: &mut C, printed_at: &str, y: f32) -> f32 {
    let y = y + PRINT_STAMP_GAP;
    canvas.fill_text(PRINT_STAMP_LABEL, TEXT_X, y, BODY_STYLE, Align::Left, BLACK);
    canvas.fill_text(printed_at, PRINT_STAMP_VALUE_X, y, BODY_STYLE, Align::Left, BLACK);
    y
}

// ============================================================================
// Renderer
// ============================================================================

/// Renders records to rasters.
///
/// Fonts play the part of the drawing context: they are loaded on first use
/// and a render without them fails as a whole.
pub struct Renderer {
    config: RenderConfig,
    loader: Box<dyn ImageLoader>,
    fonts: RefCell<Option<Rc<FontSet>>>,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        let loader = SourceLoader::new(config.image_timeout);
        Self::with_loader(config, Box::new(loader))
    }

    pub fn with_loader(config: RenderConfig, loader: Box<dyn ImageLoader>) -> Self {
        Renderer {
            config,
            loader,
            fonts: RefCell::new(None),
        }
    }

    /// Use an already loaded font set instead of the configured paths.
    pub fn with_fonts(self, fonts: FontSet) -> Self {
        *self.fonts.borrow_mut() = Some(Rc::new(fonts));
        self
    }

    fn context(&self) -> Result<Rc<FontSet>, RenderError> {
        if let Some(fonts) = self.fonts.borrow().as_ref() {
            return Ok(Rc::clone(fonts));
        }
        let cfg = &self.config.fonts;
        let fonts = Rc::new(FontSet::load(
            cfg.regular.as_deref(),
            cfg.bold.as_deref(),
            &cfg.fallbacks,
        )?);
        *self.fonts.borrow_mut() = Some(Rc::clone(&fonts));
        Ok(fonts)
    }

    /// Draw `record` with `printed_at` as the print stamp.
    pub fn render(&self, record: &DocumentRecord, printed_at: NaiveDateTime) -> Result<Raster, RenderError> {
        let fonts = self.context()?;
        let mut canvas = RasterCanvas::new(CANVAS_WIDTH, CANVAS_HEIGHT, &fonts);
        let summary = draw_admit_card(
            &mut canvas,
            record,
            self.loader.as_ref(),
            &self.config.controller_signature,
            &format_print_timestamp(&printed_at),
        );
        log::debug!("Rendered admit card for {}: {:?}", record.roll_number.trim(), summary);
        Ok(canvas.into_raster())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DisplayList, DrawOp};
    use crate::record::SubjectId;
    use ::image::{DynamicImage, RgbaImage};
    use crate::media::LoadedImage;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    /// Serves solid images of a distinct size per reference.
    struct FakeLoader {
        sizes: HashMap<String, (u32, u32)>,
    }

    impl FakeLoader {
        fn failing() -> Self {
            FakeLoader {
                sizes: HashMap::new(),
            }
        }

        fn with(entries: &[(&str, (u32, u32))]) -> Self {
            FakeLoader {
                sizes: entries.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            }
        }
    }

    impl ImageLoader for FakeLoader {
        fn load(&self, reference: &str) -> Result<LoadedImage, ImageError> {
            match self.sizes.get(reference) {
                Some((w, h)) => Ok(LoadedImage::Raster(DynamicImage::ImageRgba8(
                    RgbaImage::from_pixel(*w, *h, ::image::Rgba([0, 128, 0, 255])),
                ))),
                None => Err(ImageError::MissingReference),
            }
        }
    }

    fn record_with_refs() -> DocumentRecord {
        let mut record = DocumentRecord::sample();
        record.school_logo = "logo".to_string();
        record.student_photo = "photo".to_string();
        record.student_signature = "sign".to_string();
        record
    }

    fn one_subject_record() -> DocumentRecord {
        let mut record = record_with_refs();
        record.candidate_name = "A B".to_string();
        record.roll_number = "123".to_string();
        record.subjects = vec![SubjectRow {
            id: SubjectId::new("subject-1"),
            paper_no: "Paper - 1".to_string(),
            subject: "X".to_string(),
            subject_name: "Y".to_string(),
        }];
        record
    }

    fn layout(record: &DocumentRecord, loader: &FakeLoader) -> (DisplayList, RenderSummary) {
        let mut list = DisplayList::new(CANVAS_WIDTH, CANVAS_HEIGHT);
        let summary = draw_admit_card(&mut list, record, loader, "controller", "01/02/25    03:04 PM");
        (list, summary)
    }

    fn text_at(list: &DisplayList, text: &str) -> (f32, f32) {
        match list.find_text(text) {
            Some(DrawOp::Text { x, y, .. }) => (*x, *y),
            other => panic!("text {:?} not drawn: {:?}", text, other),
        }
    }

    #[test]
    fn print_timestamp_format() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 13)
            .unwrap()
            .and_hms_opt(18, 3, 0)
            .unwrap();
        assert_eq!(format_print_timestamp(&at), "05/13/24    06:03 PM");
    }

    #[test]
    fn background_is_filled_first() {
        let (list, _) = layout(&record_with_refs(), &FakeLoader::failing());
        assert_eq!(
            list.ops[0],
            DrawOp::FillRect {
                rect: Rect::new(0.0, 0.0, 800.0, 1130.0),
                color: WHITE,
            }
        );
    }

    #[test]
    fn all_images_drawn_when_they_resolve() {
        let loader = FakeLoader::with(&[
            ("logo", (10, 10)),
            ("photo", (11, 11)),
            ("sign", (12, 12)),
            ("controller", (13, 13)),
        ]);
        let (list, summary) = layout(&record_with_refs(), &loader);
        assert_eq!(summary.logo, ImageOutcome::Drawn);
        assert_eq!(summary.photo, ImageOutcome::Drawn);
        assert_eq!(summary.signature, ImageOutcome::Drawn);
        assert_eq!(summary.controller_signature, ImageOutcome::Drawn);

        let images = list.images();
        assert_eq!(
            images,
            vec![
                &DrawOp::Image { rect: LOGO, source_size: (10, 10) },
                &DrawOp::Image { rect: PHOTO, source_size: (11, 11) },
                &DrawOp::Image {
                    rect: Rect::new(620.0, 322.0, 120.0, 30.0),
                    source_size: (12, 12)
                },
                &DrawOp::Image {
                    rect: Rect::new(600.0, summary.table.y + summary.table.h + 150.0 - 20.0, 180.0, 60.0),
                    source_size: (13, 13)
                },
            ]
        );
        assert!(list.ops.contains(&DrawOp::StrokeRect {
            rect: Rect::new(615.0, 175.0, 130.0, 150.0),
            color: BLACK,
        }));
    }

    #[test]
    fn failing_images_degrade_without_aborting() {
        let (list, summary) = layout(&record_with_refs(), &FakeLoader::failing());
        assert_eq!(summary.logo, ImageOutcome::Skipped);
        assert_eq!(summary.photo, ImageOutcome::Placeholder);
        assert_eq!(summary.signature, ImageOutcome::Skipped);
        assert_eq!(summary.controller_signature, ImageOutcome::Skipped);
        assert!(list.images().is_empty());

        assert!(list.ops.contains(&DrawOp::FillRect {
            rect: Rect::new(650.0, 180.0, 120.0, 140.0),
            color: PHOTO_PLACEHOLDER_FILL,
        }));
        assert_eq!(text_at(&list, "Photo"), (710.0, 240.0));
        assert_eq!(text_at(&list, "Here"), (710.0, 270.0));
        // Footer is still drawn.
        assert!(list.find_text(PRINT_STAMP_LABEL).is_some());
        assert!(list.find_text(CONTROLLER_LABEL).is_none());
    }

    #[test]
    fn signature_not_attempted_without_photo() {
        let loader = FakeLoader::with(&[("sign", (12, 12))]);
        let (list, summary) = layout(&record_with_refs(), &loader);
        assert_eq!(summary.photo, ImageOutcome::Placeholder);
        assert_eq!(summary.signature, ImageOutcome::Skipped);
        // The only drawn image is the signature standing in for the controller's.
        assert_eq!(summary.controller_signature, ImageOutcome::Substituted);
        assert_eq!(list.images().len(), 1);
        assert!(list.find_text(CONTROLLER_LABEL).is_some());
    }

    #[test]
    fn details_follow_fixed_grid() {
        let (list, _) = layout(&record_with_refs(), &FakeLoader::failing());
        assert_eq!(text_at(&list, "Exam Center Name :"), (30.0, 200.0));
        assert_eq!(text_at(&list, "Mother's Name :"), (30.0, 350.0));
        assert_eq!(text_at(&list, "Roll Number :"), (330.0, 390.0));
        assert_eq!(text_at(&list, "Exam Form Number"), (615.0, 390.0));
        assert_eq!(text_at(&list, "260074238"), (650.0, 410.0));
        assert_eq!(text_at(&list, "Gender :"), (330.0, 450.0));
        assert_eq!(text_at(&list, "Female"), (420.0, 450.0));
        assert_eq!(text_at(&list, "Semester / Year :"), (30.0, 480.0));
    }

    #[test]
    fn single_subject_table_is_two_rows_tall() {
        let (list, summary) = layout(&one_subject_record(), &FakeLoader::failing());
        assert_eq!(summary.table, Rect::new(30.0, 520.0, 740.0, 60.0));

        let row_frames: Vec<_> = list
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::StrokeRect { rect, .. } if rect.w == 740.0))
            .collect();
        assert_eq!(row_frames.len(), 2);
        assert!(list.ops.contains(&DrawOp::FillRect {
            rect: Rect::new(30.0, 520.0, 740.0, 30.0),
            color: TABLE_HEADER_FILL,
        }));
        assert!(list.ops.contains(&DrawOp::FillRect {
            rect: Rect::new(30.0, 550.0, 740.0, 30.0),
            color: TABLE_EVEN_ROW_FILL,
        }));
        for (top, bottom) in [(520.0, 550.0), (550.0, 580.0)] {
            for x in [130.0, 280.0] {
                assert!(
                    list.ops.contains(&DrawOp::Line {
                        from: (x, top),
                        to: (x, bottom),
                        color: BLACK,
                    }),
                    "missing column divider at x={} for row at y={}",
                    x,
                    top
                );
            }
        }
        let dividers = list.ops.iter().filter(|op| matches!(op, DrawOp::Line { .. })).count();
        assert_eq!(dividers, 4);
        assert_eq!(text_at(&list, "Paper . No."), (80.0, 540.0));
        assert_eq!(text_at(&list, "Subject Name"), (525.0, 540.0));
        assert_eq!(text_at(&list, "Paper - 1"), (80.0, 570.0));
        assert_eq!(text_at(&list, "X"), (205.0, 570.0));
        assert_eq!(text_at(&list, "Y"), (290.0, 570.0));
    }

    #[test]
    fn rows_alternate_tint() {
        let (list, summary) = layout(&record_with_refs(), &FakeLoader::failing());
        assert_eq!(summary.table.h, 7.0 * 30.0);
        let fills: Vec<_> = list
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillRect { rect, color } if rect.w == TABLE_WIDTH => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(fills.len(), 7);
        assert_eq!(fills[0], TABLE_HEADER_FILL);
        for (i, fill) in fills[1..].iter().enumerate() {
            let expected = if i % 2 == 0 { TABLE_EVEN_ROW_FILL } else { TABLE_ODD_ROW_FILL };
            assert_eq!(*fill, expected);
        }
    }

    #[test]
    fn footer_follows_table_cursor() {
        let (list, summary) = layout(&one_subject_record(), &FakeLoader::failing());
        let bottom = 580.0;
        assert_eq!(text_at(&list, NOTE_HEADING), (30.0, bottom + 40.0));
        let notes_end = bottom + 40.0 + 25.0 + 20.0 + 25.0 + 20.0 + 20.0;
        assert_eq!(
            text_at(&list, "provisional - The result shall be declared subject to eligibility of the candidate"),
            (30.0, notes_end)
        );
        let (hx, hy) = text_at(&list, INSTRUCTIONS_HEADING);
        assert!((hx - 800.0 / 6.2).abs() < 1e-3);
        assert_eq!(hy, notes_end + 80.0);
        let roll_cursor = notes_end + 80.0 + 30.0 + 25.0 + 30.0;
        // The roll number also appears in the grid; the footer copy is drawn last.
        let (rx, ry) = list
            .ops
            .iter()
            .rev()
            .find_map(|op| match op {
                DrawOp::Text { text, x, y, .. } if text == "123" => Some((*x, *y)),
                _ => None,
            })
            .unwrap();
        assert!((rx - 800.0 / 2.2).abs() < 1e-3);
        assert_eq!(ry, roll_cursor - 18.0);
        assert_eq!(text_at(&list, PRINT_STAMP_LABEL), (30.0, roll_cursor + 40.0));
        assert_eq!(text_at(&list, "01/02/25    03:04 PM"), (150.0, roll_cursor + 40.0));
        assert_eq!(summary.last_baseline, roll_cursor + 40.0);
    }

    #[test]
    fn stored_print_date_is_ignored() {
        let mut record = record_with_refs();
        record.print_date_time = "never printed".to_string();
        let (list, _) = layout(&record, &FakeLoader::failing());
        assert!(list.find_text("never printed").is_none());
    }

    #[test]
    fn render_is_deterministic_for_fixed_clock() {
        let fonts = match FontSet::discover() {
            Ok(fonts) => fonts,
            Err(e) => {
                eprintln!("skipping raster test: {}", e);
                return;
            }
        };
        let renderer = Renderer::with_loader(RenderConfig::default(), Box::new(FakeLoader::failing()))
            .with_fonts(fonts);
        let at = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(15, 4, 0)
            .unwrap();
        let record = one_subject_record();
        let first = renderer.render(&record, at).unwrap();
        let second = renderer.render(&record, at).unwrap();
        assert_eq!(first, second);
        assert_eq!((first.width(), first.height()), (800, 1130));
        // Inside the "Photo Here" block, clear of its text.
        assert_eq!(first.pixel(652, 182), Some(PHOTO_PLACEHOLDER_FILL));
        assert_eq!(first.pixel(5, 5), Some(WHITE));
        assert_eq!(first.pixel(800, 0), None);
    }

    #[test]
    fn render_without_fonts_fails() {
        let mut config = RenderConfig::default();
        config.fonts.regular = Some("/nonexistent/font.ttf".into());
        let renderer = Renderer::with_loader(config, Box::new(FakeLoader::failing()));
        let at = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(matches!(
            renderer.render(&DocumentRecord::sample(), at),
            Err(RenderError::FontLoad { .. })
        ));
    }
}
