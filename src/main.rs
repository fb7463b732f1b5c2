// admit-card: Generate exam admit cards as PNG or PDF

use admit_card::config::DEFAULT_IMAGE_TIMEOUT_SECS;
use admit_card::record::{ImageSlot, SubjectColumn, SubjectId};
use admit_card::{
    ConsoleNotifier, DocumentRecord, ExportError, FontConfig, FormState, Preview, RecordError,
    RenderConfig, Renderer,
};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("Invalid argument: {0}")]
    Argument(String),
}

// ============================================================================
// Data Structures
// ============================================================================

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Png,
    Pdf,
    Both,
    None,
}

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Generate exam admit cards as PNG or PDF")]
struct Args {
    /// Record file (JSON); the sample card is used when omitted
    #[arg(short, long)]
    record: Option<PathBuf>,

    /// Set a text or option field, e.g. --set rollNumber=123 (repeatable)
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    set: Vec<String>,

    /// Append a subject row (repeatable)
    #[arg(long, value_name = "CODE|NAME")]
    add_subject: Vec<String>,

    /// Remove a subject row by id (repeatable)
    #[arg(long, value_name = "ID")]
    remove_subject: Vec<String>,

    /// Edit one subject cell; column is paperNo, subject or subjectName
    #[arg(long, value_name = "ID|COLUMN|VALUE")]
    edit_subject: Vec<String>,

    /// University logo to upload (SVG or PNG)
    #[arg(long)]
    logo: Option<PathBuf>,

    /// Student photo to upload (PNG, JPEG, GIF or SVG)
    #[arg(long)]
    photo: Option<PathBuf>,

    /// Student signature to upload (SVG or PNG)
    #[arg(long)]
    signature: Option<PathBuf>,

    /// Files to export
    #[arg(short, long, value_enum, default_value = "both")]
    format: OutputFormat,

    /// Open a print page for the card in the system browser
    #[arg(long)]
    print: bool,

    /// Directory for exported files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Print the edited record as JSON and exit without rendering
    #[arg(long)]
    show_record: bool,

    /// Regular TrueType/OpenType font
    #[arg(long, env = "ADMIT_CARD_FONT")]
    font: Option<PathBuf>,

    /// Bold font (defaults to the regular one)
    #[arg(long, env = "ADMIT_CARD_BOLD_FONT")]
    bold_font: Option<PathBuf>,

    /// Extra fonts for glyphs the main fonts lack, e.g. Devanagari (repeatable)
    #[arg(long = "fallback-font")]
    fallback_fonts: Vec<PathBuf>,

    /// Controller of examination signature (file, URL or data URL)
    #[arg(long)]
    controller_signature: Option<String>,

    /// Timeout in seconds for remote images (0 waits indefinitely)
    #[arg(long, default_value_t = DEFAULT_IMAGE_TIMEOUT_SECS)]
    image_timeout: u64,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    env_logger::init_from_env(Env::default().default_filter_or("warn"));

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let args = Args::parse();
    let notifier = ConsoleNotifier;

    let record = match &args.record {
        Some(path) => DocumentRecord::load(path)?,
        None => DocumentRecord::sample(),
    };

    let mut form = FormState::new(record);
    let mut preview = Preview::connect(&mut form);

    apply_edits(&mut form, &args)?;

    for (slot, path) in [
        (ImageSlot::SchoolLogo, &args.logo),
        (ImageSlot::StudentPhoto, &args.photo),
        (ImageSlot::StudentSignature, &args.signature),
    ] {
        if let Some(path) = path {
            // Rejections are reported through the notifier and leave the record as is
            if let Err(e) = form.upload_image(slot, path, &notifier) {
                log::debug!("Upload for {} not applied: {}", slot.name(), e);
            }
        }
    }

    if args.show_record {
        let json = serde_json::to_string_pretty(form.record()).map_err(RecordError::from)?;
        println!("{}", json);
        return Ok(());
    }

    let renderer = Renderer::new(render_config(&args));
    preview.refresh(&renderer, &notifier);

    let dir = args.output_dir.as_path();
    let mut generated = Vec::new();
    if matches!(args.format, OutputFormat::Png | OutputFormat::Both) {
        generated.push(preview.download_png(dir)?);
    }
    if matches!(args.format, OutputFormat::Pdf | OutputFormat::Both) {
        generated.push(preview.download_pdf(dir)?);
    }
    if args.print {
        generated.push(preview.print(dir)?);
    }

    for path in &generated {
        println!("✓ Generated: {}", path.display());
    }
    if let Some(record) = preview.record() {
        println!("  Candidate: {}", record.candidate_name);
        println!("  Roll Number: {}", record.roll_number);
        println!("  Subjects: {}", record.subjects.len());
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn render_config(args: &Args) -> RenderConfig {
    let defaults = RenderConfig::default();
    RenderConfig {
        fonts: FontConfig {
            regular: args.font.clone(),
            bold: args.bold_font.clone(),
            fallbacks: args.fallback_fonts.clone(),
        },
        controller_signature: args
            .controller_signature
            .clone()
            .unwrap_or(defaults.controller_signature),
        image_timeout: match args.image_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        },
    }
}

fn split_arg<'a>(arg: &'a str, sep: char, parts: usize, expected: &str) -> Result<Vec<&'a str>, AppError> {
    let pieces: Vec<&str> = arg.splitn(parts, sep).collect();
    if pieces.len() != parts {
        return Err(AppError::Argument(format!("'{}' (expected {})", arg, expected)));
    }
    Ok(pieces)
}

fn apply_edits(form: &mut FormState, args: &Args) -> Result<(), AppError> {
    for assignment in &args.set {
        let parts = split_arg(assignment, '=', 2, "FIELD=VALUE")?;
        form.set_field(parts[0], parts[1])?;
    }

    for id in &args.remove_subject {
        if !form.remove_subject(&SubjectId::new(id.trim())) {
            log::warn!("Subject {} was not removed (unknown id or last row)", id);
        }
    }

    for row in &args.add_subject {
        let parts = split_arg(row, '|', 2, "CODE|NAME")?;
        let id = form.add_subject();
        form.update_subject(&id, SubjectColumn::Subject, parts[0].trim());
        form.update_subject(&id, SubjectColumn::SubjectName, parts[1].trim());
    }

    for edit in &args.edit_subject {
        let parts = split_arg(edit, '|', 3, "ID|COLUMN|VALUE")?;
        let column: SubjectColumn = parts[1].parse()?;
        if !form.update_subject(&SubjectId::new(parts[0].trim()), column, parts[2]) {
            log::warn!("No subject with id {}", parts[0].trim());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("admit-card").chain(extra.iter().copied()))
    }

    #[test]
    fn image_timeout_defaults_to_thirty_seconds() {
        let config = render_config(&args(&[]));
        assert_eq!(config.image_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn zero_image_timeout_waits_indefinitely() {
        let config = render_config(&args(&["--image-timeout", "0"]));
        assert_eq!(config.image_timeout, None);
    }

    #[test]
    fn custom_image_timeout_and_controller_signature() {
        let config = render_config(&args(&[
            "--image-timeout",
            "5",
            "--controller-signature",
            "sig.png",
        ]));
        assert_eq!(config.image_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.controller_signature, "sig.png");
    }
}
