use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Failed to read record file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Record must contain at least one subject row")]
    NoSubjects,
    #[error("Duplicate subject id: {0}")]
    DuplicateSubjectId(String),
    #[error("Unknown field: {0}")]
    UnknownField(String),
    #[error("Unknown subject column: {0} (expected paperNo, subject or subjectName)")]
    UnknownColumn(String),
    #[error("Invalid value '{value}' for {field} (allowed: {allowed})")]
    InvalidOption {
        field: &'static str,
        value: String,
        allowed: String,
    },
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("{0}")]
    RejectedType(&'static str),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("No image reference given")]
    MissingReference,
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed data URL: {0}")]
    DataUrl(String),
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Image has zero size")]
    Empty,
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No usable font found (tried: {0})")]
    FontUnavailable(String),
    #[error("Failed to load font {path}: {message}")]
    FontLoad { path: PathBuf, message: String },
    #[error("Failed to encode raster: {0}")]
    Encode(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No preview available to download")]
    NoPreview,
    #[error("Roll number is empty; cannot name the exported file")]
    MissingRollNumber,
    #[error("Failed to create PDF: {0}")]
    Pdf(String),
    #[error("Failed to encode PNG: {0}")]
    Png(String),
    #[error("Could not open a browser window to print the admit card: {0}")]
    Print(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
