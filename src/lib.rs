//! Admit card generator: an editable exam admit card record, a canvas renderer
//! and PNG / PDF / print exporters.

pub mod assets;
pub mod canvas;
pub mod config;
pub mod error;
pub mod export;
pub mod form;
pub mod media;
pub mod notify;
pub mod preview;
pub mod record;
pub mod render;

pub use canvas::{Canvas, DisplayList, FontSet, Raster, RasterCanvas};
pub use config::{FontConfig, RenderConfig};
pub use error::{ExportError, ImageError, RecordError, RenderError, UploadError};
pub use form::FormState;
pub use media::{ImageLoader, LoadedImage, SourceLoader};
pub use notify::{ConsoleNotifier, Notifier};
pub use preview::Preview;
pub use record::DocumentRecord;
pub use render::{draw_admit_card, ImageOutcome, RenderSummary, Renderer};
