//! Live preview: the latest committed record and the raster drawn from it.

use crate::canvas::Raster;
use crate::error::ExportError;
use crate::export;
use crate::form::FormState;
use crate::notify::Notifier;
use crate::record::DocumentRecord;
use crate::render::Renderer;
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

pub struct Preview {
    updates: Receiver<DocumentRecord>,
    record: Option<DocumentRecord>,
    stale: bool,
    raster: Option<Raster>,
}

impl Preview {
    pub fn new(updates: Receiver<DocumentRecord>) -> Self {
        Preview {
            updates,
            record: None,
            stale: false,
            raster: None,
        }
    }

    /// Subscribe to `form` and start from its current record.
    pub fn connect(form: &mut FormState) -> Self {
        let (tx, rx) = mpsc::channel();
        form.subscribe(tx);
        let mut preview = Preview::new(rx);
        preview.record = Some(form.record().clone());
        preview.stale = true;
        preview
    }

    /// Take the newest queued record; intermediate ones are dropped.
    fn drain(&mut self) {
        if let Some(latest) = self.updates.try_iter().last() {
            self.record = Some(latest);
            self.stale = true;
        }
    }

    pub fn refresh(&mut self, renderer: &Renderer, notifier: &dyn Notifier) -> Option<&Raster> {
        self.refresh_at(renderer, notifier, Local::now().naive_local())
    }

    /// Re-render if a newer record arrived since the last render.
    pub fn refresh_at(
        &mut self,
        renderer: &Renderer,
        notifier: &dyn Notifier,
        printed_at: NaiveDateTime,
    ) -> Option<&Raster> {
        self.drain();
        if !self.stale {
            return self.raster.as_ref();
        }
        self.stale = false;

        let Some(record) = &self.record else {
            return None;
        };
        match renderer.render(record, printed_at) {
            Ok(raster) => self.raster = Some(raster),
            Err(e) => {
                log::error!("Error generating admit card: {}", e);
                notifier.error("Error generating admit card preview.");
                self.raster = None;
            }
        }
        self.raster.as_ref()
    }

    pub fn record(&self) -> Option<&DocumentRecord> {
        self.record.as_ref()
    }

    pub fn raster(&self) -> Option<&Raster> {
        self.raster.as_ref()
    }

    fn current(&self) -> Result<(&Raster, &DocumentRecord), ExportError> {
        match (&self.raster, &self.record) {
            (Some(raster), Some(record)) => Ok((raster, record)),
            _ => Err(ExportError::NoPreview),
        }
    }

    pub fn download_png(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let (raster, record) = self.current()?;
        export::write_png(raster, dir, &record.roll_number)
    }

    pub fn download_pdf(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let (raster, record) = self.current()?;
        export::write_pdf(raster, dir, &record.roll_number)
    }

    pub fn print(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let (raster, record) = self.current()?;
        export::print(raster, dir, &record.roll_number, &record.candidate_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FontConfig, RenderConfig};
    use crate::notify::MemoryNotifier;
    use crate::record::TextField;

    fn fontless_renderer(dir: &Path) -> Renderer {
        let missing = dir.join("missing.ttf");
        Renderer::new(RenderConfig {
            fonts: FontConfig {
                regular: Some(missing.clone()),
                bold: Some(missing),
                fallbacks: Vec::new(),
            },
            ..RenderConfig::default()
        })
    }

    #[test]
    fn only_the_last_queued_record_is_kept() {
        let mut form = FormState::new(DocumentRecord::sample());
        let mut preview = Preview::connect(&mut form);
        form.set_text(TextField::CandidateName, "A");
        form.set_text(TextField::CandidateName, "A B");
        form.set_text(TextField::RollNumber, "123");

        preview.drain();
        let record = preview.record().unwrap();
        assert_eq!(record.candidate_name, "A B");
        assert_eq!(record.roll_number, "123");
        assert!(preview.updates.try_recv().is_err());
    }

    #[test]
    fn render_failure_clears_preview_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = fontless_renderer(dir.path());
        let mut form = FormState::new(DocumentRecord::sample());
        let mut preview = Preview::connect(&mut form);
        preview.raster = Some(Raster::from_image(::image::RgbaImage::new(1, 1)));
        preview.stale = true;

        let notifier = MemoryNotifier::default();
        assert!(preview.refresh(&renderer, &notifier).is_none());
        assert!(preview.raster().is_none());
        assert_eq!(notifier.errors(), ["Error generating admit card preview."]);
    }

    #[test]
    fn export_without_preview_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let (_tx, rx) = mpsc::channel();
        let preview = Preview::new(rx);
        assert!(matches!(preview.download_png(dir.path()), Err(ExportError::NoPreview)));
        assert!(matches!(preview.download_pdf(dir.path()), Err(ExportError::NoPreview)));
        assert!(matches!(preview.print(dir.path()), Err(ExportError::NoPreview)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unchanged_record_is_not_rendered_again() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = fontless_renderer(dir.path());
        let mut form = FormState::new(DocumentRecord::sample());
        let mut preview = Preview::connect(&mut form);
        let notifier = MemoryNotifier::default();

        preview.refresh(&renderer, &notifier);
        preview.refresh(&renderer, &notifier);
        assert_eq!(notifier.errors().len(), 1);

        form.set_text(TextField::RollNumber, "9");
        preview.refresh(&renderer, &notifier);
        assert_eq!(notifier.errors().len(), 2);
    }

    #[test]
    fn png_download_is_named_after_rendered_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = FormState::new(DocumentRecord::sample());
        let mut preview = Preview::connect(&mut form);
        form.set_text(TextField::RollNumber, " 123 ");
        preview.drain();
        preview.raster = Some(Raster::from_image(::image::RgbaImage::new(8, 8)));

        let path = preview.download_png(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("admit-card-123.png"));
    }
}
