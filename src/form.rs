//! The editable admit card form.
//!
//! [`FormState`] owns the record. Every accepted edit sends a full copy of the
//! record to the registered listener; there are no partial updates.

use crate::error::{RecordError, UploadError};
use crate::media::to_data_url;
use crate::notify::Notifier;
use crate::record::{
    Choice, DocumentRecord, FieldName, ImageSlot, SubjectColumn, SubjectId, SubjectRow, TextField,
};
use std::path::Path;
use std::sync::mpsc::Sender;

const SVG_OR_PNG: &[&str] = &["image/svg+xml", "image/png"];
const ANY_IMAGE: &[&str] = &["image/png", "image/jpeg", "image/gif", "image/svg+xml"];

impl ImageSlot {
    /// Media types an upload into this slot may declare.
    pub fn accepted_types(&self) -> &'static [&'static str] {
        match self {
            ImageSlot::SchoolLogo | ImageSlot::StudentSignature => SVG_OR_PNG,
            ImageSlot::StudentPhoto => ANY_IMAGE,
        }
    }

    fn rejection_message(&self) -> &'static str {
        match self {
            ImageSlot::SchoolLogo | ImageSlot::StudentSignature => {
                "Only SVG or PNG files are allowed for this field."
            }
            ImageSlot::StudentPhoto => "Invalid image file type.",
        }
    }
}

/// Media type implied by the file name, as a file picker would declare it.
pub fn declared_type(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

pub struct FormState {
    record: DocumentRecord,
    listener: Option<Sender<DocumentRecord>>,
}

impl FormState {
    pub fn new(record: DocumentRecord) -> Self {
        FormState {
            record,
            listener: None,
        }
    }

    /// Register the listener, replacing any previous one.
    pub fn subscribe(&mut self, listener: Sender<DocumentRecord>) {
        self.listener = Some(listener);
    }

    pub fn record(&self) -> &DocumentRecord {
        &self.record
    }

    fn broadcast(&mut self) {
        if let Some(listener) = &self.listener {
            if listener.send(self.record.clone()).is_err() {
                log::debug!("Record listener disconnected");
                self.listener = None;
            }
        }
    }

    pub fn set_text(&mut self, field: TextField, value: impl Into<String>) {
        *self.record.text_mut(field) = value.into();
        self.broadcast();
    }

    pub fn set_choice(&mut self, choice: Choice) {
        self.record.apply_choice(choice);
        self.broadcast();
    }

    /// Point an image slot at a reference directly (URL, path or data URL).
    pub fn set_image_reference(&mut self, slot: ImageSlot, reference: impl Into<String>) {
        *self.record.image_mut(slot) = reference.into();
        self.broadcast();
    }

    /// Set any field by its form name. Enum fields must get one of their options.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), RecordError> {
        match name.parse::<FieldName>()? {
            FieldName::Text(field) => self.set_text(field, value),
            FieldName::Choice(field) => self.set_choice(Choice::parse(field, value)?),
            FieldName::Image(slot) => self.set_image_reference(slot, value),
        }
        Ok(())
    }

    /// Append an empty subject row labelled with its position.
    pub fn add_subject(&mut self) -> SubjectId {
        let id = SubjectId::generate(&self.record.subjects);
        let paper_no = format!("Paper - {}", self.record.subjects.len() + 1);
        self.record.subjects.push(SubjectRow {
            id: id.clone(),
            paper_no,
            subject: String::new(),
            subject_name: String::new(),
        });
        self.broadcast();
        id
    }

    /// Remove a row. The last remaining row is never removed.
    pub fn remove_subject(&mut self, id: &SubjectId) -> bool {
        if self.record.subjects.len() <= 1 {
            return false;
        }
        let before = self.record.subjects.len();
        self.record.subjects.retain(|row| &row.id != id);
        let removed = self.record.subjects.len() != before;
        if removed {
            self.broadcast();
        }
        removed
    }

    pub fn update_subject(&mut self, id: &SubjectId, column: SubjectColumn, value: impl Into<String>) -> bool {
        let Some(row) = self.record.subjects.iter_mut().find(|row| &row.id == id) else {
            return false;
        };
        *row.cell_mut(column) = value.into();
        self.broadcast();
        true
    }

    /// Validate, read and store an uploaded image as a data URL.
    ///
    /// The record is only touched once the file has been read successfully.
    pub fn upload_image(
        &mut self,
        slot: ImageSlot,
        path: &Path,
        notifier: &dyn Notifier,
    ) -> Result<(), UploadError> {
        let mime = declared_type(path)
            .filter(|mime| slot.accepted_types().contains(&mime.as_str()));
        let Some(mime) = mime else {
            let message = slot.rejection_message();
            notifier.error(message);
            return Err(UploadError::RejectedType(message));
        };

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(source) => {
                log::error!("Error uploading image {}: {}", path.display(), source);
                notifier.error("Failed to upload image. Please try again.");
                return Err(UploadError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        self.set_image_reference(slot, to_data_url(&mime, &bytes));
        notifier.success("Image uploaded successfully!");
        Ok(())
    }
}
