use std::path::PathBuf;

use thiserror::Error;

use crate::gallery::domain::gallery_client::GalleryClient;
use crate::gallery::domain::person::{Person, PersonImage};
use crate::shared::api_error::ApiError;

const DELETE_FALLBACK: &str = "Error deleting person.";

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Please select an image and enter a person name")]
    MissingInput,
    #[error("Error uploading person. Please try again.")]
    Upload(#[source] ApiError),
    #[error("Invalid person ID")]
    InvalidId,
    #[error("Error deleting person: {message}")]
    Delete {
        message: String,
        #[source]
        source: ApiError,
    },
}

/// Enrollment input as the user is filling it in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnrollmentForm {
    pub name: String,
    pub image: Option<PathBuf>,
}

impl EnrollmentForm {
    pub fn clear(&mut self) {
        self.name.clear();
        self.image = None;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Carries the confirmation to show the user.
    Deleted(String),
    Cancelled,
}

/// Confirmation prompt shown before a delete.
pub fn delete_prompt(name: &str) -> String {
    format!("Delete {name}?")
}

/// Known-persons list and enrollment form backed by a [`GalleryClient`].
///
/// The local list only changes by re-reading the backend, so it never
/// drifts from what the server holds.
pub struct PersonGallery {
    client: Box<dyn GalleryClient>,
    persons: Vec<Person>,
    pub form: EnrollmentForm,
}

impl PersonGallery {
    pub fn new(client: Box<dyn GalleryClient>) -> Self {
        Self {
            client,
            persons: Vec::new(),
            form: EnrollmentForm::default(),
        }
    }

    pub fn persons(&self) -> &[Person] {
        &self.persons
    }

    /// Reloads the list. On failure the current list is kept.
    pub fn refresh(&mut self) -> Result<&[Person], ApiError> {
        match self.client.list_persons() {
            Ok(persons) => {
                log::debug!("Loaded {} persons", persons.len());
                self.persons = persons;
                Ok(&self.persons)
            }
            Err(e) => {
                log::warn!("Failed to load persons: {e}");
                Err(e)
            }
        }
    }

    /// Submits the form. On success the form is cleared and the list
    /// reloaded; on failure the form is left as it was.
    pub fn enroll(&mut self) -> Result<String, GalleryError> {
        let name = self.form.name.trim().to_string();
        let Some(path) = self.form.image.clone().filter(|_| !name.is_empty()) else {
            return Err(GalleryError::MissingInput);
        };

        let image = PersonImage::from_path(&path).map_err(|e| {
            log::warn!("Failed to read enrollment image: {e}");
            GalleryError::Upload(e)
        })?;
        if let Err(e) = self.client.add_person(&name, image) {
            log::warn!("Failed to upload {name}: {e}");
            return Err(GalleryError::Upload(e));
        }

        log::info!("Enrolled {name}");
        self.form.clear();
        let _ = self.refresh();
        Ok(format!("Person {name} added successfully!"))
    }

    /// Deletes a person after `confirm` approves the [`delete_prompt`].
    /// The list is only reloaded after a successful delete.
    pub fn delete(
        &mut self,
        id: i64,
        name: &str,
        confirm: impl FnOnce(&str) -> bool,
    ) -> Result<DeleteOutcome, GalleryError> {
        if !confirm(&delete_prompt(name)) {
            return Ok(DeleteOutcome::Cancelled);
        }
        if id <= 0 {
            return Err(GalleryError::InvalidId);
        }

        if let Err(source) = self.client.delete_person(id) {
            log::warn!("Failed to delete person {id}: {source}");
            return Err(GalleryError::Delete {
                message: source.user_message(DELETE_FALLBACK),
                source,
            });
        }

        log::info!("Deleted person {id} ({name})");
        let _ = self.refresh();
        Ok(DeleteOutcome::Deleted(format!("{name} deleted successfully!")))
    }
}
