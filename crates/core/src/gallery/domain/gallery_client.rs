use crate::gallery::domain::person::{Person, PersonImage};
use crate::shared::api_error::ApiError;

/// Backend store of enrolled persons.
///
/// Errors stay typed so callers can surface the server's own explanation.
pub trait GalleryClient: Send + Sync {
    fn list_persons(&self) -> Result<Vec<Person>, ApiError>;

    /// Enrolls (or re-enrolls) `name` with a reference image. Returns the
    /// server's confirmation message, if any.
    fn add_person(&self, name: &str, image: PersonImage) -> Result<Option<String>, ApiError>;

    fn delete_person(&self, id: i64) -> Result<(), ApiError>;
}
