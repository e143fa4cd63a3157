use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;

use crate::gallery::domain::gallery_client::GalleryClient;
use crate::gallery::domain::person::{Person, PersonImage};
use crate::shared::api_client::ApiClient;
use crate::shared::api_error::ApiError;

/// Gallery endpoints of the recognition backend:
/// `GET /persons`, `POST /upload-person`, `DELETE /persons/{id}`.
pub struct HttpGalleryClient {
    api: ApiClient,
}

#[derive(Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

impl HttpGalleryClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

impl GalleryClient for HttpGalleryClient {
    fn list_persons(&self) -> Result<Vec<Person>, ApiError> {
        self.api.get_json("persons")
    }

    fn add_person(&self, name: &str, image: PersonImage) -> Result<Option<String>, ApiError> {
        let url = self.api.endpoint("upload-person");
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(image.mime)
            .map_err(ApiError::Client)?;
        let form = Form::new()
            .part("file", part)
            .text("name", name.to_string());

        let response = self
            .api
            .send(self.api.http().post(&url).multipart(form), &url)?;
        // The confirmation body is informational; an unexpected shape is not a failure.
        let body = response.text().unwrap_or_default();
        Ok(serde_json::from_str::<MessageResponse>(&body)
            .ok()
            .and_then(|m| m.message))
    }

    fn delete_person(&self, id: i64) -> Result<(), ApiError> {
        let url = self.api.endpoint(&format!("persons/{id}"));
        self.api.send(self.api.http().delete(&url), &url)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::api_client::stub_server::{serve, StubResponse};

    fn client(base_url: &str) -> HttpGalleryClient {
        HttpGalleryClient::new(ApiClient::new(base_url, None).unwrap())
    }

    fn image() -> PersonImage {
        PersonImage {
            file_name: "alice.png".to_string(),
            bytes: b"png-bytes".to_vec(),
            mime: "image/png",
        }
    }

    #[test]
    fn test_list_persons() {
        let server = serve(vec![StubResponse::json(
            200,
            "OK",
            r#"[{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]"#,
        )]);

        let persons = client(&server.base_url).list_persons().unwrap();
        assert_eq!(persons.len(), 2);
        assert_eq!(persons[0].name, "Alice");
        assert_eq!(server.requests.lock().unwrap()[0].path, "/api/persons");
    }

    #[test]
    fn test_add_person_sends_file_and_name() {
        let server = serve(vec![StubResponse::json(
            200,
            "OK",
            r#"{"message": "Person Alice added"}"#,
        )]);

        let message = client(&server.base_url).add_person("Alice", image()).unwrap();
        assert_eq!(message.as_deref(), Some("Person Alice added"));

        let requests = server.requests.lock().unwrap();
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/api/upload-person");
        let body = requests[0].body_text();
        assert!(body.contains(r#"name="file"; filename="alice.png""#));
        assert!(body.contains("Content-Type: image/png"));
        assert!(body.contains(r#"name="name""#));
        assert!(body.contains("Alice"));
    }

    #[test]
    fn test_add_person_tolerates_other_bodies() {
        let server = serve(vec![StubResponse::json(200, "OK", r#"{"id": 3, "name": "Alice"}"#)]);
        assert_eq!(client(&server.base_url).add_person("Alice", image()).unwrap(), None);
    }

    #[test]
    fn test_delete_person_targets_id() {
        let server = serve(vec![StubResponse::json(200, "OK", r#"{"message": "deleted"}"#)]);

        client(&server.base_url).delete_person(7).unwrap();
        let requests = server.requests.lock().unwrap();
        assert_eq!(requests[0].method, "DELETE");
        assert_eq!(requests[0].path, "/api/persons/7");
    }

    #[test]
    fn test_delete_not_found_keeps_detail() {
        let server = serve(vec![StubResponse::json(
            404,
            "Not Found",
            r#"{"detail": "not found"}"#,
        )]);

        let err = client(&server.base_url).delete_person(7).unwrap_err();
        assert!(matches!(err, ApiError::Status { status, .. } if status.as_u16() == 404));
        assert_eq!(err.user_message("Error deleting person."), "not found");
    }
}
