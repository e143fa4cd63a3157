use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::shared::api_error::ApiError;

/// An enrolled identity as the backend reports it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
}

/// Image file submitted with an enrollment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersonImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl PersonImage {
    pub fn from_path(path: &Path) -> Result<Self, ApiError> {
        let bytes = std::fs::read(path).map_err(|source| ApiError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self {
            mime: mime_for(path),
            file_name,
            bytes,
        })
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("alice.JPG", "image/jpeg")]
    #[case("alice.jpeg", "image/jpeg")]
    #[case("alice.png", "image/png")]
    #[case("alice.webp", "image/webp")]
    #[case("alice", "application/octet-stream")]
    fn test_mime_from_extension(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(mime_for(Path::new(name)), expected);
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice.png");
        std::fs::write(&path, b"png-bytes").unwrap();

        let image = PersonImage::from_path(&path).unwrap();
        assert_eq!(image.file_name, "alice.png");
        assert_eq!(image.bytes, b"png-bytes");
        assert_eq!(image.mime, "image/png");
    }

    #[test]
    fn test_from_missing_path_is_io_error() {
        let result = PersonImage::from_path(Path::new("/nonexistent/alice.png"));
        assert!(matches!(result, Err(ApiError::Io { .. })));
    }

    #[test]
    fn test_person_list_parses() {
        let persons: Vec<Person> =
            serde_json::from_str(r#"[{"id": 1, "name": "Alice"}, {"id": 7, "name": "Bob"}]"#)
                .unwrap();
        assert_eq!(persons[1], Person { id: 7, name: "Bob".into() });
    }
}
