use std::path::PathBuf;

pub use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}{}", detail_suffix(.detail))]
    Status {
        url: String,
        status: StatusCode,
        detail: Option<String>,
    },
    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl ApiError {
    /// The most specific reason available for showing to a user.
    ///
    /// Order: server-provided `detail`/`message`, then the HTTP status text,
    /// then the underlying error text, then `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        let message = match self {
            ApiError::Status { status, detail, .. } => detail
                .clone()
                .or_else(|| status.canonical_reason().map(str::to_string)),
            ApiError::Transport { source, .. } | ApiError::Client(source) => {
                Some(source.to_string())
            }
            ApiError::Decode { source, .. } => Some(source.to_string()),
            ApiError::Io { source, .. } => Some(source.to_string()),
        };
        message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Extracts the server's explanation from an error body.
///
/// Looks for a `detail` field first, then `message`. Non-string details
/// (e.g. validation error lists) are returned as compact JSON.
pub fn server_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["detail", "message"]
        .iter()
        .filter_map(|key| value.get(key))
        .find_map(|field| match field {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.trim().is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn status_error(status: u16, detail: Option<&str>) -> ApiError {
        ApiError::Status {
            url: "http://backend/api/persons/7".to_string(),
            status: StatusCode::from_u16(status).unwrap(),
            detail: detail.map(str::to_string),
        }
    }

    #[rstest]
    #[case::detail(r#"{"detail": "not found"}"#, Some("not found"))]
    #[case::message(r#"{"message": "gone"}"#, Some("gone"))]
    #[case::detail_wins(r#"{"message": "gone", "detail": "not found"}"#, Some("not found"))]
    #[case::null_detail_falls_through(r#"{"detail": null, "message": "gone"}"#, Some("gone"))]
    #[case::structured_detail(r#"{"detail": [{"loc": "id"}]}"#, Some(r#"[{"loc":"id"}]"#))]
    #[case::blank_detail(r#"{"detail": "  "}"#, None)]
    #[case::no_known_field(r#"{"error": "x"}"#, None)]
    #[case::not_json("Internal Server Error", None)]
    #[case::empty("", None)]
    fn test_server_detail(#[case] body: &str, #[case] expected: Option<&str>) {
        assert_eq!(server_detail(body).as_deref(), expected);
    }

    #[test]
    fn test_user_message_prefers_server_detail() {
        let err = status_error(404, Some("not found"));
        assert_eq!(err.user_message("generic"), "not found");
    }

    #[test]
    fn test_user_message_falls_back_to_status_text() {
        let err = status_error(404, None);
        assert_eq!(err.user_message("generic"), "Not Found");
    }

    #[test]
    fn test_user_message_falls_back_to_generic_without_status_text() {
        let err = status_error(599, None);
        assert_eq!(err.user_message("generic"), "generic");
    }

    #[test]
    fn test_user_message_for_io_error() {
        let err = ApiError::Io {
            path: PathBuf::from("/tmp/missing.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.user_message("generic"), "no such file");
    }

    #[test]
    fn test_display_includes_detail() {
        let err = status_error(404, Some("not found"));
        assert_eq!(
            err.to_string(),
            "http://backend/api/persons/7 returned 404 Not Found: not found"
        );
    }
}
