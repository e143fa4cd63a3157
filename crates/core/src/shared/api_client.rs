use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::shared::api_error::{server_detail, ApiError};

/// Blocking HTTP access to the recognition backend rooted at `base_url`
/// (e.g. `http://localhost:8000/api`).
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

impl ApiClient {
    /// `timeout` of `None` lets calls wait indefinitely.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends a request and turns non-2xx responses into [`ApiError::Status`].
    pub fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, ApiError> {
        let response = request.send().map_err(|e| ApiError::Transport {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(ApiError::Status {
            url: url.to_string(),
            status,
            detail: server_detail(&body),
        })
    }

    pub fn read_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let body = response.text().map_err(|e| ApiError::Transport {
            url: url.to_string(),
            source: e,
        })?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            source: e,
        })
    }

    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        let response = self.send(self.http.get(&url), &url)?;
        Self::read_json(response, &url)
    }

    /// Calls `GET /health` and returns the reported status string.
    pub fn health(&self) -> Result<String, ApiError> {
        let health: HealthResponse = self.get_json("health")?;
        Ok(health.status)
    }
}


#[cfg(test)]
mod tests {
    use super::stub_server::{serve, StubResponse};
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slashes() {
        let api = ApiClient::new("http://localhost:8000/api/", None).unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000/api");
        assert_eq!(api.endpoint("/persons"), "http://localhost:8000/api/persons");
        assert_eq!(api.endpoint("detect"), "http://localhost:8000/api/detect");
    }

    #[test]
    fn test_health_reports_status() {
        let server = serve(vec![StubResponse::json(200, "OK", r#"{"status": "ok"}"#)]);
        let api = ApiClient::new(&server.base_url, None).unwrap();

        assert_eq!(api.health().unwrap(), "ok");
        let requests = server.requests.lock().unwrap();
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path, "/api/health");
    }

    #[test]
    fn test_error_status_carries_server_detail() {
        let server = serve(vec![StubResponse::json(
            503,
            "Service Unavailable",
            r#"{"detail": "model loading"}"#,
        )]);
        let api = ApiClient::new(&server.base_url, None).unwrap();

        let err = api.health().unwrap_err();
        assert!(matches!(err, ApiError::Status { status, .. } if status.as_u16() == 503));
        assert_eq!(err.user_message("generic"), "model loading");
    }

    #[test]
    fn test_malformed_json_is_a_decode_error() {
        let server = serve(vec![StubResponse::json(200, "OK", "not json")]);
        let api = ApiClient::new(&server.base_url, None).unwrap();

        assert!(matches!(api.health(), Err(ApiError::Decode { .. })));
    }

    #[test]
    fn test_unreachable_backend_is_a_transport_error() {
        let api = ApiClient::new("http://127.0.0.1:9/api", None).unwrap();
        assert!(matches!(api.health(), Err(ApiError::Transport { .. })));
    }
}
