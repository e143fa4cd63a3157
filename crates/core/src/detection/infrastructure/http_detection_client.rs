use reqwest::blocking::multipart::{Form, Part};

use crate::detection::domain::detection_client::DetectionClient;
use crate::detection::domain::detection_result::DetectionResult;
use crate::shared::api_client::ApiClient;
use crate::shared::api_error::ApiError;
use crate::shared::constants::FRAME_UPLOAD_NAME;

/// Posts frames to `POST {base}/detect` as multipart field `file`.
pub struct HttpDetectionClient {
    api: ApiClient,
}

impl HttpDetectionClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn detect_frame(&self, jpeg: Vec<u8>) -> Result<DetectionResult, ApiError> {
        let url = self.api.endpoint("detect");
        let part = Part::bytes(jpeg)
            .file_name(FRAME_UPLOAD_NAME)
            .mime_str("image/jpeg")
            .map_err(ApiError::Client)?;
        let form = Form::new().part("file", part);

        let response = self
            .api
            .send(self.api.http().post(&url).multipart(form), &url)?;
        ApiClient::read_json(response, &url)
    }
}

impl DetectionClient for HttpDetectionClient {
    fn detect(
        &self,
        jpeg: Vec<u8>,
    ) -> Result<DetectionResult, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.detect_frame(jpeg)?)
    }
}
