use crate::detection::domain::detection_result::DetectionResult;

/// Remote detection service.
///
/// Called concurrently from detection workers, hence `&self` and `Sync`.
pub trait DetectionClient: Send + Sync {
    /// Submits one JPEG-encoded frame and returns what was found in it.
    fn detect(
        &self,
        jpeg: Vec<u8>,
    ) -> Result<DetectionResult, Box<dyn std::error::Error + Send + Sync>>;
}
