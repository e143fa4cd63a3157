pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Resolution requested from the camera. Devices may deliver something else;
/// the pipeline always works in the native dimensions of the delivered frame.
pub const CAPTURE_WIDTH: u32 = 1280;
pub const CAPTURE_HEIGHT: u32 = 720;

pub const DETECT_INTERVAL_MS: u64 = 500;
pub const JPEG_QUALITY: u8 = 80;

/// File name attached to each uploaded detection frame.
pub const FRAME_UPLOAD_NAME: &str = "frame.jpg";

pub const LABEL_FONT_NAME: &str = "Arial.ttf";
pub const LABEL_FONT_URL: &str =
    "https://github.com/ultralytics/assets/releases/download/v0.0.0/Arial.ttf";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Frame rate used when replaying still images as a camera feed.
pub const IMAGE_SEQUENCE_FPS: u32 = 15;

pub const CAMERA_ERROR_MESSAGE: &str = "Error accessing camera. Please allow camera permissions.";
