use thiserror::Error;

use crate::capture::domain::video_sink::VideoSink;

/// Video-only capture constraints. Devices may deliver a different size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamRequest {
    pub width: u32,
    pub height: u32,
}

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    #[error("no camera device available: {0}")]
    NoDevice(String),
    #[error("failed to open camera: {0}")]
    Open(String),
}

/// Source of live media streams (a webcam, a replayed image folder, ...).
pub trait Camera: Send {
    /// Acquires a new stream. Frames start flowing into the stream's sink
    /// immediately.
    fn open(&mut self, request: &StreamRequest) -> Result<Box<dyn MediaStream>, CameraError>;
}

/// An acquired stream with one or more tracks.
pub trait MediaStream: Send {
    /// Sink that always holds the most recently delivered frame.
    fn sink(&self) -> VideoSink;

    /// False once the source has ended on its own (device lost, input exhausted).
    fn is_live(&self) -> bool;

    /// Stops every track and releases the device. Must tolerate repeated calls.
    fn stop(&mut self);
}
