use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::capture::domain::camera::{Camera, CameraError, MediaStream, StreamRequest};
use crate::capture::infrastructure::periodic_task::PeriodicTask;
use crate::pipeline::display::SharedDisplay;
use crate::pipeline::frame_pipeline::FramePipeline;
use crate::shared::constants::{
    CAMERA_ERROR_MESSAGE, CAPTURE_HEIGHT, CAPTURE_WIDTH, DETECT_INTERVAL_MS,
};
use crate::shared::sync::lock;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("{}", CAMERA_ERROR_MESSAGE)]
    Acquire(#[source] CameraError),
}

impl CaptureError {
    /// Alert text for the user.
    pub fn user_message(&self) -> &'static str {
        CAMERA_ERROR_MESSAGE
    }
}

struct StreamSession {
    stream: Box<dyn MediaStream>,
    task: PeriodicTask,
    session: u64,
}

/// Owns the camera stream and the detection timer.
///
/// At most one stream is active. `start` and `stop` are idempotent, and
/// dropping the controller stops an active stream.
pub struct CaptureController {
    camera: Box<dyn Camera>,
    pipeline: Arc<FramePipeline>,
    display: SharedDisplay,
    request: StreamRequest,
    interval: Duration,
    active: Option<StreamSession>,
}

impl CaptureController {
    pub fn new(camera: Box<dyn Camera>, pipeline: Arc<FramePipeline>, display: SharedDisplay) -> Self {
        Self {
            camera,
            pipeline,
            display,
            request: StreamRequest {
                width: CAPTURE_WIDTH,
                height: CAPTURE_HEIGHT,
            },
            interval: Duration::from_millis(DETECT_INTERVAL_MS),
            active: None,
        }
    }

    pub fn with_request(mut self, request: StreamRequest) -> Self {
        self.request = request;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn is_streaming(&self) -> bool {
        self.active.is_some()
    }

    pub fn display(&self) -> &SharedDisplay {
        &self.display
    }

    pub fn pipeline(&self) -> &Arc<FramePipeline> {
        &self.pipeline
    }

    /// Acquires the camera, binds it to the display and starts ticking.
    ///
    /// On failure nothing changes and the controller stays idle.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.active.is_some() {
            return Ok(());
        }

        let stream = self.camera.open(&self.request).map_err(|e| {
            log::warn!("Camera acquisition failed: {e}");
            CaptureError::Acquire(e)
        })?;
        let session = lock(&self.display).bind_sink(stream.sink());

        let pipeline = Arc::clone(&self.pipeline);
        let display = Arc::clone(&self.display);
        let task = PeriodicTask::spawn(self.interval, move || {
            // Workers are detached; late results are discarded at render time.
            let _ = pipeline.dispatch(&display);
        });

        log::info!(
            "Streaming started (session {session}, every {}ms)",
            self.interval.as_millis()
        );
        self.active = Some(StreamSession {
            stream,
            task,
            session,
        });
        Ok(())
    }

    /// Cancels the timer, stops every track and detaches the sink.
    ///
    /// Returns false when there was nothing to stop. Detection calls already
    /// in flight are left to finish and are discarded when they land.
    pub fn stop(&mut self) -> bool {
        let Some(mut active) = self.active.take() else {
            return false;
        };

        active.task.cancel();
        active.stream.stop();
        {
            let mut display = lock(&self.display);
            if display.session() == active.session {
                display.detach_sink();
            }
        }
        log::info!(
            "Streaming stopped (session {}, {} detections in flight)",
            active.session,
            self.pipeline.in_flight()
        );
        true
    }

    /// Stops a stream that ended on its own. Returns true if that happened.
    pub fn check_stream(&mut self) -> bool {
        let lost = self
            .active
            .as_ref()
            .is_some_and(|active| !active.stream.is_live());
        if lost {
            log::warn!("Camera stream ended unexpectedly");
            self.stop();
        }
        lost
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.stop();
    }
}
