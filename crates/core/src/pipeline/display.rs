use std::sync::{Arc, Mutex};

use crate::capture::domain::video_sink::VideoSink;
use crate::detection::domain::detection_result::DetectionResult;
use crate::overlay::domain::surface::Surface;
use crate::shared::frame::Frame;

/// Everything the live view shows: the bound video sink, the drawable
/// surface and the detections currently overlaid on it.
///
/// Shared between the capture controller, the timer thread and detection
/// workers through [`SharedDisplay`]; whoever holds the lock last wins.
pub struct Display {
    sink: Option<VideoSink>,
    surface: Option<Box<dyn Surface>>,
    detections: Option<DetectionResult>,
    session: u64,
    last_rendered_capture: Option<u64>,
    render_count: u64,
}

pub type SharedDisplay = Arc<Mutex<Display>>;

impl Display {
    pub fn new(surface: Option<Box<dyn Surface>>) -> Self {
        Self {
            sink: None,
            surface,
            detections: None,
            session: 0,
            last_rendered_capture: None,
            render_count: 0,
        }
    }

    pub fn into_shared(self) -> SharedDisplay {
        Arc::new(Mutex::new(self))
    }

    /// Binds a new stream's sink and starts a new display session.
    /// Returns the session number results must carry to be drawn.
    pub fn bind_sink(&mut self, sink: VideoSink) -> u64 {
        self.session += 1;
        self.sink = Some(sink);
        self.detections = None;
        self.last_rendered_capture = None;
        self.session
    }

    pub fn detach_sink(&mut self) {
        self.sink = None;
    }

    pub fn sink(&self) -> Option<&VideoSink> {
        self.sink.as_ref()
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// True while `session` is the bound, current one.
    pub fn accepts(&self, session: u64) -> bool {
        self.sink.is_some() && self.session == session
    }

    pub fn surface(&self) -> Option<&dyn Surface> {
        self.surface.as_deref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut (dyn Surface + 'static)> {
        self.surface.as_deref_mut()
    }

    pub fn set_surface(&mut self, surface: Option<Box<dyn Surface>>) {
        self.surface = surface;
    }

    pub fn latest_detections(&self) -> Option<&DetectionResult> {
        self.detections.as_ref()
    }

    pub fn last_rendered_capture(&self) -> Option<u64> {
        self.last_rendered_capture
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub(crate) fn record_render(&mut self, capture_id: u64, result: DetectionResult) {
        self.detections = Some(result);
        self.last_rendered_capture = Some(capture_id);
        self.render_count += 1;
    }

    /// What a viewer should show right now: the annotated surface once a
    /// result has landed in this session, otherwise the raw live frame.
    pub fn view(&self) -> Option<Frame> {
        if self.detections.is_some() {
            if let Some(surface) = &self.surface {
                return Some(surface.snapshot());
            }
        }
        self.sink
            .as_ref()
            .and_then(|sink| sink.current_frame())
            .map(|frame| (*frame).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::domain::overlay_renderer::recording_surface::RecordingSurface;

    #[test]
    fn test_bind_starts_new_session() {
        let mut display = Display::new(None);
        let first = display.bind_sink(VideoSink::new());
        display.record_render(4, DetectionResult::default());
        let second = display.bind_sink(VideoSink::new());

        assert!(second > first);
        assert!(display.accepts(second));
        assert!(!display.accepts(first));
        assert!(display.latest_detections().is_none());
        assert_eq!(display.last_rendered_capture(), None);
    }

    #[test]
    fn test_detached_display_accepts_nothing() {
        let mut display = Display::new(None);
        let session = display.bind_sink(VideoSink::new());
        display.detach_sink();
        assert!(!display.accepts(session));
        assert!(display.sink().is_none());
    }

    #[test]
    fn test_view_prefers_annotated_surface() {
        let sink = VideoSink::new();
        sink.publish(Frame::solid(4, 4, [7, 7, 7], 9));
        let mut display = Display::new(Some(Box::new(RecordingSurface::new(2, 2))));
        display.bind_sink(sink);

        assert_eq!(display.view().unwrap().sequence(), 9);

        display.record_render(1, DetectionResult::default());
        assert_eq!(display.view().unwrap().dimensions(), (2, 2));
        assert_eq!(display.render_count(), 1);
    }

    #[test]
    fn test_view_is_empty_without_stream() {
        let display = Display::new(None);
        assert!(display.view().is_none());
    }
}
