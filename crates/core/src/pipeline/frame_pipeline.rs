use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::detection::domain::detection_client::DetectionClient;
use crate::detection::domain::detection_result::DetectionResult;
use crate::overlay::domain::overlay_renderer::draw_detections;
use crate::pipeline::display::{Display, SharedDisplay};
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::shared::config::OverlayPolicy;
use crate::shared::constants::JPEG_QUALITY;
use crate::shared::sync::lock;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// How a single detection tick ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to capture (no stream, no frame yet, or no surface).
    Skipped,
    /// Encoding, transport, status or parse error. The previous overlay stays.
    Failed,
    /// The result was drawn.
    Rendered,
    /// The result arrived for a stopped session or was superseded.
    Discarded,
}

impl TickOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TickOutcome::Skipped => "skipped",
            TickOutcome::Failed => "failed",
            TickOutcome::Rendered => "rendered",
            TickOutcome::Discarded => "discarded",
        }
    }
}

/// A frame rasterised and encoded for detection, with the geometry and
/// session it was taken in.
#[derive(Clone, Debug)]
pub struct CapturedFrame {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub session: u64,
    pub capture_id: u64,
}

/// Capture → encode → detect → render.
///
/// Capturing holds the display lock briefly; the remote call runs without
/// it, so any number of ticks can be waiting on the backend at once.
pub struct FramePipeline {
    client: Arc<dyn DetectionClient>,
    jpeg_quality: u8,
    policy: OverlayPolicy,
    next_capture_id: AtomicU64,
    in_flight: AtomicUsize,
    logger: Mutex<Box<dyn PipelineLogger>>,
}

impl FramePipeline {
    pub fn new(client: Arc<dyn DetectionClient>) -> Self {
        Self {
            client,
            jpeg_quality: JPEG_QUALITY,
            policy: OverlayPolicy::default(),
            next_capture_id: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            logger: Mutex::new(Box::new(NullPipelineLogger)),
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn with_policy(mut self, policy: OverlayPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = Mutex::new(logger);
        self
    }

    /// Detection calls currently awaiting the backend.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn summary(&self) {
        lock(&self.logger).summary();
    }

    /// Rasterises the current video frame at its native size and encodes it.
    ///
    /// `Ok(None)` when there is no bound sink, no frame yet or no surface.
    pub fn capture(&self, display: &SharedDisplay) -> Result<Option<CapturedFrame>, SendError> {
        let started = Instant::now();
        let mut guard = lock(display);
        let display: &mut Display = &mut guard;

        let Some(frame) = display.sink().and_then(|sink| sink.current_frame()) else {
            return Ok(None);
        };
        let session = display.session();
        let Some(surface) = display.surface_mut() else {
            return Ok(None);
        };

        let (width, height) = frame.dimensions();
        surface.resize(width, height);
        surface.draw_frame(&frame);
        let jpeg = surface.encode_jpeg(self.jpeg_quality)?;
        drop(guard);

        let capture_id = self.next_capture_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.log_timing("capture", started);
        log::debug!("Captured frame #{capture_id} ({width}x{height}, {} bytes)", jpeg.len());

        Ok(Some(CapturedFrame {
            jpeg,
            width,
            height,
            session,
            capture_id,
        }))
    }

    /// Sends a captured frame for detection and renders the result.
    pub fn detect(&self, mut captured: CapturedFrame, display: &SharedDisplay) -> TickOutcome {
        let capture_id = captured.capture_id;
        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.logger).metric("in_flight", in_flight as f64);

        let started = Instant::now();
        let result = self.client.detect(std::mem::take(&mut captured.jpeg));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.log_timing("detect", started);

        let outcome = match result {
            Ok(result) => self.render(&captured, result, display),
            Err(e) => {
                log::warn!("Detection for frame #{capture_id} failed: {e}");
                TickOutcome::Failed
            }
        };
        self.record(outcome);
        outcome
    }

    /// One synchronous tick: capture, detect and render on the calling thread.
    pub fn capture_and_detect(&self, display: &SharedDisplay) -> TickOutcome {
        match self.capture(display) {
            Ok(Some(captured)) => self.detect(captured, display),
            Ok(None) => self.record(TickOutcome::Skipped),
            Err(e) => {
                log::warn!("Failed to encode frame: {e}");
                self.record(TickOutcome::Failed)
            }
        }
    }

    /// Captures on the calling thread and runs the remote call and render
    /// on a new worker. Returns `None` when nothing was dispatched.
    pub fn dispatch(self: &Arc<Self>, display: &SharedDisplay) -> Option<JoinHandle<TickOutcome>> {
        let captured = match self.capture(display) {
            Ok(Some(captured)) => captured,
            Ok(None) => {
                self.record(TickOutcome::Skipped);
                return None;
            }
            Err(e) => {
                log::warn!("Failed to encode frame: {e}");
                self.record(TickOutcome::Failed);
                return None;
            }
        };

        let pipeline = Arc::clone(self);
        let display = Arc::clone(display);
        Some(thread::spawn(move || pipeline.detect(captured, &display)))
    }

    fn render(
        &self,
        captured: &CapturedFrame,
        result: DetectionResult,
        display: &SharedDisplay,
    ) -> TickOutcome {
        let started = Instant::now();
        let mut guard = lock(display);
        let display: &mut Display = &mut guard;

        if !display.accepts(captured.session) {
            log::debug!("Discarding result for frame #{} from a stopped stream", captured.capture_id);
            return TickOutcome::Discarded;
        }
        if self.policy == OverlayPolicy::NewestCapture
            && display
                .last_rendered_capture()
                .is_some_and(|last| last >= captured.capture_id)
        {
            log::debug!("Discarding stale result for frame #{}", captured.capture_id);
            return TickOutcome::Discarded;
        }

        let Some(frame) = display.sink().and_then(|sink| sink.current_frame()) else {
            return TickOutcome::Discarded;
        };
        let Some(surface) = display.surface_mut() else {
            return TickOutcome::Discarded;
        };

        // Boxes are in the coordinates of the frame that was sent.
        surface.resize(captured.width, captured.height);
        draw_detections(surface, &frame, &result);

        log::debug!(
            "Frame #{}: {} faces ({} known), {} objects",
            captured.capture_id,
            result.faces.len(),
            result.known_faces().count(),
            result.objects.len()
        );
        display.record_render(captured.capture_id, result);
        drop(guard);

        self.log_timing("render", started);
        TickOutcome::Rendered
    }

    fn record(&self, outcome: TickOutcome) -> TickOutcome {
        lock(&self.logger).outcome(outcome);
        outcome
    }

    fn log_timing(&self, stage: &str, started: Instant) {
        let ms = started.elapsed().as_secs_f64() * 1000.0;
        lock(&self.logger).timing(stage, ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::domain::video_sink::VideoSink;
    use crate::detection::domain::detection_result::FaceBox;
    use crate::overlay::domain::overlay_renderer::recording_surface::{
        rects, Op, OpLog, RecordingSurface,
    };
    use crate::overlay::domain::surface::Color;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::frame::Frame;
    use crossbeam_channel::Sender;
    use std::time::Duration;

    // --- Stubs ---

    /// Returns a fixed result and records every payload it receives.
    struct StubClient {
        result: Result<DetectionResult, String>,
        calls: Mutex<Vec<Vec<u8>>>,
    }

    impl StubClient {
        fn ok(result: DetectionResult) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(result),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Err(message.to_string()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl DetectionClient for StubClient {
        fn detect(&self, jpeg: Vec<u8>) -> Result<DetectionResult, SendError> {
            self.calls.lock().unwrap().push(jpeg);
            self.result.clone().map_err(|e| e.into())
        }
    }

    /// Blocks each call until the test releases it, so responses can be
    /// made to land in any order.
    struct GatedClient {
        gates: Mutex<Vec<Sender<DetectionResult>>>,
    }

    impl GatedClient {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                gates: Mutex::new(Vec::new()),
            })
        }

        fn wait_for_calls(&self, count: usize) {
            for _ in 0..500 {
                if self.gates.lock().unwrap().len() >= count {
                    return;
                }
                thread::sleep(Duration::from_millis(2));
            }
            panic!("expected {count} pending detection calls");
        }

        fn release(&self, call: usize, result: DetectionResult) {
            let gate = self.gates.lock().unwrap()[call].clone();
            gate.send(result).unwrap();
        }
    }

    impl DetectionClient for GatedClient {
        fn detect(&self, _jpeg: Vec<u8>) -> Result<DetectionResult, SendError> {
            let (tx, rx) = crossbeam_channel::bounded(1);
            self.gates.lock().unwrap().push(tx);
            rx.recv().map_err(|e| e.into())
        }
    }

    // --- Helpers ---

    fn face(name: &str, is_known: bool) -> DetectionResult {
        DetectionResult {
            faces: vec![FaceBox {
                bbox: BoundingBox::new(10, 10, 50, 50),
                name: name.to_string(),
                is_known,
            }],
            objects: vec![],
        }
    }

    fn streaming_display(frame: Frame) -> (SharedDisplay, VideoSink, OpLog) {
        let sink = VideoSink::new();
        sink.publish(frame);
        let surface = RecordingSurface::new(1, 1);
        let log = surface.log();
        let mut display = Display::new(Some(Box::new(surface)));
        display.bind_sink(sink.clone());
        (display.into_shared(), sink, log)
    }

    fn latest_name(display: &SharedDisplay) -> Option<String> {
        lock(display)
            .latest_detections()
            .and_then(|d| d.faces.first())
            .map(|f| f.name.clone())
    }

    // --- Tests ---

    #[test]
    fn test_no_sink_is_a_noop() {
        let client = StubClient::ok(face("Alice", true));
        let pipeline = FramePipeline::new(client.clone());
        let display = Display::new(Some(Box::new(RecordingSurface::new(1, 1)))).into_shared();

        assert_eq!(pipeline.capture_and_detect(&display), TickOutcome::Skipped);
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_no_surface_is_a_noop() {
        let client = StubClient::ok(face("Alice", true));
        let pipeline = FramePipeline::new(client.clone());
        let sink = VideoSink::new();
        sink.publish(Frame::solid(8, 8, [0, 0, 0], 0));
        let mut display = Display::new(None);
        display.bind_sink(sink);
        let display = display.into_shared();

        assert_eq!(pipeline.capture_and_detect(&display), TickOutcome::Skipped);
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_sink_without_frame_is_a_noop() {
        let client = StubClient::ok(face("Alice", true));
        let pipeline = Arc::new(FramePipeline::new(client.clone()));
        let mut display = Display::new(Some(Box::new(RecordingSurface::new(1, 1))));
        display.bind_sink(VideoSink::new());
        let display = display.into_shared();

        assert!(pipeline.dispatch(&display).is_none());
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn test_capture_encodes_native_size_at_configured_quality() {
        let client = StubClient::ok(DetectionResult::default());
        let pipeline = FramePipeline::new(client.clone());
        let (display, _sink, _ops) = streaming_display(Frame::solid(640, 360, [1, 1, 1], 0));

        assert_eq!(pipeline.capture_and_detect(&display), TickOutcome::Rendered);
        assert_eq!(client.calls.lock().unwrap()[0], b"jpeg:640x360@80".to_vec());
    }

    #[test]
    fn test_alice_result_is_drawn_green_in_capture_geometry() {
        let pipeline = FramePipeline::new(StubClient::ok(face("Alice", true)));
        let (display, _sink, ops) = streaming_display(Frame::solid(64, 48, [5, 5, 5], 0));

        assert_eq!(pipeline.capture_and_detect(&display), TickOutcome::Rendered);

        let ops = ops.lock().unwrap().clone();
        assert_eq!(
            rects(&ops),
            vec![(BoundingBox::new(10, 10, 50, 50), Color::GREEN, 3)]
        );
        assert!(ops.contains(&Op::Resize(64, 48)));
        assert_eq!(latest_name(&display).as_deref(), Some("Alice"));
        let guard = lock(&display);
        assert_eq!(guard.surface().unwrap().dimensions(), (64, 48));
        assert_eq!(guard.render_count(), 1);
        assert_eq!(guard.last_rendered_capture(), Some(1));
    }

    #[test]
    fn test_failed_detection_keeps_previous_overlay() {
        let (display, _sink, _ops) = streaming_display(Frame::solid(8, 8, [0, 0, 0], 0));
        FramePipeline::new(StubClient::ok(face("Alice", true))).capture_and_detect(&display);

        let failing = FramePipeline::new(StubClient::failing("connection refused"));
        assert_eq!(failing.capture_and_detect(&display), TickOutcome::Failed);
        assert_eq!(latest_name(&display).as_deref(), Some("Alice"));
        assert_eq!(lock(&display).render_count(), 1);
    }

    #[test]
    fn test_late_result_after_detach_is_discarded() {
        let client = GatedClient::new();
        let pipeline = Arc::new(FramePipeline::new(client.clone()));
        let (display, _sink, _ops) = streaming_display(Frame::solid(8, 8, [0, 0, 0], 0));

        let handle = pipeline.dispatch(&display).unwrap();
        client.wait_for_calls(1);
        lock(&display).detach_sink();
        client.release(0, face("Alice", true));

        assert_eq!(handle.join().unwrap(), TickOutcome::Discarded);
        assert!(lock(&display).latest_detections().is_none());
    }

    #[test]
    fn test_result_from_previous_session_is_discarded() {
        let client = GatedClient::new();
        let pipeline = Arc::new(FramePipeline::new(client.clone()));
        let (display, sink, _ops) = streaming_display(Frame::solid(8, 8, [0, 0, 0], 0));

        let handle = pipeline.dispatch(&display).unwrap();
        client.wait_for_calls(1);
        lock(&display).bind_sink(sink);
        client.release(0, face("Alice", true));

        assert_eq!(handle.join().unwrap(), TickOutcome::Discarded);
    }

    #[test]
    fn test_out_of_order_last_to_land_wins() {
        let client = GatedClient::new();
        let pipeline = Arc::new(FramePipeline::new(client.clone()));
        let (display, _sink, _ops) = streaming_display(Frame::solid(8, 8, [0, 0, 0], 0));

        let tick1 = pipeline.dispatch(&display).unwrap();
        client.wait_for_calls(1);
        let tick2 = pipeline.dispatch(&display).unwrap();
        client.wait_for_calls(2);
        assert_eq!(pipeline.in_flight(), 2);

        client.release(1, face("Tick2", true));
        assert_eq!(tick2.join().unwrap(), TickOutcome::Rendered);
        client.release(0, face("Tick1", false));
        assert_eq!(tick1.join().unwrap(), TickOutcome::Rendered);

        assert_eq!(latest_name(&display).as_deref(), Some("Tick1"));
        assert_eq!(lock(&display).render_count(), 2);
    }

    #[test]
    fn test_out_of_order_newest_capture_wins() {
        let client = GatedClient::new();
        let pipeline = Arc::new(
            FramePipeline::new(client.clone()).with_policy(OverlayPolicy::NewestCapture),
        );
        let (display, _sink, _ops) = streaming_display(Frame::solid(8, 8, [0, 0, 0], 0));

        let tick1 = pipeline.dispatch(&display).unwrap();
        client.wait_for_calls(1);
        let tick2 = pipeline.dispatch(&display).unwrap();
        client.wait_for_calls(2);

        client.release(1, face("Tick2", true));
        assert_eq!(tick2.join().unwrap(), TickOutcome::Rendered);
        client.release(0, face("Tick1", false));
        assert_eq!(tick1.join().unwrap(), TickOutcome::Discarded);

        assert_eq!(latest_name(&display).as_deref(), Some("Tick2"));
        assert_eq!(lock(&display).last_rendered_capture(), Some(2));
    }

    #[test]
    fn test_render_redraws_live_frame_under_boxes() {
        let client = GatedClient::new();
        let pipeline = Arc::new(FramePipeline::new(client.clone()));
        let (display, sink, ops) = streaming_display(Frame::solid(16, 16, [0, 0, 0], 4));

        let handle = pipeline.dispatch(&display).unwrap();
        client.wait_for_calls(1);
        sink.publish(Frame::solid(16, 16, [0, 0, 0], 5));
        client.release(0, face("Bob", false));
        assert_eq!(handle.join().unwrap(), TickOutcome::Rendered);

        let ops = ops.lock().unwrap().clone();
        let frames: Vec<u64> = ops
            .iter()
            .filter_map(|op| match op {
                Op::Frame(sequence, _) => Some(*sequence),
                _ => None,
            })
            .collect();
        assert_eq!(frames, vec![4, 5]);
        assert_eq!(rects(&ops)[0].1, Color::RED);
    }
}
