use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;

use crate::capture::domain::camera::{Camera, CameraError, MediaStream, StreamRequest};
use crate::capture::domain::video_sink::VideoSink;
use crate::shared::frame::Frame;

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const INPUT_FORMAT: &str = "v4l2";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const DEFAULT_DEVICE: &str = "/dev/video0";

#[cfg(target_os = "macos")]
const INPUT_FORMAT: &str = "avfoundation";
#[cfg(target_os = "macos")]
const DEFAULT_DEVICE: &str = "0";

#[cfg(target_os = "windows")]
const INPUT_FORMAT: &str = "dshow";
#[cfg(target_os = "windows")]
const DEFAULT_DEVICE: &str = "video=Integrated Camera";

/// Live webcam capture through ffmpeg's platform device input.
///
/// The device is opened and decoded on its own thread; every decoded
/// picture is converted to RGB24 and published to the stream's sink.
pub struct FfmpegCamera {
    device: String,
}

impl FfmpegCamera {
    pub fn new(device: Option<String>) -> Self {
        Self {
            device: device.unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
        }
    }
}

impl Default for FfmpegCamera {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Camera for FfmpegCamera {
    fn open(&mut self, request: &StreamRequest) -> Result<Box<dyn MediaStream>, CameraError> {
        let sink = VideoSink::new();
        let live = Arc::new(AtomicBool::new(true));
        let stopped = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), CameraError>>(1);

        let device = self.device.clone();
        let request = *request;
        let thread_sink = sink.clone();
        let thread_live = live.clone();
        let thread_stopped = stopped.clone();
        let handle = thread::spawn(move || {
            run_capture(&device, &request, &ready_tx, &thread_sink, &thread_stopped);
            thread_live.store(false, Ordering::Relaxed);
        });

        let ready = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(CameraError::Open("capture thread exited".to_string())));
        if let Err(e) = ready {
            let _ = handle.join();
            return Err(e);
        }
        log::info!("Opened camera {} via {INPUT_FORMAT}", self.device);

        Ok(Box::new(FfmpegStream {
            sink,
            live,
            stopped,
            handle: Some(handle),
        }))
    }
}

struct FfmpegStream {
    sink: VideoSink,
    live: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MediaStream for FfmpegStream {
    fn sink(&self) -> VideoSink {
        self.sink.clone()
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Relaxed)
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Camera thread panicked");
            }
        }
    }
}

impl Drop for FfmpegStream {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_capture(
    device: &str,
    request: &StreamRequest,
    ready_tx: &Sender<Result<(), CameraError>>,
    sink: &VideoSink,
    stopped: &AtomicBool,
) {
    let mut ictx = match open_input(device, request) {
        Ok(ictx) => ictx,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    let Some(stream) = ictx.streams().best(ffmpeg_next::media::Type::Video) else {
        let _ = ready_tx.send(Err(CameraError::Open("no video stream".to_string())));
        return;
    };
    let stream_index = stream.index();
    let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
        .and_then(|ctx| ctx.decoder().video());
    let mut decoder = match decoder {
        Ok(decoder) => decoder,
        Err(e) => {
            let _ = ready_tx.send(Err(CameraError::Open(e.to_string())));
            return;
        }
    };

    let width = decoder.width();
    let height = decoder.height();
    let scaler = ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        width,
        height,
        ffmpeg_next::format::Pixel::RGB24,
        width,
        height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    );
    let mut scaler = match scaler {
        Ok(scaler) => scaler,
        Err(e) => {
            let _ = ready_tx.send(Err(CameraError::Open(e.to_string())));
            return;
        }
    };

    let _ = ready_tx.send(Ok(()));
    log::debug!("Camera delivering {width}x{height}");

    let mut sequence = 0u64;
    for (packet_stream, packet) in ictx.packets() {
        if stopped.load(Ordering::Relaxed) {
            break;
        }
        if packet_stream.index() != stream_index || decoder.send_packet(&packet).is_err() {
            continue;
        }
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        while decoder.receive_frame(&mut decoded).is_ok() {
            let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
            if let Err(e) = scaler.run(&decoded, &mut rgb_frame) {
                log::warn!("Dropping camera frame: {e}");
                continue;
            }
            let pixels = extract_rgb_pixels(&rgb_frame, width, height);
            sink.publish(Frame::new(pixels, width, height, sequence));
            sequence += 1;
        }
    }
    log::info!("Camera stream ended after {sequence} frames");
}

fn open_input(
    device: &str,
    request: &StreamRequest,
) -> Result<ffmpeg_next::format::context::Input, CameraError> {
    ffmpeg_next::init().map_err(|e| CameraError::Open(e.to_string()))?;
    ffmpeg_next::device::register_all();
    check_device_node(device)?;

    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name() == INPUT_FORMAT)
        .ok_or_else(|| CameraError::Open(format!("ffmpeg lacks the {INPUT_FORMAT} input")))?;

    let mut options = ffmpeg_next::Dictionary::new();
    options.set("video_size", &format!("{}x{}", request.width, request.height));

    match ffmpeg_next::format::open_with(device, &format, options) {
        Ok(ffmpeg_next::format::context::Context::Input(ictx)) => Ok(ictx),
        Ok(_) => Err(CameraError::Open(format!("{device} is not an input"))),
        Err(e) => Err(CameraError::Open(format!("{device}: {e}"))),
    }
}

/// Distinguishes missing devices from permission problems, which ffmpeg
/// reports only as opaque errno values.
#[cfg(target_os = "linux")]
fn check_device_node(device: &str) -> Result<(), CameraError> {
    match std::fs::File::open(device) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(CameraError::PermissionDenied(format!("{device}: {e}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CameraError::NoDevice(format!("{device}: {e}")))
        }
        Err(e) => Err(CameraError::Open(format!("{device}: {e}"))),
    }
}

#[cfg(not(target_os = "linux"))]
fn check_device_node(_device: &str) -> Result<(), CameraError> {
    Ok(())
}

fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_len = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_len]);
    }
    pixels
}
