use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, Sender};

use crate::capture::domain::camera::{Camera, CameraError, MediaStream, StreamRequest};
use crate::capture::domain::video_sink::VideoSink;
use crate::shared::constants::{IMAGE_EXTENSIONS, IMAGE_SEQUENCE_FPS};
use crate::shared::frame::Frame;

/// Replays the images of a directory as a live camera feed.
///
/// Files are played in name order at a fixed frame rate. Without looping the
/// stream ends after the last image, which consumers observe as a lost stream.
pub struct ImageSequenceCamera {
    dir: PathBuf,
    fps: u32,
    looping: bool,
}

impl ImageSequenceCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fps: IMAGE_SEQUENCE_FPS,
            looping: true,
        }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

impl Camera for ImageSequenceCamera {
    fn open(&mut self, _request: &StreamRequest) -> Result<Box<dyn MediaStream>, CameraError> {
        let files = list_images(&self.dir)?;
        log::info!(
            "Replaying {} images from {} at {} fps",
            files.len(),
            self.dir.display(),
            self.fps
        );
        let interval = Duration::from_secs_f64(1.0 / self.fps as f64);
        Ok(Box::new(ImageSequenceStream::spawn(
            files,
            interval,
            self.looping,
        )))
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CameraError> {
    let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => {
            CameraError::PermissionDenied(format!("{}: {e}", dir.display()))
        }
        std::io::ErrorKind::NotFound => CameraError::NoDevice(format!("{}: {e}", dir.display())),
        _ => CameraError::Open(format!("{}: {e}", dir.display())),
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_image(path))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(CameraError::NoDevice(format!(
            "no images in {}",
            dir.display()
        )));
    }
    Ok(files)
}

fn is_image(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

struct ImageSequenceStream {
    sink: VideoSink,
    live: Arc<AtomicBool>,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ImageSequenceStream {
    fn spawn(files: Vec<PathBuf>, interval: Duration, looping: bool) -> Self {
        let sink = VideoSink::new();
        let live = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);

        let thread_sink = sink.clone();
        let thread_live = live.clone();
        let handle = thread::spawn(move || {
            let ticker = crossbeam_channel::tick(interval);
            let mut sequence = 0u64;
            'playback: loop {
                for path in &files {
                    match image::open(path) {
                        Ok(img) => {
                            thread_sink.publish(Frame::from_rgb_image(img.to_rgb8(), sequence));
                            sequence += 1;
                        }
                        Err(e) => log::warn!("Skipping {}: {e}", path.display()),
                    }
                    select! {
                        recv(ticker) -> _ => {}
                        recv(stop_rx) -> _ => break 'playback,
                    }
                }
                if !looping || sequence == 0 {
                    break;
                }
            }
            thread_live.store(false, Ordering::Relaxed);
        });

        Self {
            sink,
            live,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }
}

impl MediaStream for ImageSequenceStream {
    fn sink(&self) -> VideoSink {
        self.sink.clone()
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Relaxed)
    }

    fn stop(&mut self) {
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Image sequence thread panicked");
            }
        }
        self.live.store(false, Ordering::Relaxed);
    }
}

impl Drop for ImageSequenceStream {
    fn drop(&mut self) {
        self.stop();
    }
}
