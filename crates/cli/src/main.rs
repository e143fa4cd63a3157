use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};

use facewatch_core::capture::domain::camera::Camera;
use facewatch_core::capture::domain::video_sink::VideoSink;
use facewatch_core::capture::infrastructure::image_sequence_camera::ImageSequenceCamera;
use facewatch_core::detection::infrastructure::http_detection_client::HttpDetectionClient;
use facewatch_core::gallery::infrastructure::http_gallery_client::HttpGalleryClient;
use facewatch_core::overlay::infrastructure::label_font::resolve_label_font;
use facewatch_core::overlay::infrastructure::raster_surface::RasterSurface;
use facewatch_core::pipeline::capture_controller::CaptureController;
use facewatch_core::pipeline::display::{Display, SharedDisplay};
use facewatch_core::pipeline::frame_pipeline::{FramePipeline, TickOutcome};
use facewatch_core::pipeline::person_gallery::{DeleteOutcome, PersonGallery};
use facewatch_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facewatch_core::shared::api_client::ApiClient;
use facewatch_core::shared::config::{ClientConfig, OverlayPolicy};
use facewatch_core::shared::frame::Frame;
use facewatch_core::shared::sync::lock;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Control panel for a remote face and object recognition service.
#[derive(Parser)]
#[command(name = "facewatch", version)]
struct Cli {
    /// Backend base URL, e.g. http://localhost:8000/api.
    #[arg(long, global = true, env = "FACEWATCH_API_URL")]
    api_url: Option<String>,

    /// Settings file (defaults to the user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Font for overlay labels (defaults to a cached Arial).
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Per-request timeout in seconds (default: wait indefinitely).
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream a camera through the detector until interrupted.
    Watch(WatchArgs),
    /// Run detection once on a still image.
    Detect {
        /// Image to analyse.
        image: PathBuf,
        /// Write the annotated image here.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Manage the known-persons gallery.
    #[command(subcommand)]
    Persons(PersonsCommand),
    /// Check that the backend is reachable.
    Health,
}

#[derive(Args)]
struct WatchArgs {
    /// Replay the images in this directory instead of a live camera.
    #[arg(long, conflicts_with = "device")]
    source: Option<PathBuf>,

    /// Camera device (e.g. /dev/video0). Requires the `ffmpeg` feature.
    #[arg(long)]
    device: Option<String>,

    /// Save the last annotated frame here on exit.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Stop after this many seconds.
    #[arg(long)]
    duration: Option<u64>,

    /// Milliseconds between detection ticks.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Drop results older than the overlay already shown.
    #[arg(long)]
    newest_wins: bool,

    /// Stop when an image directory has been played once.
    #[arg(long, requires = "source")]
    once: bool,
}

#[derive(Subcommand)]
enum PersonsCommand {
    /// List enrolled persons.
    List,
    /// Enroll a person from a reference image.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        image: PathBuf,
    },
    /// Delete a person by id.
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let api = ApiClient::new(&config.api_base_url, config.request_timeout())?;

    match cli.command {
        Command::Watch(args) => run_watch(&config, &api, args),
        Command::Detect { image, output } => run_detect(&config, &api, &image, output.as_deref()),
        Command::Persons(command) => run_persons(&api, command),
        Command::Health => {
            let status = api.health()?;
            println!("{}: {status}", api.base_url());
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load(),
    };
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = Some(timeout);
    }
    if let Some(font) = &cli.font {
        config.font_path = Some(font.clone());
    }
    config.validate()?;
    Ok(config)
}

fn build_display(config: &ClientConfig) -> SharedDisplay {
    let font = resolve_label_font(config.font_path.as_deref());
    let surface = RasterSurface::new(config.capture_width, config.capture_height, font);
    Display::new(Some(Box::new(surface))).into_shared()
}

fn run_watch(
    config: &ClientConfig,
    api: &ApiClient,
    args: WatchArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = config.clone();
    if let Some(interval) = args.interval_ms {
        config.detect_interval_ms = interval;
    }
    if args.newest_wins {
        config.overlay_policy = OverlayPolicy::NewestCapture;
    }
    if args.device.is_some() {
        config.camera_device = args.device.clone();
    }
    config.validate()?;

    let camera = build_camera(&config, &args)?;
    let pipeline = FramePipeline::new(Arc::new(HttpDetectionClient::new(api.clone())))
        .with_jpeg_quality(config.jpeg_quality)
        .with_policy(config.overlay_policy)
        .with_logger(Box::new(StdoutPipelineLogger::new()));
    let mut controller = CaptureController::new(camera, Arc::new(pipeline), build_display(&config))
        .with_request(config.stream_request())
        .with_interval(config.detect_interval());

    let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })?;

    controller.start()?;
    log::info!("Watching; press Ctrl-C to stop");

    let deadline = args.duration.map(|s| Instant::now() + Duration::from_secs(s));
    loop {
        if stop_rx.recv_timeout(POLL_INTERVAL).is_ok() {
            log::info!("Interrupted");
            break;
        }
        if controller.check_stream() {
            break;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
    }

    controller.stop();
    controller.pipeline().summary();

    if let Some(output) = &args.output {
        save_view(controller.display(), output)?;
    }
    Ok(())
}

fn build_camera(
    config: &ClientConfig,
    args: &WatchArgs,
) -> Result<Box<dyn Camera>, Box<dyn std::error::Error>> {
    if let Some(dir) = &args.source {
        return Ok(Box::new(
            ImageSequenceCamera::new(dir.clone()).with_looping(!args.once),
        ));
    }
    live_camera(config)
}

#[cfg(feature = "ffmpeg")]
fn live_camera(config: &ClientConfig) -> Result<Box<dyn Camera>, Box<dyn std::error::Error>> {
    use facewatch_core::capture::infrastructure::ffmpeg_camera::FfmpegCamera;
    Ok(Box::new(FfmpegCamera::new(config.camera_device.clone())))
}

#[cfg(not(feature = "ffmpeg"))]
fn live_camera(_config: &ClientConfig) -> Result<Box<dyn Camera>, Box<dyn std::error::Error>> {
    Err("live capture needs the `ffmpeg` feature; use --source <DIR> to replay images".into())
}

fn save_view(display: &SharedDisplay, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let Some(frame) = lock(display).view() else {
        log::warn!("No frame to save");
        return Ok(());
    };
    frame.to_rgb_image().save(output)?;
    log::info!("Saved {}", output.display());
    Ok(())
}

fn run_detect(
    config: &ClientConfig,
    api: &ApiClient,
    image: &Path,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let frame = Frame::from_rgb_image(image::open(image)?.to_rgb8(), 0);
    let sink = VideoSink::new();
    sink.publish(frame);

    let display = build_display(config);
    lock(&display).bind_sink(sink);

    let pipeline = FramePipeline::new(Arc::new(HttpDetectionClient::new(api.clone())))
        .with_jpeg_quality(config.jpeg_quality);
    match pipeline.capture_and_detect(&display) {
        TickOutcome::Rendered => {}
        TickOutcome::Failed => return Err("detection failed (see log for details)".into()),
        other => return Err(format!("detection did not complete: {}", other.as_str()).into()),
    }

    let result = lock(&display).latest_detections().cloned().unwrap_or_default();
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(output) = output {
        save_view(&display, output)?;
    }
    Ok(())
}

fn run_persons(api: &ApiClient, command: PersonsCommand) -> Result<(), Box<dyn std::error::Error>> {
    let mut gallery = PersonGallery::new(Box::new(HttpGalleryClient::new(api.clone())));

    match command {
        PersonsCommand::List => {
            let persons = gallery.refresh()?;
            if persons.is_empty() {
                println!("No persons enrolled");
            }
            for person in persons {
                println!("{:>5}  {}", person.id, person.name);
            }
        }
        PersonsCommand::Add { name, image } => {
            gallery.form.name = name;
            gallery.form.image = Some(image);
            println!("{}", gallery.enroll()?);
        }
        PersonsCommand::Delete { id, yes } => {
            let name = gallery
                .refresh()
                .ok()
                .and_then(|persons| persons.iter().find(|p| p.id == id).map(|p| p.name.clone()))
                .unwrap_or_else(|| format!("person {id}"));
            let confirm = |prompt: &str| yes || ask(prompt);
            match gallery.delete(id, &name, confirm)? {
                DeleteOutcome::Deleted(message) => println!("{message}"),
                DeleteOutcome::Cancelled => println!("Cancelled"),
            }
        }
    }
    Ok(())
}

fn ask(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    let _ = io::stdout().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_watch_flags() {
        let cli = Cli::try_parse_from([
            "facewatch",
            "watch",
            "--source",
            "frames",
            "--interval-ms",
            "250",
            "--newest-wins",
            "--once",
        ])
        .unwrap();
        let Command::Watch(args) = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(args.source, Some(PathBuf::from("frames")));
        assert_eq!(args.interval_ms, Some(250));
        assert!(args.newest_wins);
        assert!(args.once);
    }

    #[test]
    fn test_once_requires_source() {
        assert!(Cli::try_parse_from(["facewatch", "watch", "--once"]).is_err());
    }

    #[test]
    fn test_global_api_url_after_subcommand() {
        let cli = Cli::try_parse_from([
            "facewatch",
            "persons",
            "delete",
            "7",
            "--yes",
            "--api-url",
            "http://backend:9000/api",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://backend:9000/api"));
        assert!(matches!(
            cli.command,
            Command::Persons(PersonsCommand::Delete { id: 7, yes: true })
        ));
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"jpeg_quality": 60}"#).unwrap();

        let cli = Cli::try_parse_from([
            "facewatch",
            "--config",
            path.to_str().unwrap(),
            "--api-url",
            "http://other/api",
            "--timeout",
            "3",
            "health",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.jpeg_quality, 60);
        assert_eq!(config.api_base_url, "http://other/api");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(3)));
    }
}
