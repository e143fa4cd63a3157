use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use iced::widget::{button, column, container, image, row, scrollable, text};
use iced::{Element, Length, Subscription, Task, Theme};
use rfd::{AsyncMessageDialog, MessageButtons, MessageDialogResult, MessageLevel};

use facewatch_core::capture::domain::camera::Camera;
use facewatch_core::capture::infrastructure::image_sequence_camera::ImageSequenceCamera;
use facewatch_core::detection::infrastructure::http_detection_client::HttpDetectionClient;
use facewatch_core::gallery::domain::person::Person;
use facewatch_core::gallery::infrastructure::http_gallery_client::HttpGalleryClient;
use facewatch_core::overlay::infrastructure::raster_surface::RasterSurface;
use facewatch_core::pipeline::capture_controller::CaptureController;
use facewatch_core::pipeline::display::{Display, SharedDisplay};
use facewatch_core::pipeline::frame_pipeline::FramePipeline;
use facewatch_core::pipeline::person_gallery::{delete_prompt, EnrollmentForm};
use facewatch_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facewatch_core::shared::api_client::ApiClient;
use facewatch_core::shared::config::{ClientConfig, OverlayPolicy};
use facewatch_core::shared::constants::{CAMERA_ERROR_MESSAGE, IMAGE_EXTENSIONS};
use facewatch_core::shared::sync::lock;

use crate::settings::{Appearance, Settings};
use crate::tabs;
use crate::tabs::main_tab::MainView;
use crate::theme;
use crate::workers::gallery_worker::{GalleryEvent, GalleryRequest, GalleryWorker};
use crate::workers::surface_loader;

pub const WINDOW_TITLE: &str = "Face Recognition System";

const FRAME_POLL: Duration = Duration::from_millis(33);
const IDLE_POLL: Duration = Duration::from_millis(150);

// ---------------------------------------------------------------------------
// Tab enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Main,
    Settings,
}

impl Tab {
    const ALL: &[Tab] = &[Tab::Main, Tab::Settings];

    fn label(self) -> &'static str {
        match self {
            Tab::Main => "Main",
            Tab::Settings => "Settings",
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    TabSelected(Tab),
    StartCamera,
    StopCamera,
    Tick,
    NameChanged(String),
    SelectImage,
    ImageSelected(Option<PathBuf>),
    Upload,
    DeleteRequested(i64, String),
    DeleteConfirmed(i64, String, bool),
    AlertClosed,
    ApiUrlChanged(String),
    DeviceChanged(String),
    ApplyConnection,
    IntervalChanged(u32),
    NewestCaptureChanged(bool),
    AppearanceChanged(Appearance),
    HighContrastChanged(bool),
    FontScaleChanged(f32),
    PollSystemTheme,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    active_tab: Tab,
    pub settings: Settings,
    api_url_input: String,
    device_input: String,
    display: SharedDisplay,
    capture: Option<CaptureController>,
    capture_stale: bool,
    labelled_surface: Option<Receiver<RasterSurface>>,
    preview: Option<image::Handle>,
    preview_key: Option<(Option<u64>, u64)>,
    gallery: Option<GalleryWorker>,
    form: EnrollmentForm,
    uploading: bool,
    persons: Vec<Person>,
    gallery_status: Option<String>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        let client = &settings.client;
        let surface = RasterSurface::new(client.capture_width, client.capture_height, None);

        let mut app = Self {
            active_tab: Tab::Main,
            api_url_input: client.api_base_url.clone(),
            device_input: client.camera_device.clone().unwrap_or_default(),
            display: Display::new(Some(Box::new(surface))).into_shared(),
            labelled_surface: Some(surface_loader::spawn(
                client.capture_width,
                client.capture_height,
                client.font_path.clone(),
            )),
            capture: None,
            capture_stale: false,
            preview: None,
            preview_key: None,
            gallery: None,
            form: EnrollmentForm::default(),
            uploading: false,
            persons: Vec::new(),
            gallery_status: None,
            settings,
        };
        app.connect_gallery();
        (app, Task::none())
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TabSelected(tab) => {
                self.active_tab = tab;
            }
            Message::StartCamera => return self.start_camera(),
            Message::StopCamera => self.stop_camera(),
            Message::Tick => return self.on_tick(),
            Message::NameChanged(name) => {
                self.form.name = name;
            }
            Message::SelectImage => {
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Select reference image")
                            .add_filter("Images", IMAGE_EXTENSIONS)
                            .pick_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::ImageSelected,
                );
            }
            Message::ImageSelected(Some(path)) => {
                self.form.image = Some(path);
            }
            Message::ImageSelected(None) => {}
            Message::Upload => return self.upload(),
            Message::DeleteRequested(id, name) => {
                let prompt = delete_prompt(&name);
                return Task::perform(
                    async move {
                        let answer = AsyncMessageDialog::new()
                            .set_level(MessageLevel::Warning)
                            .set_title(WINDOW_TITLE)
                            .set_description(prompt)
                            .set_buttons(MessageButtons::YesNo)
                            .show()
                            .await;
                        (id, name, answer == MessageDialogResult::Yes)
                    },
                    |(id, name, confirmed)| Message::DeleteConfirmed(id, name, confirmed),
                );
            }
            Message::DeleteConfirmed(id, name, true) => {
                if let Some(gallery) = &self.gallery {
                    gallery.send(GalleryRequest::Delete { id, name });
                }
            }
            Message::DeleteConfirmed(_, _, false) => {}
            Message::AlertClosed => {}
            Message::ApiUrlChanged(url) => {
                self.api_url_input = url;
            }
            Message::DeviceChanged(device) => {
                self.device_input = device;
            }
            Message::ApplyConnection => return self.apply_connection(),
            Message::IntervalChanged(ms) => {
                self.settings.client.detect_interval_ms = ms as u64;
                self.capture_stale = true;
                self.settings.save();
            }
            Message::NewestCaptureChanged(enabled) => {
                self.settings.client.overlay_policy = if enabled {
                    OverlayPolicy::NewestCapture
                } else {
                    OverlayPolicy::LastToLand
                };
                self.capture_stale = true;
                self.settings.save();
            }
            Message::AppearanceChanged(appearance) => {
                self.settings.appearance = appearance;
                self.settings.save();
            }
            Message::HighContrastChanged(enabled) => {
                self.settings.high_contrast = enabled;
                self.settings.save();
            }
            Message::FontScaleChanged(scale) => {
                self.settings.font_scale = scale;
                self.settings.save();
            }
            Message::PollSystemTheme => {
                // Theme is resolved fresh in theme() on every render,
                // so just requesting a redraw is enough.
            }
        }
        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let fs = self.settings.font_scale;
        let theme = self.theme();

        let tab_bar = row(Tab::ALL
            .iter()
            .map(|&tab| {
                let label = text(tab.label()).size(scaled(13.0, fs));
                let btn = button(label)
                    .on_press(Message::TabSelected(tab))
                    .padding([6, 14]);
                if tab == self.active_tab {
                    btn.style(button::primary).into()
                } else {
                    btn.style(button::text).into()
                }
            })
            .collect::<Vec<_>>())
        .spacing(2);

        let content: Element<'_, Message> = match self.active_tab {
            Tab::Main => tabs::main_tab::view(
                MainView {
                    fs,
                    streaming: self.is_streaming(),
                    preview: self.preview.as_ref(),
                    form: &self.form,
                    uploading: self.uploading,
                    persons: &self.persons,
                    gallery_status: self.gallery_status.as_deref(),
                },
                &theme,
            ),
            Tab::Settings => scrollable(tabs::settings_tab::view(
                &self.settings,
                &self.api_url_input,
                &self.device_input,
                &theme,
            ))
            .into(),
        };

        let title = text(WINDOW_TITLE).size(scaled(22.0, fs)).font(iced::Font {
            weight: iced::font::Weight::Bold,
            ..iced::Font::DEFAULT
        });

        column![
            row![title, container(tab_bar).align_right(Length::Fill)]
                .align_y(iced::Alignment::Center)
                .padding([8, 16]),
            container(content).padding(16).height(Length::Fill),
        ]
        .height(Length::Fill)
        .into()
    }

    pub fn theme(&self) -> Theme {
        theme::resolve_theme(self.settings.appearance, self.settings.high_contrast)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let poll = if self.is_streaming() { FRAME_POLL } else { IDLE_POLL };
        let tick = iced::time::every(poll).map(|_| Message::Tick);

        if self.settings.appearance == Appearance::System {
            Subscription::batch([
                tick,
                iced::time::every(Duration::from_secs(2)).map(|_| Message::PollSystemTheme),
            ])
        } else {
            tick
        }
    }

    fn is_streaming(&self) -> bool {
        self.capture.as_ref().is_some_and(CaptureController::is_streaming)
    }

    // --- Camera ---

    fn start_camera(&mut self) -> Task<Message> {
        if self.capture.is_none() || self.capture_stale {
            match build_capture(&self.settings.client, &self.display) {
                Ok(capture) => {
                    self.capture = Some(capture);
                    self.capture_stale = false;
                }
                Err(message) => return alert(MessageLevel::Error, message),
            }
        }
        self.install_labelled_surface();

        let Some(capture) = self.capture.as_mut() else {
            return Task::none();
        };
        match capture.start() {
            Ok(()) => Task::none(),
            Err(e) => {
                log::warn!("Camera unavailable: {:?}", e);
                alert(MessageLevel::Error, e.user_message())
            }
        }
    }

    fn stop_camera(&mut self) {
        if let Some(capture) = self.capture.as_mut() {
            if capture.stop() {
                capture.pipeline().summary();
            }
        }
        self.preview = None;
        self.preview_key = None;
    }

    fn on_tick(&mut self) -> Task<Message> {
        if let Some(capture) = self.capture.as_mut() {
            if capture.check_stream() {
                log::info!("Camera stream ended");
                self.preview = None;
                self.preview_key = None;
            }
        }
        if !self.is_streaming() {
            self.install_labelled_surface();
        } else {
            self.refresh_preview();
        }

        let events = self.gallery.as_ref().map(GalleryWorker::drain).unwrap_or_default();
        Task::batch(events.into_iter().map(|e| self.on_gallery_event(e)).collect::<Vec<_>>())
    }

    /// Swaps in the labelled overlay surface once its font is ready. Only
    /// done between sessions so a shown overlay is never replaced by a
    /// blank surface.
    fn install_labelled_surface(&mut self) {
        if self.is_streaming() {
            return;
        }
        let Some(rx) = &self.labelled_surface else {
            return;
        };
        match rx.try_recv() {
            Ok(surface) => {
                lock(&self.display).set_surface(Some(Box::new(surface)));
                self.labelled_surface = None;
                log::debug!("Overlay labels enabled");
            }
            Err(crossbeam_channel::TryRecvError::Empty) => {}
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                self.labelled_surface = None;
            }
        }
    }

    fn refresh_preview(&mut self) {
        let display = lock(&self.display);
        let latest = display
            .sink()
            .and_then(|sink| sink.current_frame())
            .map(|frame| frame.sequence());
        let key = (latest, display.render_count());
        if self.preview_key == Some(key) {
            return;
        }
        if let Some(frame) = display.view() {
            self.preview = Some(image::Handle::from_rgba(
                frame.width(),
                frame.height(),
                frame.to_rgba(),
            ));
            self.preview_key = Some(key);
        }
    }

    // --- Gallery ---

    fn connect_gallery(&mut self) {
        let client = &self.settings.client;
        match ApiClient::new(&client.api_base_url, client.request_timeout()) {
            Ok(api) => {
                let worker = GalleryWorker::spawn(Box::new(HttpGalleryClient::new(api)));
                worker.send(GalleryRequest::Refresh);
                self.gallery = Some(worker);
                self.gallery_status = None;
            }
            Err(e) => {
                log::warn!("Gallery unavailable: {e}");
                self.gallery = None;
                self.gallery_status = Some(e.user_message("Backend unavailable"));
            }
        }
        self.uploading = false;
    }

    fn upload(&mut self) -> Task<Message> {
        let Some(gallery) = &self.gallery else {
            return alert(MessageLevel::Error, "Error uploading person. Please try again.");
        };
        self.uploading = true;
        gallery.send(GalleryRequest::Enroll {
            name: self.form.name.clone(),
            image: self.form.image.clone(),
        });
        Task::none()
    }

    fn on_gallery_event(&mut self, event: GalleryEvent) -> Task<Message> {
        match event {
            GalleryEvent::Persons(persons) => {
                self.persons = persons;
                self.gallery_status = None;
                Task::none()
            }
            GalleryEvent::LoadFailed(message) => {
                self.gallery_status = Some(format!("Could not load persons: {message}"));
                Task::none()
            }
            GalleryEvent::Enrolled(message) => {
                self.uploading = false;
                self.form.clear();
                alert(MessageLevel::Info, message)
            }
            GalleryEvent::EnrollFailed(message) => {
                self.uploading = false;
                alert(MessageLevel::Error, message)
            }
            GalleryEvent::Deleted(message) => alert(MessageLevel::Info, message),
            GalleryEvent::DeleteFailed(message) => alert(MessageLevel::Error, message),
        }
    }

    // --- Settings ---

    fn apply_connection(&mut self) -> Task<Message> {
        let url = self.api_url_input.trim().to_string();
        let device = self.device_input.trim().to_string();

        let mut client = self.settings.client.clone();
        client.api_base_url = url;
        client.camera_device = (!device.is_empty()).then_some(device);
        if let Err(e) = client.validate() {
            return alert(MessageLevel::Error, e.to_string());
        }

        let url_changed = client.api_base_url != self.settings.client.api_base_url;
        self.settings.client = client;
        self.settings.save();
        self.capture_stale = true;
        if url_changed {
            self.connect_gallery();
        }
        Task::none()
    }
}

fn build_capture(client: &ClientConfig, display: &SharedDisplay) -> Result<CaptureController, String> {
    let api = ApiClient::new(&client.api_base_url, client.request_timeout())
        .map_err(|e| e.user_message("Backend unavailable"))?;
    let camera = build_camera(client).ok_or_else(|| CAMERA_ERROR_MESSAGE.to_string())?;

    let pipeline = FramePipeline::new(Arc::new(HttpDetectionClient::new(api)))
        .with_jpeg_quality(client.jpeg_quality)
        .with_policy(client.overlay_policy)
        .with_logger(Box::new(StdoutPipelineLogger::new()));
    Ok(CaptureController::new(camera, Arc::new(pipeline), display.clone())
        .with_request(client.stream_request())
        .with_interval(client.detect_interval()))
}

/// A directory in `camera_device` is replayed as a camera; anything else
/// names a live device.
fn build_camera(client: &ClientConfig) -> Option<Box<dyn Camera>> {
    if let Some(dir) = client.camera_device.as_deref().map(Path::new).filter(|p| p.is_dir()) {
        return Some(Box::new(ImageSequenceCamera::new(dir)));
    }
    live_camera(client)
}

#[cfg(feature = "ffmpeg")]
fn live_camera(client: &ClientConfig) -> Option<Box<dyn Camera>> {
    use facewatch_core::capture::infrastructure::ffmpeg_camera::FfmpegCamera;
    Some(Box::new(FfmpegCamera::new(client.camera_device.clone())))
}

#[cfg(not(feature = "ffmpeg"))]
fn live_camera(_client: &ClientConfig) -> Option<Box<dyn Camera>> {
    log::warn!("Built without the `ffmpeg` feature; only image folders can be replayed");
    None
}

fn alert(level: MessageLevel, message: impl Into<String>) -> Task<Message> {
    let message = message.into();
    Task::perform(
        async move {
            AsyncMessageDialog::new()
                .set_level(level)
                .set_title(WINDOW_TITLE)
                .set_description(message)
                .set_buttons(MessageButtons::Ok)
                .show()
                .await;
        },
        |_| Message::AlertClosed,
    )
}

/// Scale a base font size by the user's font_scale setting.
pub fn scaled(base: f32, font_scale: f32) -> f32 {
    (base * font_scale).round()
}
