use iced::widget::{checkbox, column, pick_list, row, slider, text, text_input, Space};
use iced::{Element, Theme};

use facewatch_core::shared::config::OverlayPolicy;

use crate::app::{scaled, Message};
use crate::settings::{Appearance, Settings};
use crate::theme::tertiary_color;
use crate::widgets::action_button::{action_button, Tone};

pub const INTERVAL_RANGE_MS: std::ops::RangeInclusive<u32> = 100..=2000;

pub fn view<'a>(
    settings: &Settings,
    api_url: &str,
    device: &str,
    theme: &Theme,
) -> Element<'a, Message> {
    let fs = settings.font_scale;
    let tertiary = tertiary_color(theme);
    let client = &settings.client;
    let interval = client.detect_interval_ms.min(u32::MAX as u64) as u32;

    column![
        text("Backend").size(scaled(16.0, fs)),
        Space::new().height(8),
        text_input("http://localhost:8000/api", api_url)
            .on_input(Message::ApiUrlChanged)
            .on_submit(Message::ApplyConnection)
            .size(scaled(13.0, fs))
            .padding(8),
        Space::new().height(12),
        text("Camera").size(scaled(16.0, fs)),
        Space::new().height(8),
        text_input("Default device, or a folder of images to replay", device)
            .on_input(Message::DeviceChanged)
            .on_submit(Message::ApplyConnection)
            .size(scaled(13.0, fs))
            .padding(8),
        Space::new().height(8),
        action_button("Apply", Some(Message::ApplyConnection), Tone::Primary, fs),
        Space::new().height(20),
        text("Detection").size(scaled(16.0, fs)),
        Space::new().height(8),
        row![
            text("Interval").size(scaled(13.0, fs)),
            slider(INTERVAL_RANGE_MS, interval, Message::IntervalChanged).step(50u32),
            text(format!("{interval} ms")).size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(12),
        checkbox(client.overlay_policy == OverlayPolicy::NewestCapture)
            .label("Ignore results older than the overlay shown")
            .on_toggle(Message::NewestCaptureChanged)
            .text_size(scaled(13.0, fs)),
        Space::new().height(12),
        text("Changes apply the next time the camera starts.")
            .size(scaled(12.0, fs))
            .color(tertiary),
        Space::new().height(20),
        text("Appearance").size(scaled(16.0, fs)),
        Space::new().height(8),
        row![
            text("Mode").size(scaled(13.0, fs)),
            pick_list(Appearance::ALL, Some(settings.appearance), Message::AppearanceChanged)
                .text_size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
        Space::new().height(12),
        checkbox(settings.high_contrast)
            .label("High contrast")
            .on_toggle(Message::HighContrastChanged)
            .text_size(scaled(13.0, fs)),
        Space::new().height(12),
        row![
            text("Font size").size(scaled(13.0, fs)),
            slider(0.8..=1.5, settings.font_scale, Message::FontScaleChanged).step(0.05),
            text(format!("{:.0}%", settings.font_scale * 100.0)).size(scaled(13.0, fs)),
        ]
        .spacing(12)
        .align_y(iced::Alignment::Center),
    ]
    .spacing(0)
    .into()
}
