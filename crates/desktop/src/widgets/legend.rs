use iced::border::Border;
use iced::widget::{container, row, text, Space};
use iced::{Color, Element, Theme};

use facewatch_core::overlay::domain::surface::Color as OverlayColor;

use crate::app::{scaled, Message};
use crate::theme::overlay_color;

const SWATCH: f32 = 12.0;

pub const ENTRIES: &[(OverlayColor, &str)] = &[
    (OverlayColor::GREEN, "Known Face"),
    (OverlayColor::RED, "Unknown Face"),
    (OverlayColor::BLUE, "Object"),
];

/// Colour key for the overlay boxes.
pub fn legend<'a>(fs: f32) -> Element<'a, Message> {
    row(ENTRIES.iter().map(|&(color, label)| entry(overlay_color(color), label, fs)))
        .spacing(16)
        .align_y(iced::Alignment::Center)
        .into()
}

fn entry<'a>(color: Color, label: &'a str, fs: f32) -> Element<'a, Message> {
    let swatch = container(Space::new().width(SWATCH).height(SWATCH)).style(move |_: &Theme| {
        container::Style {
            border: Border {
                color,
                width: 2.0,
                radius: 2.0.into(),
            },
            ..container::Style::default()
        }
    });
    row![swatch, text(label).size(scaled(12.0, fs))]
        .spacing(6)
        .align_y(iced::Alignment::Center)
        .into()
}
