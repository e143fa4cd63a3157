use std::path::Path;

use iced::widget::{button, column, container, row, text, Space};
use iced::{Color, Element, Length, Theme};

use crate::app::{scaled, Message};
use crate::theme::{surface_color, tertiary_color};

const CORNER_RADIUS: f32 = 12.0;

/// Labelled row showing the chosen file name and a "Choose" button.
pub fn file_row<'a>(
    fs: f32,
    label: &str,
    path: Option<&Path>,
    on_browse: Message,
    theme: &Theme,
) -> Element<'a, Message> {
    let tertiary = tertiary_color(theme);
    let surface = surface_color(theme);
    let border = border_light_color(theme);

    let display_text: Element<'a, Message> = if let Some(name) = path.and_then(|p| p.file_name()) {
        text(name.to_string_lossy().to_string())
            .size(scaled(14.0, fs))
            .font(iced::Font {
                weight: iced::font::Weight::Medium,
                ..iced::Font::DEFAULT
            })
            .into()
    } else {
        text("No file selected")
            .size(scaled(14.0, fs))
            .color(tertiary)
            .into()
    };

    let btn = button(text("Choose").size(scaled(13.0, fs)))
        .on_press(on_browse)
        .padding([6, 14])
        .style(button::secondary);

    let label_text = text(label.to_uppercase())
        .size(scaled(11.0, fs))
        .font(iced::Font {
            weight: iced::font::Weight::Semibold,
            ..iced::Font::DEFAULT
        })
        .color(tertiary);

    let info = column![label_text, Space::new().height(2), display_text].width(Length::Fill);

    container(row![info, btn].spacing(8).align_y(iced::Alignment::Center))
        .padding([10, 14])
        .width(Length::Fill)
        .style(move |_theme: &Theme| container::Style {
            background: Some(iced::Background::Color(surface)),
            border: iced::border::Border {
                color: border,
                width: 1.0,
                radius: CORNER_RADIUS.into(),
            },
            ..container::Style::default()
        })
        .into()
}

fn border_light_color(theme: &Theme) -> Color {
    let p = theme.palette();
    Color { a: 0.10, ..p.text }
}
