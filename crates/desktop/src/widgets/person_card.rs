use iced::widget::{container, row, text};
use iced::{Element, Length, Theme};

use facewatch_core::gallery::domain::person::Person;

use crate::app::{scaled, Message};
use crate::theme::surface_color;
use crate::widgets::action_button::{action_button_small, Tone};

const CORNER_RADIUS: f32 = 10.0;

pub fn person_card<'a>(person: &'a Person, fs: f32, theme: &Theme) -> Element<'a, Message> {
    let surface = surface_color(theme);
    let delete = action_button_small(
        "Delete",
        Some(Message::DeleteRequested(person.id, person.name.clone())),
        Tone::Danger,
        fs,
    );

    container(
        row![
            text(&person.name).size(scaled(14.0, fs)).width(Length::Fill),
            delete
        ]
        .spacing(8)
        .align_y(iced::Alignment::Center),
    )
    .padding([8, 12])
    .width(Length::Fill)
    .style(move |_: &Theme| container::Style {
        background: Some(iced::Background::Color(surface)),
        border: iced::border::Border {
            radius: CORNER_RADIUS.into(),
            ..iced::border::Border::default()
        },
        ..container::Style::default()
    })
    .into()
}
