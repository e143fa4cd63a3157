use iced::border::Border;
use iced::widget::{column, container, image, row, scrollable, text, text_input, Space};
use iced::{Color, ContentFit, Element, Length, Theme};

use facewatch_core::gallery::domain::person::Person;
use facewatch_core::pipeline::person_gallery::EnrollmentForm;

use crate::app::{scaled, Message};
use crate::theme::{surface_color, tertiary_color};
use crate::widgets::action_button::{action_button, Tone};
use crate::widgets::file_row::file_row;
use crate::widgets::legend::legend;
use crate::widgets::person_card::person_card;

const VIDEO_HEIGHT: f32 = 360.0;

pub struct MainView<'a> {
    pub fs: f32,
    pub streaming: bool,
    pub preview: Option<&'a image::Handle>,
    pub form: &'a EnrollmentForm,
    pub uploading: bool,
    pub persons: &'a [Person],
    pub gallery_status: Option<&'a str>,
}

pub fn view<'a>(v: MainView<'a>, theme: &Theme) -> Element<'a, Message> {
    row![
        camera_section(&v, theme),
        gallery_section(&v, theme)
    ]
    .spacing(20)
    .into()
}

fn camera_section<'a>(v: &MainView<'a>, theme: &Theme) -> Element<'a, Message> {
    let fs = v.fs;
    let video: Element<'a, Message> = match (v.streaming, v.preview) {
        (true, Some(handle)) => image(handle.clone())
            .content_fit(ContentFit::Contain)
            .width(Length::Fill)
            .height(VIDEO_HEIGHT)
            .into(),
        (true, None) => placeholder(text("Waiting for camera\u{2026}").size(scaled(14.0, fs)).into(), theme),
        (false, _) => placeholder(
            column![
                text("Camera feed will appear here").size(scaled(15.0, fs)),
                Space::new().height(12),
                legend(fs),
            ]
            .align_x(iced::Alignment::Center)
            .into(),
            theme,
        ),
    };

    let control = if v.streaming {
        action_button("Stop Camera", Some(Message::StopCamera), Tone::Danger, fs)
    } else {
        action_button("Start Camera", Some(Message::StartCamera), Tone::Primary, fs)
    };

    let mut section = column![video, Space::new().height(12), control]
        .align_x(iced::Alignment::Center)
        .width(Length::FillPortion(3));
    if v.streaming {
        section = section.push(Space::new().height(8)).push(legend(fs));
    }
    section.into()
}

fn placeholder<'a>(content: Element<'a, Message>, theme: &Theme) -> Element<'a, Message> {
    let surface = surface_color(theme);
    let tertiary = tertiary_color(theme);
    container(content)
        .width(Length::Fill)
        .height(VIDEO_HEIGHT)
        .center_x(Length::Fill)
        .center_y(VIDEO_HEIGHT)
        .style(move |_: &Theme| container::Style {
            background: Some(iced::Background::Color(surface)),
            text_color: Some(tertiary),
            border: Border {
                color: Color { a: 0.3, ..tertiary },
                width: 1.0,
                radius: 12.0.into(),
            },
            ..container::Style::default()
        })
        .into()
}

fn gallery_section<'a>(v: &MainView<'a>, theme: &Theme) -> Element<'a, Message> {
    let fs = v.fs;
    let bold = iced::Font {
        weight: iced::font::Weight::Bold,
        ..iced::Font::DEFAULT
    };

    let name_input = text_input("Enter person name", &v.form.name)
        .on_input(Message::NameChanged)
        .on_submit(Message::Upload)
        .size(scaled(14.0, fs))
        .padding(10);

    let upload = action_button(
        if v.uploading { "Uploading\u{2026}" } else { "Upload & Add Person" },
        (!v.uploading).then_some(Message::Upload),
        Tone::Success,
        fs,
    );

    let cards = column(v.persons.iter().map(|p| person_card(p, fs, theme))).spacing(6);

    let mut section = column![
        text("Add Person to Database").size(scaled(18.0, fs)).font(bold),
        Space::new().height(10),
        name_input,
        Space::new().height(8),
        file_row(fs, "Reference image", v.form.image.as_deref(), Message::SelectImage, theme),
        Space::new().height(10),
        upload,
        Space::new().height(20),
        text(format!("Persons in Database ({})", v.persons.len()))
            .size(scaled(15.0, fs))
            .font(bold),
        Space::new().height(8),
    ]
    .width(Length::FillPortion(2));

    if let Some(status) = v.gallery_status {
        section = section.push(
            text(status.to_string())
                .size(scaled(12.0, fs))
                .color(tertiary_color(theme)),
        );
    }
    section.push(scrollable(cards).height(Length::Fill)).into()
}
