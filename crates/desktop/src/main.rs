mod app;
mod settings;
mod tabs;
mod theme;
mod widgets;
mod workers;

use app::{App, WINDOW_TITLE};

fn main() -> iced::Result {
    env_logger::init();

    iced::application(App::new, App::update, App::view)
        .title(WINDOW_TITLE)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(iced::window::Settings {
            size: iced::Size::new(1100.0, 640.0),
            min_size: Some(iced::Size::new(800.0, 480.0)),
            ..Default::default()
        })
        .run()
}
