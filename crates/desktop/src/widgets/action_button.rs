use iced::border::Border;
use iced::widget::{button, text};
use iced::{Color, Element, Shadow, Theme, Vector};

use crate::app::{scaled, Message};

const HOVER_DARKEN: f32 = 0.05;
const CORNER_RADIUS: f32 = 10.0;
const CORNER_RADIUS_SM: f32 = 8.0;
const SHADOW_BLUR: f32 = 10.0;
const SHADOW_ALPHA: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Primary,
    Success,
    Danger,
}

pub fn action_button<'a>(
    label: &'a str,
    on_press: Option<Message>,
    tone: Tone,
    fs: f32,
) -> Element<'a, Message> {
    build(label, on_press, tone, [10, 24], scaled(14.0, fs), CORNER_RADIUS)
}

pub fn action_button_small<'a>(
    label: &'a str,
    on_press: Option<Message>,
    tone: Tone,
    fs: f32,
) -> Element<'a, Message> {
    build(label, on_press, tone, [4, 12], scaled(12.0, fs), CORNER_RADIUS_SM)
}

fn build<'a>(
    label: &'a str,
    on_press: Option<Message>,
    tone: Tone,
    padding: [u16; 2],
    size: f32,
    radius: f32,
) -> Element<'a, Message> {
    button(text(label).size(size).color(Color::WHITE))
        .on_press_maybe(on_press)
        .padding(padding)
        .style(move |theme: &Theme, status: button::Status| {
            styled(tone_color(theme, tone), status, radius)
        })
        .into()
}

fn tone_color(theme: &Theme, tone: Tone) -> Color {
    let palette = theme.palette();
    match tone {
        Tone::Primary => palette.primary,
        Tone::Success => palette.success,
        Tone::Danger => palette.danger,
    }
}

fn styled(base: Color, status: button::Status, radius: f32) -> button::Style {
    let (background, shadow_alpha) = match status {
        button::Status::Hovered => (darken(base, 1.0), SHADOW_ALPHA),
        button::Status::Pressed => (darken(base, 2.0), SHADOW_ALPHA),
        button::Status::Disabled => (Color { a: 0.4, ..base }, 0.0),
        button::Status::Active => (base, SHADOW_ALPHA),
    };
    button::Style {
        background: Some(background.into()),
        text_color: Color::WHITE,
        border: Border {
            radius: radius.into(),
            ..Border::default()
        },
        shadow: Shadow {
            color: Color { a: shadow_alpha, ..base },
            offset: Vector::new(0.0, 3.0),
            blur_radius: SHADOW_BLUR,
        },
        ..button::Style::default()
    }
}

fn darken(color: Color, amount: f32) -> Color {
    let shift = HOVER_DARKEN * amount;
    Color {
        r: (color.r - shift).max(0.0),
        g: (color.g - shift).max(0.0),
        b: (color.b - shift).max(0.0),
        a: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_darken_clamps_at_black() {
        let c = darken(Color::from_rgb(0.02, 0.5, 1.0), 1.0);
        assert_eq!(c.r, 0.0);
        assert!((c.g - 0.45).abs() < 1e-6);
        assert!((c.b - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_disabled_has_no_shadow() {
        let style = styled(Color::from_rgb(0.2, 0.4, 0.9), button::Status::Disabled, 8.0);
        assert_eq!(style.shadow.color.a, 0.0);
    }
}
