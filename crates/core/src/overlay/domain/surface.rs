use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const GREEN: Color = Color::rgb(0x00, 0xff, 0x00);
    pub const RED: Color = Color::rgb(0xff, 0x00, 0x00);
    pub const BLUE: Color = Color::rgb(0x00, 0x00, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub size_px: f32,
    pub bold: bool,
}

/// A 2D drawing target the overlay is rendered onto.
///
/// Coordinates are pixels of the surface's current size, origin top-left.
/// Text is positioned by its baseline, as on an HTML canvas.
pub trait Surface: Send {
    fn dimensions(&self) -> (u32, u32);

    /// Changes the pixel size. Content is unspecified afterwards.
    fn resize(&mut self, width: u32, height: u32);

    fn clear(&mut self);

    /// Paints `frame` over the whole surface, scaling if sizes differ.
    fn draw_frame(&mut self, frame: &Frame);

    /// Outlines `bbox` with a stroke of `line_width` centred on its edges.
    fn stroke_rect(&mut self, bbox: &BoundingBox, color: Color, line_width: u32);

    fn fill_text(&mut self, text: &str, x: i32, y: i32, color: Color, style: TextStyle);

    fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>;

    /// Copy of the current pixels.
    fn snapshot(&self) -> Frame;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_pure_primaries() {
        assert_eq!(Color::GREEN, Color::rgb(0, 255, 0));
        assert_eq!(Color::RED, Color::rgb(255, 0, 0));
        assert_eq!(Color::BLUE, Color::rgb(0, 0, 255));
    }
}
