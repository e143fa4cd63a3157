use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::overlay::domain::surface::{Color, Surface, TextStyle};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// In-memory RGB canvas backed by an [`RgbImage`].
///
/// Without a font, text calls are ignored and only shapes are drawn.
pub struct RasterSurface {
    image: RgbImage,
    font: Option<FontArc>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32, font: Option<FontArc>) -> Self {
        Self {
            image: RgbImage::new(width, height),
            font,
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

/// Clips an outline to one pixel beyond the canvas so off-screen edges stay
/// off-screen without walking their full length. `None` when nothing of the
/// outline can be visible.
fn clip_ring(ring: BoundingBox, width: u32, height: u32) -> Option<BoundingBox> {
    let (width, height) = (width as i32, height as i32);
    // Drawn edges lie on x1, x2 - 1, y1 and y2 - 1.
    if ring.is_empty() || ring.x1 >= width || ring.y1 >= height || ring.x2 <= 0 || ring.y2 <= 0 {
        return None;
    }
    Some(BoundingBox::new(
        ring.x1.max(-1),
        ring.y1.max(-1),
        ring.x2.min(width + 1),
        ring.y2.min(height + 1),
    ))
}

fn to_rgb(color: Color) -> Rgb<u8> {
    Rgb([color.r, color.g, color.b])
}

impl Surface for RasterSurface {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.image.dimensions() != (width, height) {
            self.image = RgbImage::new(width, height);
        }
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgb([0, 0, 0]);
        }
    }

    fn draw_frame(&mut self, frame: &Frame) {
        let source = frame.to_rgb_image();
        if source.dimensions() == self.image.dimensions() {
            self.image = source;
        } else {
            let (width, height) = self.image.dimensions();
            self.image = imageops::resize(&source, width, height, FilterType::Triangle);
        }
    }

    fn stroke_rect(&mut self, bbox: &BoundingBox, color: Color, line_width: u32) {
        let line_width = line_width.max(1) as i32;
        let (width, height) = self.image.dimensions();
        // Concentric 1px outlines, centred on the box edges.
        let outer = line_width / 2;
        for inset in (outer - line_width + 1)..=outer {
            let Some(ring) = clip_ring(bbox.inflate(inset), width, height) else {
                continue;
            };
            let rect = Rect::at(ring.x1, ring.y1).of_size(ring.width() as u32, ring.height() as u32);
            draw_hollow_rect_mut(&mut self.image, rect, to_rgb(color));
        }
    }

    fn fill_text(&mut self, text: &str, x: i32, y: i32, color: Color, style: TextStyle) {
        let Some(font) = &self.font else {
            return;
        };
        let scale = PxScale::from(style.size_px);
        // imageproc positions glyphs by their top edge; callers give the baseline.
        let top = y - font.as_scaled(scale).ascent().round() as i32;
        draw_text_mut(&mut self.image, to_rgb(color), x, top, scale, font, text);
        if style.bold {
            draw_text_mut(&mut self.image, to_rgb(color), x + 1, top, scale, font, text);
        }
    }

    fn encode_jpeg(
        &self,
        quality: u8,
    ) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(&self.image)?;
        Ok(bytes)
    }

    fn snapshot(&self) -> Frame {
        Frame::from_rgb_image(self.image.clone(), 0)
    }
}
