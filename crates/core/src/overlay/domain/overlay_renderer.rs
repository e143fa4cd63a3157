use crate::detection::domain::detection_result::{DetectionResult, FaceBox};
use crate::overlay::domain::surface::{Color, Surface, TextStyle};
use crate::shared::frame::Frame;

pub const FACE_LINE_WIDTH: u32 = 3;
pub const OBJECT_LINE_WIDTH: u32 = 2;

pub const FACE_LABEL_STYLE: TextStyle = TextStyle {
    size_px: 20.0,
    bold: true,
};
pub const OBJECT_LABEL_STYLE: TextStyle = TextStyle {
    size_px: 16.0,
    bold: false,
};

/// Distance between a label's baseline and the top edge of its box.
pub const LABEL_OFFSET: i32 = 10;

pub fn face_color(face: &FaceBox) -> Color {
    if face.is_known {
        Color::GREEN
    } else {
        Color::RED
    }
}

/// Repaints `surface` with `frame` and the annotations of `result`.
///
/// Faces are drawn first, then objects, each in response order. Labels sit
/// above the top-left corner of their box. Drawing the same result over the
/// same frame twice yields the same pixels.
pub fn draw_detections(surface: &mut dyn Surface, frame: &Frame, result: &DetectionResult) {
    surface.clear();
    surface.draw_frame(frame);

    for face in &result.faces {
        let color = face_color(face);
        surface.stroke_rect(&face.bbox, color, FACE_LINE_WIDTH);
        surface.fill_text(
            &face.name,
            face.bbox.x1,
            face.bbox.y1.saturating_sub(LABEL_OFFSET),
            color,
            FACE_LABEL_STYLE,
        );
    }

    for object in &result.objects {
        surface.stroke_rect(&object.bbox, Color::BLUE, OBJECT_LINE_WIDTH);
        surface.fill_text(
            &object.label(),
            object.bbox.x1,
            object.bbox.y1.saturating_sub(LABEL_OFFSET),
            Color::BLUE,
            OBJECT_LABEL_STYLE,
        );
    }
}

/// Surface stub that records every call, shared by overlay and pipeline tests.
///
/// The call log is shared so it can still be read after the surface has
/// been boxed into a display.
#[cfg(test)]
pub(crate) mod recording_surface {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::shared::bounding_box::BoundingBox;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Op {
        Resize(u32, u32),
        Clear,
        Frame(u64, (u32, u32)),
        Rect(BoundingBox, Color, u32),
        Text(String, i32, i32, Color, TextStyle),
    }

    pub type OpLog = Arc<Mutex<Vec<Op>>>;

    pub struct RecordingSurface {
        width: u32,
        height: u32,
        log: OpLog,
    }

    impl RecordingSurface {
        pub fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                log: OpLog::default(),
            }
        }

        pub fn log(&self) -> OpLog {
            self.log.clone()
        }

        pub fn ops(&self) -> Vec<Op> {
            self.log.lock().unwrap().clone()
        }

        pub fn rects(&self) -> Vec<(BoundingBox, Color, u32)> {
            rects(&self.ops())
        }

        pub fn texts(&self) -> Vec<(String, i32, i32, Color, TextStyle)> {
            self.ops()
                .into_iter()
                .filter_map(|op| match op {
                    Op::Text(t, x, y, c, s) => Some((t, x, y, c, s)),
                    _ => None,
                })
                .collect()
        }

        fn push(&self, op: Op) {
            self.log.lock().unwrap().push(op);
        }
    }

    pub fn rects(ops: &[Op]) -> Vec<(BoundingBox, Color, u32)> {
        ops.iter()
            .filter_map(|op| match op {
                Op::Rect(b, c, w) => Some((*b, *c, *w)),
                _ => None,
            })
            .collect()
    }

    impl Surface for RecordingSurface {
        fn dimensions(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.width = width;
            self.height = height;
            self.push(Op::Resize(width, height));
        }

        fn clear(&mut self) {
            self.push(Op::Clear);
        }

        fn draw_frame(&mut self, frame: &Frame) {
            self.push(Op::Frame(frame.sequence(), frame.dimensions()));
        }

        fn stroke_rect(&mut self, bbox: &BoundingBox, color: Color, line_width: u32) {
            self.push(Op::Rect(*bbox, color, line_width));
        }

        fn fill_text(&mut self, text: &str, x: i32, y: i32, color: Color, style: TextStyle) {
            self.push(Op::Text(text.to_string(), x, y, color, style));
        }

        fn encode_jpeg(
            &self,
            quality: u8,
        ) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(format!("jpeg:{}x{}@{quality}", self.width, self.height).into_bytes())
        }

        fn snapshot(&self) -> Frame {
            Frame::solid(self.width, self.height, [0, 0, 0], 0)
        }
    }
}
