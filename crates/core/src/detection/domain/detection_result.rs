use serde::{Deserialize, Serialize};

use crate::shared::bounding_box::BoundingBox;

/// A detected face, recognised against the gallery when `is_known`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub bbox: BoundingBox,
    pub name: String,
    pub is_known: bool,
}

/// A detected object with its class and detector confidence in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectBox {
    pub bbox: BoundingBox,
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f64,
}

impl ObjectBox {
    /// Confidence as a whole percentage, rounded half away from zero.
    pub fn confidence_percent(&self) -> i64 {
        (self.confidence * 100.0).round() as i64
    }

    /// Overlay label, e.g. `person (87%)`.
    pub fn label(&self) -> String {
        format!("{} ({}%)", self.class_name, self.confidence_percent())
    }
}

/// Response body of the detection endpoint. Either list may be absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub faces: Vec<FaceBox>,
    #[serde(default)]
    pub objects: Vec<ObjectBox>,
}

impl DetectionResult {
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty() && self.objects.is_empty()
    }

    /// Number of rectangles an overlay of this result draws.
    pub fn rectangle_count(&self) -> usize {
        self.faces.len() + self.objects.len()
    }

    pub fn known_faces(&self) -> impl Iterator<Item = &FaceBox> {
        self.faces.iter().filter(|f| f.is_known)
    }
}
