use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle `[x1, y1, x2, y2]` in pixel coordinates of the
/// frame that was sent for detection.
///
/// On the wire it is a four-element array. The backend emits integers, but
/// float coordinates are accepted and rounded to the nearest pixel, then
/// clamped to `±COORD_LIMIT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// Largest coordinate magnitude kept from a backend response.
pub const COORD_LIMIT: i32 = 1 << 24;

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> i32 {
        self.y2.saturating_sub(self.y1)
    }

    /// True when the box encloses no pixels (zero or inverted extent).
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Same box grown by `amount` pixels on every side (shrunk when negative).
    pub fn inflate(&self, amount: i32) -> Self {
        Self::new(
            self.x1.saturating_sub(amount),
            self.y1.saturating_sub(amount),
            self.x2.saturating_add(amount),
            self.y2.saturating_add(amount),
        )
    }
}

fn to_coord(v: f64) -> i32 {
    let limit = f64::from(COORD_LIMIT);
    // NaN maps to 0.
    v.round().clamp(-limit, limit) as i32
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(to_coord(v[0]), to_coord(v[1]), to_coord(v[2]), to_coord(v[3]))
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_extent() {
        let b = BoundingBox::new(10, 20, 50, 80);
        assert_eq!(b.width(), 40);
        assert_eq!(b.height(), 60);
        assert!(!b.is_empty());
    }

    #[rstest]
    #[case::zero_width(BoundingBox::new(5, 5, 5, 10))]
    #[case::zero_height(BoundingBox::new(5, 5, 10, 5))]
    #[case::inverted(BoundingBox::new(50, 50, 10, 10))]
    fn test_degenerate_boxes_are_empty(#[case] b: BoundingBox) {
        assert!(b.is_empty());
    }

    #[test]
    fn test_inflate_grows_and_shrinks() {
        let b = BoundingBox::new(10, 10, 20, 20);
        assert_eq!(b.inflate(2), BoundingBox::new(8, 8, 22, 22));
        assert_eq!(b.inflate(-1), BoundingBox::new(11, 11, 19, 19));
    }

    #[test]
    fn test_deserializes_integer_array() {
        let b: BoundingBox = serde_json::from_str("[10, 10, 50, 50]").unwrap();
        assert_eq!(b, BoundingBox::new(10, 10, 50, 50));
    }

    #[test]
    fn test_deserializes_float_array_with_rounding() {
        let b: BoundingBox = serde_json::from_str("[10.4, 10.6, 49.5, 50.0]").unwrap();
        assert_eq!(b, BoundingBox::new(10, 11, 50, 50));
    }

    #[rstest]
    #[case::huge("[-3e9, -3e9, 3e9, 3e9]", [-COORD_LIMIT, -COORD_LIMIT, COORD_LIMIT, COORD_LIMIT])]
    #[case::very_large("[-1e300, 0, 1e300, 10]", [-COORD_LIMIT, 0, COORD_LIMIT, 10])]
    #[case::partly_out("[10, 20, 5e10, 40]", [10, 20, COORD_LIMIT, 40])]
    fn test_out_of_range_coordinates_are_clamped(#[case] json: &str, #[case] expected: [i32; 4]) {
        let b: BoundingBox = serde_json::from_str(json).unwrap();
        assert_eq!(<[i32; 4]>::from(b), expected);
        assert!(b.width() >= 0);
        assert_eq!(b.inflate(-1).y1, expected[1] + 1);
    }

    #[test]
    fn test_extreme_boxes_saturate_instead_of_overflowing() {
        let b = BoundingBox::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(b.width(), i32::MAX);
        assert_eq!(b.height(), i32::MAX);
        assert!(!b.is_empty());
        assert_eq!(b.inflate(5), b);
        assert_eq!(
            BoundingBox::new(i32::MAX, 0, i32::MIN, 1).width(),
            i32::MIN
        );
    }

    #[test]
    fn test_rejects_wrong_arity() {
        assert!(serde_json::from_str::<BoundingBox>("[1, 2, 3]").is_err());
    }

    #[test]
    fn test_serializes_as_integer_array() {
        let json = serde_json::to_string(&BoundingBox::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, "[1,2,3,4]");
    }
}
