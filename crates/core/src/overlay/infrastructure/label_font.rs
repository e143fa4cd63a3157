use std::path::Path;

use ab_glyph::FontArc;

use crate::shared::asset_resolver;
use crate::shared::constants::{LABEL_FONT_NAME, LABEL_FONT_URL};

/// Loads a TrueType/OpenType font file.
pub fn load_font(path: &Path) -> Result<FontArc, Box<dyn std::error::Error + Send + Sync>> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("failed to read font {}: {e}", path.display()))?;
    let font = FontArc::try_from_vec(bytes)
        .map_err(|e| format!("invalid font {}: {e}", path.display()))?;
    Ok(font)
}

/// Font for overlay labels: `explicit` if given, else the cached or
/// downloaded default. Returns `None` (labels are skipped) when neither works.
pub fn resolve_label_font(explicit: Option<&Path>) -> Option<FontArc> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match asset_resolver::resolve(LABEL_FONT_NAME, LABEL_FONT_URL, None) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Label font unavailable, drawing boxes without labels: {e}");
                return None;
            }
        },
    };

    match load_font(&path) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("{e}; drawing boxes without labels");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_font_file_is_an_error() {
        assert!(load_font(Path::new("/nonexistent/font.ttf")).is_err());
    }

    #[test]
    fn test_garbage_font_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();

        assert!(load_font(&path).is_err());
        assert!(resolve_label_font(Some(&path)).is_none());
    }
}
