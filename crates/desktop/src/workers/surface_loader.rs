use std::path::PathBuf;
use std::thread;

use crossbeam_channel::Receiver;

use facewatch_core::overlay::infrastructure::label_font::resolve_label_font;
use facewatch_core::overlay::infrastructure::raster_surface::RasterSurface;

/// Resolves the label font in the background (it may need a download) and
/// delivers a ready overlay surface. The panel keeps its font-less surface
/// until this arrives.
pub fn spawn(width: u32, height: u32, font_path: Option<PathBuf>) -> Receiver<RasterSurface> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let Some(font) = resolve_label_font(font_path.as_deref()) else {
            return;
        };
        let _ = tx.send(RasterSurface::new(width, height, Some(font)));
    });
    rx
}
