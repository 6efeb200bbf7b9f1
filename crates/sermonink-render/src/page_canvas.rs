//! The drawing layer of the active page.

use crate::raster::{RasterSurface, encode_png};
use crate::renderer::{self, RenderResult};
use sermonink_core::stroke::Stroke;

/// A raster surface that tracks the stroke data it currently shows.
///
/// Coordinates are page pixels: resizing reallocates the surface and
/// replays the committed strokes at their stored positions without scaling.
pub struct PageCanvas {
    surface: RasterSurface,
    /// Serialized strokes last committed to the page.
    committed: String,
    /// Set while the surface shows uncommitted strokes.
    live: bool,
}

impl PageCanvas {
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let mut surface = RasterSurface::new(width, height)?;
        renderer::render_strokes(&mut surface, "");
        Ok(Self {
            surface,
            committed: String::new(),
            live: false,
        })
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }

    /// Serialized strokes currently shown, or `None` while live strokes
    /// are on the surface.
    pub fn drawing(&self) -> Option<&str> {
        (!self.live).then_some(self.committed.as_str())
    }

    /// Show a page's stored drawing. Returns true if the surface was redrawn.
    pub fn set_drawing(&mut self, serialized: &str) -> bool {
        if !self.live && self.committed == serialized {
            return false;
        }
        renderer::render_strokes(&mut self.surface, serialized);
        self.committed = serialized.to_string();
        self.live = false;
        true
    }

    /// Redraw with in-progress strokes that have not been committed yet.
    pub fn show_strokes(&mut self, strokes: &[Stroke]) {
        renderer::render(&mut self.surface, strokes);
        self.live = true;
    }

    /// Add the newest segment of the stroke being captured.
    pub fn extend_live(&mut self, stroke: &Stroke) {
        renderer::render_last_segment(&mut self.surface, stroke);
        self.live = true;
    }

    /// Match a new surface size. Pixels are never carried over; the
    /// committed drawing is replayed onto the new surface, so live strokes
    /// must be shown again afterwards.
    pub fn resize(&mut self, width: u32, height: u32) -> RenderResult<()> {
        if width == self.surface.width() && height == self.surface.height() {
            return Ok(());
        }
        let mut surface = RasterSurface::new(width, height)?;
        renderer::render_strokes(&mut surface, &self.committed);
        self.surface = surface;
        self.live = false;
        log::debug!("Page canvas resized to {}x{}", width, height);
        Ok(())
    }

    /// PNG snapshot of the drawing layer.
    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        encode_png(&self.surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::RendererError;
    use kurbo::Point;
    use sermonink_core::stroke::{Tool, deserialize_strokes, serialize_strokes};

    fn dot_line() -> String {
        let mut stroke = Stroke::new(Tool::Pen, "#000000", 4, Point::new(10.0, 10.0));
        stroke.add_point(Point::new(20.0, 10.0));
        serialize_strokes(&[stroke])
    }

    #[test]
    fn test_set_drawing_only_on_change() {
        let mut canvas = PageCanvas::new(50, 50).unwrap();
        assert!(!canvas.set_drawing(""));

        let data = dot_line();
        assert!(canvas.set_drawing(&data));
        assert!(!canvas.set_drawing(&data));
        assert_eq!(canvas.surface().pixel(15, 9).map(|p| p[3]), Some(255));
    }

    #[test]
    fn test_resize_replays_at_same_coordinates() {
        let mut canvas = PageCanvas::new(50, 50).unwrap();
        canvas.set_drawing(&dot_line());

        canvas.resize(100, 30).unwrap();
        assert_eq!(canvas.surface().width(), 100);
        assert_eq!(canvas.surface().pixel(15, 9).map(|p| p[3]), Some(255));
        assert_eq!(canvas.surface().pixel(30, 18).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_resize_to_zero_keeps_old_surface() {
        let mut canvas = PageCanvas::new(50, 50).unwrap();
        assert!(matches!(canvas.resize(0, 0), Err(RendererError::InvalidSize { .. })));
        assert_eq!(canvas.surface().width(), 50);
    }

    #[test]
    fn test_live_strokes_force_next_redraw() {
        let mut canvas = PageCanvas::new(50, 50).unwrap();
        let data = dot_line();
        canvas.set_drawing(&data);

        canvas.show_strokes(&[]);
        assert_eq!(canvas.drawing(), None);
        assert!(canvas.set_drawing(&data));
    }

    #[test]
    fn test_resize_during_gesture_keeps_committed_ink() {
        let mut canvas = PageCanvas::new(50, 50).unwrap();
        let data = dot_line();
        canvas.set_drawing(&data);

        let mut strokes = deserialize_strokes(&data);
        let mut live = Stroke::new(Tool::Pen, "#000000", 4, Point::new(10.0, 30.0));
        live.add_point(Point::new(20.0, 30.0));
        strokes.push(live);
        canvas.show_strokes(&strokes);

        canvas.resize(60, 60).unwrap();
        assert_eq!(canvas.surface().pixel(15, 9).map(|p| p[3]), Some(255));
        assert_eq!(canvas.surface().pixel(15, 29).map(|p| p[3]), Some(0));
        assert_eq!(canvas.drawing(), Some(data.as_str()));
    }

    #[test]
    fn test_extend_live_draws_newest_segment() {
        let mut canvas = PageCanvas::new(50, 50).unwrap();
        let data = dot_line();
        canvas.set_drawing(&data);

        let mut live = Stroke::new(Tool::Pen, "#000000", 4, Point::new(10.0, 30.0));
        live.add_point(Point::new(20.0, 30.0));
        canvas.extend_live(&live);

        assert_eq!(canvas.surface().pixel(15, 9).map(|p| p[3]), Some(255));
        assert_eq!(canvas.surface().pixel(15, 29).map(|p| p[3]), Some(255));
        assert_eq!(canvas.drawing(), None);

        // Committing the same data replays the page without the live stroke.
        assert!(canvas.set_drawing(&data));
        assert_eq!(canvas.surface().pixel(15, 29).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_png_snapshot() {
        let canvas = PageCanvas::new(8, 4).unwrap();
        let bytes = canvas.to_png().unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 4));
    }
}
