//! Surface abstraction and stroke replay.

use kurbo::{Point, Rect, Size};
use peniko::{Color, Compose};
use sermonink_core::stroke::{self, Stroke, Tool};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid surface size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// A 2D drawing target the size of one page.
///
/// Implementations can rasterize on the CPU, forward to a GPU scene, or
/// drive a host canvas.
pub trait Surface {
    /// Surface size in pixels.
    fn size(&self) -> Size;

    /// Reset every pixel to fully transparent.
    fn clear(&mut self);

    /// Set how subsequent strokes combine with existing pixels.
    fn set_compose(&mut self, compose: Compose);

    /// Current composition mode.
    fn compose(&self) -> Compose;

    /// Stroke an open polyline with round joins and caps.
    fn stroke_polyline(&mut self, points: &[Point], color: Color, width: f64);
}

/// Clear the surface and replay strokes in order.
///
/// Pen strokes paint source-over in their own color. Eraser strokes remove
/// ink underneath them whatever their color. Strokes with fewer than two
/// points, or entirely off the surface, are skipped. The surface is left in
/// source-over mode.
pub fn render(surface: &mut dyn Surface, strokes: &[Stroke]) {
    surface.clear();

    let visible = Rect::from_origin_size(Point::ZERO, surface.size());
    for stroke in strokes.iter().filter(|s| s.is_renderable()) {
        if visible.intersect(stroke.bounds()).is_zero_area() {
            continue;
        }
        let (compose, color) = paint(stroke);
        surface.set_compose(compose);
        surface.stroke_polyline(&stroke.points, color, f64::from(stroke.thickness));
    }

    surface.set_compose(Compose::SrcOver);
}

/// Draw only the newest segment of a stroke over what the surface shows.
///
/// Meant for a stroke still being captured. Joins may blend twice, so the
/// page is replayed in full once the stroke is committed.
pub fn render_last_segment(surface: &mut dyn Surface, stroke: &Stroke) {
    let [.., from, to] = stroke.points.as_slice() else {
        return;
    };
    let (compose, color) = paint(stroke);
    surface.set_compose(compose);
    surface.stroke_polyline(&[*from, *to], color, f64::from(stroke.thickness));
    surface.set_compose(Compose::SrcOver);
}

fn paint(stroke: &Stroke) -> (Compose, Color) {
    match stroke.tool {
        Tool::Pen => (Compose::SrcOver, stroke_color(&stroke.color)),
        Tool::Eraser => (Compose::DestOut, Color::from_rgba8(0, 0, 0, 255)),
    }
}

/// Parse serialized stroke data and render it.
///
/// Malformed data renders as an empty page.
pub fn render_strokes(surface: &mut dyn Surface, serialized: &str) {
    let strokes = stroke::deserialize_strokes(serialized);
    render(surface, &strokes);
}

/// Color for a stroke, falling back to black when unreadable.
pub fn stroke_color(value: &str) -> Color {
    parse_color(value).unwrap_or_else(|| {
        log::warn!("Unreadable stroke color '{}', using black", value);
        Color::from_rgba8(0, 0, 0, 255)
    })
}

/// Parse a CSS color: `#rgb`, `#rrggbb`, `rgb(r, g, b)` or `rgba(r, g, b, a)`.
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim();

    if let Some(hex) = value.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        return match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
                Some(Color::from_rgba8(r, g, b, 255))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Color::from_rgba8(r, g, b, 255))
            }
            _ => None,
        };
    }

    let lower = value.to_ascii_lowercase();
    let (args, with_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
        (rest.strip_suffix(')')?, true)
    } else if let Some(rest) = lower.strip_prefix("rgb(") {
        (rest.strip_suffix(')')?, false)
    } else {
        return None;
    };

    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != if with_alpha { 4 } else { 3 } {
        return None;
    }

    let channel = |s: &str| -> Option<u8> {
        let v: f64 = s.parse().ok()?;
        v.is_finite().then(|| v.round().clamp(0.0, 255.0) as u8)
    };
    let r = channel(parts[0])?;
    let g = channel(parts[1])?;
    let b = channel(parts[2])?;
    let a = if with_alpha {
        let a: f64 = parts[3].parse().ok()?;
        if !a.is_finite() {
            return None;
        }
        (a.clamp(0.0, 1.0) * 255.0).round() as u8
    } else {
        255
    };

    Some(Color::from_rgba8(r, g, b, a))
}
