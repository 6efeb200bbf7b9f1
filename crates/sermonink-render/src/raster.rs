//! CPU raster surface backed by an RGBA8 image.

use crate::renderer::{RenderResult, RendererError, Surface};
use image::{Rgba, RgbaImage};
use kurbo::{Line, ParamCurveNearest, Point, Rect, Size};
use peniko::{Color, Compose};

/// Anti-aliased RGBA8 surface with straight (non-premultiplied) alpha.
///
/// Supports source-over and destination-out composition; other modes are
/// drawn as source-over.
pub struct RasterSurface {
    image: RgbaImage,
    compose: Compose,
}

impl RasterSurface {
    /// Create a transparent surface. Both dimensions must be non-zero.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RendererError::InvalidSize { width, height });
        }
        Ok(Self {
            image: RgbaImage::new(width, height),
            compose: Compose::SrcOver,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel at `(x, y)` as `[r, g, b, a]`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Pixel range covered by `rect`, clipped to the surface.
    fn pixel_span(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = rect.x0.floor().max(0.0);
        let y0 = rect.y0.floor().max(0.0);
        let x1 = rect.x1.ceil().min(f64::from(self.width()));
        let y1 = rect.y1.ceil().min(f64::from(self.height()));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    fn composite(&mut self, x: u32, y: u32, src: [u8; 4], coverage: f64) {
        let dst = self.image.get_pixel_mut(x, y);
        let src_a = f64::from(src[3]) / 255.0 * coverage;
        let dst_a = f64::from(dst.0[3]) / 255.0;

        match self.compose {
            Compose::DestOut => {
                let out_a = dst_a * (1.0 - src_a);
                if out_a <= 0.0 {
                    *dst = Rgba([0, 0, 0, 0]);
                } else {
                    dst.0[3] = to_channel(out_a);
                }
            }
            _ => {
                let out_a = src_a + dst_a * (1.0 - src_a);
                if out_a <= 0.0 {
                    return;
                }
                let mut out = [0u8; 4];
                for i in 0..3 {
                    let s = f64::from(src[i]) / 255.0;
                    let d = f64::from(dst.0[i]) / 255.0;
                    out[i] = to_channel((s * src_a + d * dst_a * (1.0 - src_a)) / out_a);
                }
                out[3] = to_channel(out_a);
                *dst = Rgba(out);
            }
        }
    }
}

fn to_channel(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Distance from `p` to the segment `line`.
fn distance_to_segment(line: Line, p: Point) -> f64 {
    if line.p0 == line.p1 {
        return line.p0.distance(p);
    }
    line.nearest(p, 1e-9).distance_sq.sqrt()
}

impl Surface for RasterSurface {
    fn size(&self) -> Size {
        Size::new(f64::from(self.width()), f64::from(self.height()))
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn set_compose(&mut self, compose: Compose) {
        self.compose = compose;
    }

    fn compose(&self) -> Compose {
        self.compose
    }

    fn stroke_polyline(&mut self, points: &[Point], color: Color, width: f64) {
        let Some(&first) = points.first() else {
            return;
        };
        let radius = width.max(0.0) / 2.0;

        let segments: Vec<Line> = if points.len() == 1 {
            vec![Line::new(first, first)]
        } else {
            points.windows(2).map(|w| Line::new(w[0], w[1])).collect()
        };

        let bounds = points
            .iter()
            .fold(Rect::from_points(first, first), |r, &p| r.union_pt(p))
            .inflate(radius + 1.0, radius + 1.0);
        let Some((x0, y0, x1, y1)) = self.pixel_span(bounds) else {
            return;
        };

        let rgba = color.to_rgba8();
        let src = [rgba.r, rgba.g, rgba.b, rgba.a];

        // Coverage is the max over all segments so joins are blended once.
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let distance = segments
                    .iter()
                    .map(|&line| distance_to_segment(line, center))
                    .fold(f64::INFINITY, f64::min);
                let coverage = (radius + 0.5 - distance).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.composite(x, y, src, coverage);
                }
            }
        }
    }
}

/// Encode a surface as PNG bytes.
pub fn encode_png(surface: &RasterSurface) -> RenderResult<Vec<u8>> {
    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, surface.width(), surface.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RendererError::Encode(e.to_string()))?;
        writer
            .write_image_data(surface.as_raw())
            .map_err(|e| RendererError::Encode(e.to_string()))?;
    }
    Ok(png_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{render, render_strokes};
    use sermonink_core::stroke::{Stroke, Tool, serialize_strokes};

    fn horizontal(tool: Tool, color: &str, thickness: u32, y: f64, x0: f64, x1: f64) -> Stroke {
        let mut stroke = Stroke::new(tool, color, thickness, Point::new(x0, y));
        stroke.add_point(Point::new((x0 + x1) / 2.0, y));
        stroke.add_point(Point::new(x1, y));
        stroke
    }

    #[test]
    fn test_zero_size_is_error() {
        assert!(matches!(
            RasterSurface::new(0, 10),
            Err(RendererError::InvalidSize { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_pen_paints_stroke_color() {
        let mut surface = RasterSurface::new(40, 20).unwrap();
        render(&mut surface, &[horizontal(Tool::Pen, "#dc3545", 4, 10.0, 2.0, 30.0)]);

        assert_eq!(surface.pixel(10, 9), Some([220, 53, 69, 255]));
        assert_eq!(surface.pixel(10, 2), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(38, 10), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_eraser_clears_ink() {
        let mut surface = RasterSurface::new(40, 20).unwrap();
        let strokes = vec![
            horizontal(Tool::Pen, "#000000", 4, 10.0, 2.0, 30.0),
            horizontal(Tool::Eraser, "#dc3545", 10, 10.0, 0.0, 40.0),
        ];
        render(&mut surface, &strokes);

        assert_eq!(surface.pixel(10, 9).map(|p| p[3]), Some(0));
        assert_eq!(surface.pixel(20, 10).map(|p| p[3]), Some(0));
        assert_eq!(surface.compose(), Compose::SrcOver);
    }

    #[test]
    fn test_eraser_only_affects_its_path() {
        let mut surface = RasterSurface::new(40, 40).unwrap();
        let strokes = vec![
            horizontal(Tool::Pen, "#0d6efd", 4, 10.0, 2.0, 30.0),
            horizontal(Tool::Eraser, "#000000", 4, 30.0, 2.0, 30.0),
        ];
        render(&mut surface, &strokes);

        assert_eq!(surface.pixel(10, 9), Some([13, 110, 253, 255]));
    }

    #[test]
    fn test_rerender_clears_previous_frame() {
        let mut surface = RasterSurface::new(40, 20).unwrap();
        let data = serialize_strokes(&[horizontal(Tool::Pen, "#000000", 4, 10.0, 2.0, 30.0)]);
        render_strokes(&mut surface, &data);
        assert_eq!(surface.pixel(10, 9).map(|p| p[3]), Some(255));

        render_strokes(&mut surface, "");
        assert!(surface.as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_antialiased_edge_is_partial() {
        let mut surface = RasterSurface::new(40, 20).unwrap();
        // Radius 1.5: pixel centers at distance 1.5 get half coverage.
        render(&mut surface, &[horizontal(Tool::Pen, "#000000", 3, 10.0, 2.0, 30.0)]);
        assert_eq!(surface.pixel(10, 11).map(|p| p[3]), Some(128));
    }

    #[test]
    fn test_joins_are_not_double_blended() {
        let mut surface = RasterSurface::new(40, 40).unwrap();
        let mut stroke = Stroke::new(Tool::Pen, "rgba(0, 0, 0, 0.5)", 6, Point::new(5.0, 20.0));
        stroke.add_point(Point::new(20.0, 20.0));
        stroke.add_point(Point::new(20.0, 35.0));
        render(&mut surface, &[stroke]);

        // Pixel at the corner is covered by both segments.
        assert_eq!(surface.pixel(19, 19).map(|p| p[3]), Some(128));
    }

    #[test]
    fn test_encode_png() {
        let mut surface = RasterSurface::new(16, 8).unwrap();
        render(&mut surface, &[horizontal(Tool::Pen, "#198754", 2, 4.0, 1.0, 14.0)]);

        let bytes = encode_png(&surface).unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (16, 8));
        assert_eq!(decoded.as_raw(), surface.as_raw());
    }
}
