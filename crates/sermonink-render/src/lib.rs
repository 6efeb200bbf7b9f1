//! SermonInk Render Library
//!
//! Replays a page's stored strokes onto a drawing surface. The default
//! surface is a CPU raster that can be exported as PNG.

mod page_canvas;
mod raster;
mod renderer;

pub use page_canvas::PageCanvas;
pub use raster::{RasterSurface, encode_png};
pub use renderer::{
    RenderResult, RendererError, Surface, parse_color, render, render_last_segment, render_strokes,
    stroke_color,
};
