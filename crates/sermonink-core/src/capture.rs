//! Live stroke capture for the active page.
//!
//! Turns a pointer drag into a growing stroke. Points are stored relative to
//! the page surface's bounding box, so they survive page scrolling but not a
//! change of surface size.

use crate::stroke::{self, DEFAULT_STROKE_COLOR, DEFAULT_STROKE_THICKNESS, Stroke, Tool};
use kurbo::{Point, Rect};

/// State of a capture gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Drawing,
}

/// Whether a pointer event was used for drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureResponse {
    /// The event extended or started a stroke.
    Consumed,
    /// No tool is selected or no stroke is in progress; the text surface
    /// should handle the event.
    Passthrough,
}

/// Captures strokes for one page at a time.
#[derive(Debug, Clone)]
pub struct StrokeCapture {
    /// Selected tool; `None` leaves pointer events to text editing.
    pub tool: Option<Tool>,
    /// Ink color for new pen strokes.
    pub color: String,
    /// Width for new strokes.
    pub thickness: u32,
    state: CaptureState,
    strokes: Vec<Stroke>,
    /// Serialization last written to the page store.
    committed: String,
}

impl Default for StrokeCapture {
    fn default() -> Self {
        Self {
            tool: None,
            color: DEFAULT_STROKE_COLOR.to_string(),
            thickness: DEFAULT_STROKE_THICKNESS,
            state: CaptureState::Idle,
            strokes: Vec::new(),
            committed: String::new(),
        }
    }
}

impl StrokeCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a tool, or `None` to hand pointer events back to the text.
    /// Any stroke in progress is dropped.
    pub fn set_tool(&mut self, tool: Option<Tool>) {
        self.cancel();
        self.tool = tool;
    }

    /// Replace the in-memory strokes with a page's stored drawing.
    pub fn load_page(&mut self, drawing: &str) {
        self.state = CaptureState::Idle;
        self.strokes = stroke::deserialize_strokes(drawing);
        self.committed = drawing.to_string();
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        self.state == CaptureState::Drawing
    }

    /// Strokes of the current page, including one in progress.
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Convert a client coordinate to page-local pixels.
    pub fn to_local(client: Point, surface_bounds: Rect) -> Point {
        Point::new(client.x - surface_bounds.x0, client.y - surface_bounds.y0)
    }

    /// Start a stroke at the gesture's first point.
    pub fn begin(&mut self, client: Point, surface_bounds: Rect) -> CaptureResponse {
        let Some(tool) = self.tool else {
            return CaptureResponse::Passthrough;
        };

        let start = Self::to_local(client, surface_bounds);
        self.strokes
            .push(Stroke::new(tool, self.color.clone(), self.thickness, start));
        self.state = CaptureState::Drawing;
        CaptureResponse::Consumed
    }

    /// Append one movement sample to the stroke in progress.
    pub fn extend(&mut self, client: Point, surface_bounds: Rect) -> CaptureResponse {
        if self.state != CaptureState::Drawing {
            return CaptureResponse::Passthrough;
        }
        match self.strokes.last_mut() {
            Some(stroke) => {
                stroke.add_point(Self::to_local(client, surface_bounds));
                CaptureResponse::Consumed
            }
            None => CaptureResponse::Passthrough,
        }
    }

    /// Finish the gesture.
    ///
    /// Returns the page's new drawing data if it differs from what was last
    /// committed, or `None` when there is nothing new to write.
    pub fn end(&mut self) -> Option<String> {
        if self.state != CaptureState::Drawing {
            return None;
        }
        self.state = CaptureState::Idle;
        self.commit()
    }

    /// Serialize the strokes, returning them only if they changed since the
    /// last commit.
    pub fn commit(&mut self) -> Option<String> {
        let serialized = stroke::serialize_strokes(&self.strokes);
        if serialized == self.committed {
            return None;
        }
        log::debug!("Committing {} strokes", self.strokes.len());
        self.committed = serialized.clone();
        Some(serialized)
    }

    /// Drop the stroke in progress, if any.
    pub fn cancel(&mut self) {
        if self.state == CaptureState::Drawing {
            self.strokes.pop();
            self.state = CaptureState::Idle;
        }
    }
}
