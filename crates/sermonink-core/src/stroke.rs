//! Freehand strokes drawn over a page.
//!
//! A page's drawing layer is stored as a JSON string holding an ordered array
//! of strokes. Decoding is best-effort: drawing data is decoration, so a bad
//! payload degrades to an empty layer instead of an error.

use kurbo::{Point, Rect};
use serde::{Deserialize, Deserializer, Serialize};

/// Default ink color for new strokes and for payloads missing one.
pub const DEFAULT_STROKE_COLOR: &str = "#000000";

/// Default thickness in pixels.
pub const DEFAULT_STROKE_THICKNESS: u32 = 3;

/// Drawing tool that produced a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Ink drawn over the page.
    #[default]
    Pen,
    /// Removes ink previously drawn on the same layer.
    Eraser,
}

impl Tool {
    /// Get the tag used in serialized drawing data.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Pen => "pen",
            Tool::Eraser => "eraser",
        }
    }

    /// Get all available tools.
    pub fn all() -> &'static [Tool] {
        &[Tool::Pen, Tool::Eraser]
    }
}

// Legacy strokes carry no tool tag, and anything unrecognised is ink.
impl<'de> Deserialize<'de> for Tool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .and_then(|tag| Tool::all().iter().copied().find(|tool| tool.name() == tag))
            .unwrap_or_default())
    }
}

/// One continuous freehand gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Page-local pixel coordinates in capture order.
    #[serde(default)]
    pub points: Vec<Point>,
    /// CSS color string. Ignored for the eraser.
    #[serde(default = "default_color")]
    pub color: String,
    /// Line width in pixels.
    #[serde(default = "default_thickness", deserialize_with = "lenient_thickness")]
    pub thickness: u32,
    #[serde(default)]
    pub tool: Tool,
}

fn default_color() -> String {
    DEFAULT_STROKE_COLOR.to_string()
}

fn default_thickness() -> u32 {
    DEFAULT_STROKE_THICKNESS
}

/// Accepts integer or float widths; anything below one pixel becomes one.
fn lenient_thickness<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    let width = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(DEFAULT_STROKE_THICKNESS as f64),
        serde_json::Value::String(s) => s
            .trim()
            .trim_end_matches("px")
            .parse::<f64>()
            .unwrap_or(DEFAULT_STROKE_THICKNESS as f64),
        _ => DEFAULT_STROKE_THICKNESS as f64,
    };
    if !width.is_finite() || width < 1.0 {
        return Ok(1);
    }
    Ok(width.round().min(u32::MAX as f64) as u32)
}

impl Stroke {
    /// Create a stroke seeded with its first point.
    pub fn new(tool: Tool, color: impl Into<String>, thickness: u32, start: Point) -> Self {
        Self {
            points: vec![start],
            color: color.into(),
            thickness: thickness.max(1),
            tool,
        }
    }

    /// Add a point to the path.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Strokes with fewer than two points are degenerate and never drawn.
    pub fn is_renderable(&self) -> bool {
        self.points.len() >= 2
    }

    /// Area covered by the stroke, including half the line width on each side.
    pub fn bounds(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::ZERO;
        };

        let mut rect = Rect::from_points(*first, *first);
        for point in &self.points[1..] {
            rect = rect.union_pt(*point);
        }
        rect.inflate(self.thickness as f64 / 2.0, self.thickness as f64 / 2.0)
    }
}

/// Encode strokes as the JSON array stored in a page's drawing slot.
pub fn serialize_strokes(strokes: &[Stroke]) -> String {
    match serde_json::to_string(strokes) {
        Ok(json) => json,
        Err(e) => {
            log::error!("Failed to serialize {} strokes: {}", strokes.len(), e);
            "[]".to_string()
        }
    }
}

/// Decode a page's drawing slot.
///
/// Returns an empty list for an empty string, malformed JSON, or a payload
/// that is not an array. Array elements that are not strokes are skipped.
pub fn deserialize_strokes(data: &str) -> Vec<Stroke> {
    if data.trim().is_empty() {
        return Vec::new();
    }

    let value: serde_json::Value = match serde_json::from_str(data) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Ignoring malformed drawing data: {}", e);
            return Vec::new();
        }
    };

    let serde_json::Value::Array(items) = value else {
        log::warn!("Ignoring drawing data that is not an array");
        return Vec::new();
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<Stroke>(item) {
            Ok(stroke) => Some(stroke),
            Err(e) => {
                log::warn!("Skipping malformed stroke {}: {}", index, e);
                None
            }
        })
        .collect()
}
