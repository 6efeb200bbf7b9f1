//! Text measurement capability used by pagination.
//!
//! Measuring rendered text belongs to whatever text engine hosts the editing
//! surface, so pagination only talks to the [`TextLayout`] trait. A
//! deterministic [`FixedPitchLayout`] is provided for headless hosts.

use crate::markup::{Glyph, Markup, TextOffset};
use crate::note::NoteStyles;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Visible area of one page of the editing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Visible width in pixels.
    pub width: f64,
    /// Visible height in pixels.
    pub height: f64,
    /// Inner padding on every side.
    #[serde(default)]
    pub padding: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 816.0,
            height: 1056.0,
            padding: 48.0,
        }
    }
}

impl PageGeometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            padding: 0.0,
        }
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Text engine measurements needed to paginate a page.
pub trait TextLayout {
    /// Full scrollable height of the laid-out content, padding included.
    fn content_height(&self, markup: &Markup, geometry: &PageGeometry, styles: &NoteStyles) -> f64;

    /// Nearest insertion point under a page-relative coordinate, if any.
    fn resolve_offset_at(
        &self,
        markup: &Markup,
        geometry: &PageGeometry,
        styles: &NoteStyles,
        point: Point,
    ) -> Option<TextOffset>;
}

/// Monospaced layout with greedy word wrapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPitchLayout {
    /// Character advance as a fraction of the font size.
    pub advance_ratio: f64,
    /// Line height as a multiple of the largest font size on the line.
    pub line_height_ratio: f64,
}

impl Default for FixedPitchLayout {
    fn default() -> Self {
        Self {
            advance_ratio: 0.6,
            line_height_ratio: 1.5,
        }
    }
}

/// A laid-out line.
#[derive(Debug, Clone, PartialEq)]
struct LineBox {
    /// First glyph on the line.
    start: usize,
    top: f64,
    height: f64,
    /// Advance of each glyph on the line.
    advances: Vec<f64>,
}

#[derive(Debug)]
struct LineBuilder {
    start: usize,
    /// `(glyph index, advance, font size, is whitespace)`
    glyphs: Vec<(usize, f64, Option<f64>, bool)>,
    width: f64,
}

impl LineBuilder {
    fn new(start: usize) -> Self {
        Self {
            start,
            glyphs: Vec::new(),
            width: 0.0,
        }
    }

    fn push(&mut self, entry: (usize, f64, Option<f64>, bool)) {
        self.width += entry.1;
        self.glyphs.push(entry);
    }

    /// Remove the word being typed at the end of the line, if the line has
    /// an earlier space to break at.
    fn take_trailing_word(&mut self) -> Vec<(usize, f64, Option<f64>, bool)> {
        match self.glyphs.iter().rposition(|g| g.3) {
            Some(space) if space + 1 < self.glyphs.len() => {
                let carry: Vec<_> = self.glyphs.drain(space + 1..).collect();
                self.width -= carry.iter().map(|g| g.1).sum::<f64>();
                carry
            }
            _ => Vec::new(),
        }
    }

    fn finish(self, base_size: f64, line_height_ratio: f64) -> LineBox {
        let tallest = self
            .glyphs
            .iter()
            .filter_map(|g| g.2)
            .fold(base_size, f64::max);
        LineBox {
            start: self.start,
            top: 0.0,
            height: tallest * line_height_ratio,
            advances: self.glyphs.iter().map(|g| g.1).collect(),
        }
    }
}

impl FixedPitchLayout {
    fn lines(&self, markup: &Markup, geometry: &PageGeometry, styles: &NoteStyles) -> Vec<LineBox> {
        let base = styles.font_size as f64;
        let available = (geometry.width - 2.0 * geometry.padding).max(1.0);
        let mut lines = Vec::new();
        let mut current = LineBuilder::new(0);

        for (index, glyph) in markup.glyphs().into_iter().enumerate() {
            match glyph {
                Glyph::Break => {
                    current.push((index, 0.0, None, true));
                    let done = std::mem::replace(&mut current, LineBuilder::new(index + 1));
                    lines.push(done.finish(base, self.line_height_ratio));
                }
                Glyph::Char { ch, font_size } => {
                    let size = font_size.unwrap_or(base);
                    let advance = size * self.advance_ratio;
                    let space = ch.is_whitespace();
                    // Trailing whitespace may hang past the edge.
                    if !space && !current.glyphs.is_empty() && current.width + advance > available {
                        let carry = current.take_trailing_word();
                        let next_start = carry.first().map(|g| g.0).unwrap_or(index);
                        let done = std::mem::replace(&mut current, LineBuilder::new(next_start));
                        lines.push(done.finish(base, self.line_height_ratio));
                        for entry in carry {
                            current.push(entry);
                        }
                    }
                    current.push((index, advance, Some(size), space));
                }
            }
        }
        // A trailing break ends its line without starting another.
        if !current.glyphs.is_empty() || lines.is_empty() {
            lines.push(current.finish(base, self.line_height_ratio));
        }

        let mut top = geometry.padding;
        for line in &mut lines {
            line.top = top;
            top += line.height;
        }
        lines
    }
}

impl TextLayout for FixedPitchLayout {
    fn content_height(&self, markup: &Markup, geometry: &PageGeometry, styles: &NoteStyles) -> f64 {
        let lines = self.lines(markup, geometry, styles);
        let text: f64 = lines.iter().map(|line| line.height).sum();
        text + 2.0 * geometry.padding
    }

    fn resolve_offset_at(
        &self,
        markup: &Markup,
        geometry: &PageGeometry,
        styles: &NoteStyles,
        point: Point,
    ) -> Option<TextOffset> {
        let lines = self.lines(markup, geometry, styles);
        // Points below the text resolve to the last line.
        let line = lines
            .iter()
            .find(|line| point.y < line.top + line.height)
            .or(lines.last())?;

        // Caret j sits before glyph j; j == len is the end of the line.
        let mut best = (0, f64::INFINITY);
        let mut x = geometry.padding;
        for j in 0..=line.advances.len() {
            let distance = (point.x - x).abs();
            if distance < best.1 {
                best = (j, distance);
            }
            if let Some(advance) = line.advances.get(j) {
                x += advance;
            }
        }

        Some(TextOffset(line.start + best.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styles() -> NoteStyles {
        NoteStyles {
            font_size: 10,
            ..NoteStyles::default()
        }
    }

    // 10px font: 6px advance, 15px lines.
    fn geometry() -> PageGeometry {
        PageGeometry::new(60.0, 45.0)
    }

    #[test]
    fn test_empty_content_is_one_line() {
        let layout = FixedPitchLayout::default();
        let height = layout.content_height(&Markup::parse(""), &geometry(), &styles());
        assert_eq!(height, 15.0);
    }

    #[test]
    fn test_wraps_at_word_boundary() {
        let layout = FixedPitchLayout::default();
        // Ten glyphs fit per line.
        let markup = Markup::parse("aaaa bbbbbb cc");
        let lines = layout.lines(&markup, &geometry(), &styles());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].start, 5);
        assert_eq!(layout.content_height(&markup, &geometry(), &styles()), 30.0);
    }

    #[test]
    fn test_breaks_long_words() {
        let layout = FixedPitchLayout::default();
        let markup = Markup::parse("abcdefghijklmnopqrstuvwxy");
        let lines = layout.lines(&markup, &geometry(), &styles());
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].start, 10);
        assert_eq!(lines[2].start, 20);
    }

    #[test]
    fn test_forced_breaks_and_larger_fonts() {
        let layout = FixedPitchLayout::default();
        let markup = Markup::parse(r#"a<br><span style="font-size: 20px">b</span>"#);
        assert_eq!(layout.content_height(&markup, &geometry(), &styles()), 15.0 + 30.0);
    }

    #[test]
    fn test_padding_counts_towards_height() {
        let layout = FixedPitchLayout::default();
        let geometry = PageGeometry::new(80.0, 45.0).with_padding(10.0);
        let height = layout.content_height(&Markup::parse("abc"), &geometry, &styles());
        assert_eq!(height, 35.0);
    }

    #[test]
    fn test_resolve_offset_at_line_start() {
        let layout = FixedPitchLayout::default();
        let markup = Markup::parse("aaaaaaaaaabbbbbbbbbbcccccccccc");
        let offset = layout.resolve_offset_at(&markup, &geometry(), &styles(), Point::new(1.0, 35.0));
        assert_eq!(offset, Some(TextOffset(20)));
    }

    #[test]
    fn test_resolve_offset_nearest_caret() {
        let layout = FixedPitchLayout::default();
        let markup = Markup::parse("abcdef");
        let offset = layout.resolve_offset_at(&markup, &geometry(), &styles(), Point::new(13.0, 5.0));
        assert_eq!(offset, Some(TextOffset(2)));
    }

    #[test]
    fn test_resolve_offset_below_content_uses_last_line() {
        let layout = FixedPitchLayout::default();
        let markup = Markup::parse("aaaaaaaaaabbb");
        let offset = layout.resolve_offset_at(&markup, &geometry(), &styles(), Point::new(1.0, 40.0));
        assert_eq!(offset, Some(TextOffset(10)));
    }

    #[test]
    fn test_trailing_break_adds_no_line() {
        let layout = FixedPitchLayout::default();
        assert_eq!(layout.content_height(&Markup::parse("a<br>"), &geometry(), &styles()), 15.0);
        assert_eq!(layout.content_height(&Markup::parse("a<br>b"), &geometry(), &styles()), 30.0);
        assert_eq!(layout.content_height(&Markup::parse("<br><br>"), &geometry(), &styles()), 30.0);
    }
}
