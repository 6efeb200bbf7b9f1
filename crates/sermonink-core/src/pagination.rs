//! Content-overflow pagination.
//!
//! After every text edit on the active page the engine checks whether the
//! page's content is taller than the visible page. If so it cuts the content
//! at a point near the bottom-left of the visible area and flows the rest
//! forward into the next page, then moves the cursor there.
//!
//! Pages only grow forward: shrinking content is never pulled back from a
//! later page, and only the active page is ever measured.

use crate::layout::{PageGeometry, TextLayout};
use crate::markup::Markup;
use crate::note::NoteStyles;
use crate::pages::{PageError, PageStore};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Where the split point is probed, relative to the visible page.
///
/// The probe is a layout heuristic: the line under the probe point and
/// everything after it move to the next page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitPolicy {
    /// Distance from the left edge of the page.
    pub inset_left: f64,
    /// Distance above the bottom of the padded content box.
    pub inset_bottom: f64,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            inset_left: 10.0,
            inset_bottom: 20.0,
        }
    }
}

impl SplitPolicy {
    /// Page-relative probe point for a page of the given geometry.
    ///
    /// The probe sits inside the content box, so every line above the one
    /// it hits ends above the bottom padding and the kept head fits.
    pub fn probe(&self, geometry: &PageGeometry) -> Point {
        let bottom = geometry.height - geometry.padding - self.inset_bottom;
        Point::new(self.inset_left, bottom.max(geometry.padding))
    }
}

/// Why an overflowing page was left as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The layout could not place an insertion point under the probe.
    Unresolved,
    /// The probe resolved to the very start of the page.
    AtPageStart,
    /// Everything past the split point is whitespace.
    BlankOverflow,
}

/// Pure result of measuring one page.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitDecision {
    /// The content fits the page.
    Fits,
    /// Keep `head` on the page and move `fragment` forward.
    Split { head: String, fragment: String },
    /// The page overflows but will not be split this time.
    Skip(SkipReason),
}

/// What a pagination pass did to the page store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationOutcome {
    Fits,
    /// Overflow moved from page `from` into page `to`.
    Split { from: usize, to: usize, created: bool },
    Skipped(SkipReason),
}

/// Decide how a page's content should be split.
pub fn compute_split(
    layout: &dyn TextLayout,
    html: &str,
    geometry: &PageGeometry,
    styles: &NoteStyles,
    policy: &SplitPolicy,
) -> SplitDecision {
    let markup = Markup::parse(html);
    let height = layout.content_height(&markup, geometry, styles);
    if height <= geometry.height {
        return SplitDecision::Fits;
    }

    let probe = policy.probe(geometry);
    let Some(offset) = layout.resolve_offset_at(&markup, geometry, styles, probe) else {
        log::warn!(
            "No split point under ({:.0}, {:.0}); content is {:.0}px on a {:.0}px page",
            probe.x,
            probe.y,
            height,
            geometry.height
        );
        return SplitDecision::Skip(SkipReason::Unresolved);
    };
    if offset.0 == 0 {
        log::warn!("Split point resolved to the start of the page; skipping");
        return SplitDecision::Skip(SkipReason::AtPageStart);
    }

    let (head, fragment) = markup.split_at(offset);
    if Markup::parse(&fragment).is_blank() {
        log::debug!("Overflow past offset {} is blank; nothing to move", offset.0);
        return SplitDecision::Skip(SkipReason::BlankOverflow);
    }

    SplitDecision::Split { head, fragment }
}

/// Applies split decisions to a note's pages.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PaginationEngine {
    pub geometry: PageGeometry,
    pub policy: SplitPolicy,
}

impl PaginationEngine {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            policy: SplitPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SplitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Re-evaluate the active page after its content changed.
    ///
    /// On a split the overflow is prepended to the next page (or a new page
    /// with an empty drawing layer is appended), the active page keeps the
    /// truncated content, and `active` advances by one.
    pub fn paginate(
        &self,
        layout: &dyn TextLayout,
        pages: &mut PageStore,
        active: &mut usize,
        styles: &NoteStyles,
    ) -> Result<PaginationOutcome, PageError> {
        let from = *active;
        let page = pages.get(from).ok_or(PageError::OutOfRange {
            index: from,
            count: pages.page_count(),
        })?;

        let (head, fragment) = match compute_split(layout, page.content, &self.geometry, styles, &self.policy) {
            SplitDecision::Fits => return Ok(PaginationOutcome::Fits),
            SplitDecision::Skip(reason) => return Ok(PaginationOutcome::Skipped(reason)),
            SplitDecision::Split { head, fragment } => (head, fragment),
        };

        let count_before = pages.page_count();
        let to = pages.insert_overflow_into_next(from, &fragment)?;
        pages.set_content(from, head)?;
        *active = to;

        let created = pages.page_count() > count_before;
        log::debug!(
            "Moved {} bytes of overflow from page {} to {} page {}",
            fragment.len(),
            from,
            if created { "new" } else { "existing" },
            to
        );

        Ok(PaginationOutcome::Split { from, to, created })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::FixedPitchLayout;
    use crate::markup::TextOffset;

    struct NoSplitPoint;

    impl TextLayout for NoSplitPoint {
        fn content_height(&self, _: &Markup, geometry: &PageGeometry, _: &NoteStyles) -> f64 {
            geometry.height + 1.0
        }

        fn resolve_offset_at(&self, _: &Markup, _: &PageGeometry, _: &NoteStyles, _: Point) -> Option<TextOffset> {
            None
        }
    }

    fn styles() -> NoteStyles {
        NoteStyles {
            font_size: 10,
            ..NoteStyles::default()
        }
    }

    // Ten 6px glyphs per line and 15px lines starting 10px down, three of
    // which fit. The probe sits at (10, 45), on the third line.
    fn engine() -> PaginationEngine {
        PaginationEngine::new(PageGeometry::new(80.0, 75.0).with_padding(10.0))
    }

    fn forced_lines(count: usize) -> String {
        "x<br>".repeat(count)
    }

    #[test]
    fn test_fitting_page_is_untouched() {
        let mut pages = PageStore::new();
        pages.set_content(0, "short").unwrap();
        let mut active = 0;
        let outcome = engine()
            .paginate(&FixedPitchLayout::default(), &mut pages, &mut active, &styles())
            .unwrap();
        assert_eq!(outcome, PaginationOutcome::Fits);
        assert_eq!(pages.page_count(), 1);
        assert_eq!(active, 0);
    }

    #[test]
    fn test_overflow_creates_next_page() {
        let original = "aaaaaaaaaabbbbbbbbbbccccccccccdd";
        let mut pages = PageStore::new();
        pages.set_content(0, original).unwrap();
        pages.set_drawing(0, "[]").unwrap();
        let mut active = 0;

        let outcome = engine()
            .paginate(&FixedPitchLayout::default(), &mut pages, &mut active, &styles())
            .unwrap();

        assert_eq!(outcome, PaginationOutcome::Split { from: 0, to: 1, created: true });
        assert_eq!(active, 1);
        assert_eq!(pages.page_count(), 2);
        assert_eq!(pages.drawing_data().len(), 2);
        // The probe lands on the third line, which moves forward whole.
        assert_eq!(pages.get(0).unwrap().content, "aaaaaaaaaabbbbbbbbbb");
        assert_eq!(pages.get(1).unwrap().content, "ccccccccccdd");
        assert_eq!(pages.get(0).unwrap().drawing, "[]");
        assert_eq!(pages.get(1).unwrap().drawing, "");

        let rebuilt = format!("{}{}", pages.content()[0], pages.content()[1]);
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_overflow_prepends_to_existing_page() {
        let mut pages = PageStore::new();
        pages.set_content(0, "aaaaaaaaaabbbbbbbbbbccccccccccdd").unwrap();
        pages.append_page("next", "[{\"points\":[]}]");
        let mut active = 0;

        let outcome = engine()
            .paginate(&FixedPitchLayout::default(), &mut pages, &mut active, &styles())
            .unwrap();

        assert_eq!(outcome, PaginationOutcome::Split { from: 0, to: 1, created: false });
        assert_eq!(pages.page_count(), 2);
        assert_eq!(pages.get(1).unwrap().content, "ccccccccccddnext");
        assert_eq!(pages.get(1).unwrap().drawing, "[{\"points\":[]}]");
        assert_eq!(active, 1);
    }

    #[test]
    fn test_styled_run_survives_split() {
        let html = r#"aaaaaaaaaabbbbbbbbbb<span style="font-weight: bold">ccccccccccdd</span>"#;
        let mut pages = PageStore::new();
        pages.set_content(0, html).unwrap();
        let mut active = 0;

        engine()
            .paginate(&FixedPitchLayout::default(), &mut pages, &mut active, &styles())
            .unwrap();

        assert_eq!(pages.get(0).unwrap().content, "aaaaaaaaaabbbbbbbbbb");
        assert_eq!(
            pages.get(1).unwrap().content,
            r#"<span style="font-weight: bold">ccccccccccdd</span>"#
        );
    }

    #[test]
    fn test_blank_overflow_is_noop() {
        let html = "aaaaaaaaaabbbbbbbbbb<br><br>   ";
        let mut pages = PageStore::new();
        pages.set_content(0, html).unwrap();
        let mut active = 0;

        let outcome = engine()
            .paginate(&FixedPitchLayout::default(), &mut pages, &mut active, &styles())
            .unwrap();

        assert_eq!(outcome, PaginationOutcome::Skipped(SkipReason::BlankOverflow));
        assert_eq!(pages.page_count(), 1);
        assert_eq!(pages.get(0).unwrap().content, html);
        assert_eq!(active, 0);
    }

    #[test]
    fn test_unresolved_split_point_is_skipped() {
        let mut pages = PageStore::new();
        pages.set_content(0, "whatever").unwrap();
        let mut active = 0;

        let outcome = engine()
            .paginate(&NoSplitPoint, &mut pages, &mut active, &styles())
            .unwrap();

        assert_eq!(outcome, PaginationOutcome::Skipped(SkipReason::Unresolved));
        assert_eq!(pages.get(0).unwrap().content, "whatever");
        assert_eq!(active, 0);
    }

    #[test]
    fn test_split_at_page_start_is_skipped() {
        // One giant line taller than the page: the probe lands on glyph 0.
        let html = r#"<span style="font-size: 40px">x</span>"#;
        let mut pages = PageStore::new();
        pages.set_content(0, html).unwrap();
        let mut active = 0;

        let outcome = engine()
            .paginate(&FixedPitchLayout::default(), &mut pages, &mut active, &styles())
            .unwrap();

        assert_eq!(outcome, PaginationOutcome::Skipped(SkipReason::AtPageStart));
        assert_eq!(pages.page_count(), 1);
    }

    #[test]
    fn test_probe_sits_inside_content_box() {
        let geometry = PageGeometry::default();
        assert_eq!(SplitPolicy::default().probe(&geometry), Point::new(10.0, 988.0));
    }

    #[test]
    fn test_one_line_overflow_splits_on_default_page() {
        let layout = FixedPitchLayout::default();
        let engine = PaginationEngine::default();
        let styles = NoteStyles::default();

        // 16px text on 24px lines: forty lines fill the page exactly.
        let mut pages = PageStore::new();
        pages.set_content(0, forced_lines(40)).unwrap();
        let mut active = 0;
        assert_eq!(
            engine.paginate(&layout, &mut pages, &mut active, &styles).unwrap(),
            PaginationOutcome::Fits
        );

        let original = forced_lines(41);
        pages.set_content(0, original.clone()).unwrap();
        let outcome = engine.paginate(&layout, &mut pages, &mut active, &styles).unwrap();
        assert_eq!(outcome, PaginationOutcome::Split { from: 0, to: 1, created: true });
        assert_eq!(active, 1);

        let head = Markup::parse(pages.content()[0].as_str());
        assert!(layout.content_height(&head, &engine.geometry, &styles) <= engine.geometry.height);
        assert_eq!(format!("{}{}", pages.content()[0], pages.content()[1]), original);
    }

    #[test]
    fn test_head_fits_after_multi_line_overflow() {
        let layout = FixedPitchLayout::default();
        let mut pages = PageStore::new();
        pages.set_content(0, forced_lines(9)).unwrap();
        let mut active = 0;

        let outcome = engine()
            .paginate(&layout, &mut pages, &mut active, &styles())
            .unwrap();

        assert_eq!(outcome, PaginationOutcome::Split { from: 0, to: 1, created: true });
        assert_eq!(pages.content()[0], forced_lines(2));
        assert_eq!(pages.content()[1], forced_lines(7));
    }

    #[test]
    fn test_out_of_range_active_page() {
        let mut pages = PageStore::new();
        let mut active = 4;
        let result = engine().paginate(&FixedPitchLayout::default(), &mut pages, &mut active, &styles());
        assert!(result.is_err());
    }
}
