//! Per-note page storage.
//!
//! # Invariants
//! - `content.len() == drawing_data.len()` after every mutation.
//! - There is always at least one page.
//! - Pages are identified by index only; inserting a page shifts later ones.

use serde::Serialize;
use thiserror::Error;

/// Page store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("Page {index} is out of range (note has {count} pages)")]
    OutOfRange { index: usize, count: usize },
}

/// Borrowed view of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRef<'a> {
    pub index: usize,
    /// Serialized rich-text fragment.
    pub content: &'a str,
    /// Serialized stroke list, or empty.
    pub drawing: &'a str,
}

/// Ordered, index-aligned page content and drawing layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageStore {
    content: Vec<String>,
    #[serde(rename = "drawingData")]
    drawing_data: Vec<String>,
}

impl Default for PageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PageStore {
    /// A single empty page with no drawing.
    pub fn new() -> Self {
        Self {
            content: vec![String::new()],
            drawing_data: vec![String::new()],
        }
    }

    /// Build from possibly mismatched sequences.
    ///
    /// Drawing data is padded with empty layers or truncated to match the
    /// content length, and an empty store gains one blank page.
    pub fn from_parts(mut content: Vec<String>, mut drawing_data: Vec<String>) -> Self {
        if content.is_empty() {
            content.push(String::new());
        }
        if drawing_data.len() != content.len() {
            log::debug!(
                "Reconciling {} drawing layers to {} pages",
                drawing_data.len(),
                content.len()
            );
            drawing_data.resize(content.len(), String::new());
        }
        Self {
            content,
            drawing_data,
        }
    }

    /// Number of pages. Never zero.
    pub fn page_count(&self) -> usize {
        self.content.len()
    }

    /// Get a page by index.
    pub fn get(&self, index: usize) -> Option<PageRef<'_>> {
        Some(PageRef {
            index,
            content: self.content.get(index)?,
            drawing: self.drawing_data.get(index)?,
        })
    }

    /// All page contents in order.
    pub fn content(&self) -> &[String] {
        &self.content
    }

    /// All drawing layers in order.
    pub fn drawing_data(&self) -> &[String] {
        &self.drawing_data
    }

    /// Iterate pages in order.
    pub fn iter(&self) -> impl Iterator<Item = PageRef<'_>> {
        self.content
            .iter()
            .zip(&self.drawing_data)
            .enumerate()
            .map(|(index, (content, drawing))| PageRef {
                index,
                content,
                drawing,
            })
    }

    fn check(&self, index: usize) -> Result<(), PageError> {
        if index < self.content.len() {
            Ok(())
        } else {
            Err(PageError::OutOfRange {
                index,
                count: self.content.len(),
            })
        }
    }

    /// Replace the text content of a page.
    pub fn set_content(&mut self, index: usize, html: impl Into<String>) -> Result<(), PageError> {
        self.check(index)?;
        self.content[index] = html.into();
        Ok(())
    }

    /// Replace the drawing layer of a page.
    pub fn set_drawing(&mut self, index: usize, strokes: impl Into<String>) -> Result<(), PageError> {
        self.check(index)?;
        self.drawing_data[index] = strokes.into();
        Ok(())
    }

    /// Append a page at the end and return its index.
    pub fn append_page(&mut self, content: impl Into<String>, drawing: impl Into<String>) -> usize {
        self.content.push(content.into());
        self.drawing_data.push(drawing.into());
        self.content.len() - 1
    }

    /// Move an overflow fragment from page `index` into the following page.
    ///
    /// The fragment is prepended to the next page's content if it exists,
    /// otherwise a new page with an empty drawing layer is appended. Returns
    /// the index of the page that received the fragment.
    pub fn insert_overflow_into_next(&mut self, index: usize, fragment: &str) -> Result<usize, PageError> {
        self.check(index)?;
        let next = index + 1;
        if next < self.content.len() {
            self.content[next].insert_str(0, fragment);
            Ok(next)
        } else {
            Ok(self.append_page(fragment, String::new()))
        }
    }
}
