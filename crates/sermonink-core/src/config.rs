//! Editor configuration.

use crate::constants::COLLECTION_KEY;
use crate::layout::PageGeometry;
use crate::pagination::SplitPolicy;
use crate::stroke::{DEFAULT_STROKE_COLOR, DEFAULT_STROKE_THICKNESS};
use serde::{Deserialize, Serialize};

/// Tunable settings for an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Visible area of a page.
    pub page: PageGeometry,
    /// Where overflowing pages are cut.
    pub split_policy: SplitPolicy,
    /// Ink color the pen starts with.
    pub pen_color: String,
    /// Width the pen starts with.
    pub pen_thickness: u32,
    /// Key the collection is stored under.
    pub storage_key: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            page: PageGeometry::default(),
            split_policy: SplitPolicy::default(),
            pen_color: DEFAULT_STROKE_COLOR.to_string(),
            pen_thickness: DEFAULT_STROKE_THICKNESS,
            storage_key: COLLECTION_KEY.to_string(),
        }
    }
}

impl EditorConfig {
    pub fn with_page(mut self, page: PageGeometry) -> Self {
        self.page = page;
        self
    }

    pub fn with_split_policy(mut self, policy: SplitPolicy) -> Self {
        self.split_policy = policy;
        self
    }

    pub fn with_pen(mut self, color: impl Into<String>, thickness: u32) -> Self {
        self.pen_color = color.into();
        self.pen_thickness = thickness.max(1);
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}
