//! Sermon note model.
//!
//! # Invariants
//! - `pages` always holds at least one page with aligned drawing layers.
//! - `id` is opaque and stable for the note's lifetime.

use crate::constants::{DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, SERVICE_TYPES};
use crate::markup::Markup;
use crate::pages::PageStore;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Kind of service a sermon was preached at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServiceType {
    #[default]
    SundayMorning,
    SundayEvening,
    WednesdayNight,
    BibleStudy,
    SpecialService,
    Conference,
    Other,
}

impl ServiceType {
    /// Get all service types in display order.
    pub fn all() -> &'static [ServiceType] {
        &[
            ServiceType::SundayMorning,
            ServiceType::SundayEvening,
            ServiceType::WednesdayNight,
            ServiceType::BibleStudy,
            ServiceType::SpecialService,
            ServiceType::Conference,
            ServiceType::Other,
        ]
    }

    /// Display label, as stored in persisted notes.
    pub fn label(&self) -> &'static str {
        let index = Self::all().iter().position(|t| t == self).unwrap_or(0);
        SERVICE_TYPES[index]
    }

    /// Look up a service type by label, ignoring case and surrounding space.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        SERVICE_TYPES
            .iter()
            .position(|known| known.eq_ignore_ascii_case(label))
            .map(|index| Self::all()[index])
    }
}

impl Serialize for ServiceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ServiceType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label).unwrap_or_else(|| {
            log::warn!("Unknown service type {:?}; using default", label);
            Self::default()
        }))
    }
}

/// Body font weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

impl FontWeight {
    /// Parse a CSS font-weight value.
    pub fn from_css(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "bold" | "bolder" | "600" | "700" | "800" | "900" => FontWeight::Bold,
            _ => FontWeight::Normal,
        }
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(s) => FontWeight::from_css(&s),
            serde_json::Value::Number(n) => FontWeight::from_css(&n.to_string()),
            _ => FontWeight::Normal,
        })
    }
}

/// Default formatting of a note's body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteStyles {
    /// Font size in pixels, stored as a CSS length.
    #[serde(
        default = "default_font_size",
        serialize_with = "serialize_px",
        deserialize_with = "deserialize_px"
    )]
    pub font_size: u32,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub font_weight: FontWeight,
}

impl Default for NoteStyles {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_weight: FontWeight::default(),
        }
    }
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

fn serialize_px<S: Serializer>(size: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{size}px"))
}

fn deserialize_px<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(parse_px(&value).unwrap_or(DEFAULT_FONT_SIZE))
}

/// Read a pixel size from `16`, `16.5` or `"16px"`.
pub(crate) fn parse_px(value: &serde_json::Value) -> Option<u32> {
    let px = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().trim_end_matches("px").trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (px.is_finite() && px >= 1.0).then(|| px.round() as u32)
}

/// A sermon note: metadata plus paginated, annotated body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub service_type: ServiceType,
    /// Scripture passage, free text.
    pub passage: String,
    #[serde(flatten)]
    pub pages: PageStore,
    pub styles: NoteStyles,
}

impl Default for Note {
    fn default() -> Self {
        Self::new()
    }
}

// Persisted and imported notes may come from older layouts, so decoding
// always goes through the migration path.
impl<'de> Deserialize<'de> for Note {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        crate::migrate::migrate_note(&value).map_err(serde::de::Error::custom)
    }
}

impl Note {
    /// A blank note dated today with one empty page.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: String::new(),
            date: Local::now().date_naive(),
            service_type: ServiceType::default(),
            passage: String::new(),
            pages: PageStore::new(),
            styles: NoteStyles::default(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
    }

    pub fn set_service_type(&mut self, service_type: ServiceType) {
        self.service_type = service_type;
    }

    /// Set the scripture passage, trimmed.
    pub fn set_passage(&mut self, passage: impl Into<String>) {
        self.passage = passage.into().trim().to_string();
    }

    /// Replace the body styles. The caller is responsible for paginating
    /// the active page again.
    pub fn set_styles(&mut self, styles: NoteStyles) {
        self.styles = styles;
    }

    /// Visible text of one page.
    pub fn page_plain_text(&self, index: usize) -> Option<String> {
        self.pages
            .get(index)
            .map(|page| Markup::parse(page.content).plain_text())
    }

    /// Visible text of all pages, one page per paragraph.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| Markup::parse(page.content).plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Case-insensitive match against metadata and body text.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [
            self.title.to_lowercase(),
            self.passage.to_lowercase(),
            self.service_type.label().to_lowercase(),
            self.date.format("%Y-%m-%d").to_string(),
        ]
        .iter()
        .any(|field| field.contains(&query))
            || self.plain_text().to_lowercase().contains(&query)
    }
}
