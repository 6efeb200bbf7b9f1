//! Fixed option tables offered by the toolbar and metadata form.

/// Font families offered for the note body.
pub const FONT_FAMILIES: &[&str] = &[
    "Arial",
    "Georgia",
    "Times New Roman",
    "Verdana",
    "Helvetica",
    "Garamond",
    "Courier New",
];

/// Font sizes in pixels.
pub const FONT_SIZES: &[u32] = &[12, 14, 16, 18, 20, 24, 28, 32];

/// Service type labels, in display order.
pub const SERVICE_TYPES: &[&str] = &[
    "Sunday Morning",
    "Sunday Evening",
    "Wednesday Night",
    "Bible Study",
    "Special Service",
    "Conference",
    "Other",
];

/// Pen palette as `(label, css color)`.
pub const PEN_COLORS: &[(&str, &str)] = &[
    ("Black", "#000000"),
    ("Red", "#dc3545"),
    ("Blue", "#0d6efd"),
    ("Green", "#198754"),
    ("Yellow", "#ffc107"),
    ("Purple", "#6f42c1"),
];

/// Pen widths in pixels.
pub const PEN_THICKNESSES: &[u32] = &[1, 3, 5, 8, 12];

/// Default body font family.
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// Default body font size in pixels.
pub const DEFAULT_FONT_SIZE: u32 = 16;

/// Key under which the collection blob is stored.
pub const COLLECTION_KEY: &str = "sermonNotes";
