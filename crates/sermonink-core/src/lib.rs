//! SermonInk Core Library
//!
//! Platform-agnostic data model and logic for paginated, hand-annotated
//! sermon notes.

pub mod capture;
pub mod collection;
pub mod config;
pub mod constants;
pub mod layout;
pub mod markup;
pub mod migrate;
pub mod note;
pub mod pages;
pub mod pagination;
pub mod storage;
pub mod stroke;

pub use capture::{CaptureResponse, CaptureState, StrokeCapture};
pub use collection::{Collection, ExportError, backup_file_name};
pub use config::EditorConfig;
pub use layout::{FixedPitchLayout, PageGeometry, TextLayout};
pub use markup::{Markup, TextOffset};
pub use migrate::ValidationError;
pub use note::{FontWeight, Note, NoteStyles, ServiceType};
pub use pages::{PageError, PageStore};
pub use pagination::{PaginationEngine, PaginationOutcome, SkipReason, SplitPolicy};
pub use stroke::{Stroke, Tool};
