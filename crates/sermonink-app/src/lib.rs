//! SermonInk Application
//!
//! The editing session that ties text pagination, stroke capture, page
//! rendering and persistence together.

mod session;

pub use session::{Backup, MetadataUpdate, Session, SessionError};

/// Initialise `env_logger` for native hosts. Safe to call more than once.
#[cfg(feature = "native")]
pub fn init_logging() {
    if env_logger::try_init().is_ok() {
        log::debug!("Logging initialised");
    }
}
