//! # amor-store
//!
//! Durable storage for the couple's preferences document.
//!
//! The [`PreferencesStore`] trait is the only seam the preferences service
//! talks to. [`JsonFileStore`] keeps the document as one pretty-printed JSON
//! file; [`MemoryStore`] is an in-process stand-in for tests and embedding.
//! Stores deal in whole documents: reads hand back whatever fields are on
//! disk, writes overwrite everything.

pub mod file;
pub mod memory;

mod error;

pub use error::{Result, StoreError};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use amor_shared::{PartialPreferences, Preferences};

/// Persistence for the single preferences document.
pub trait PreferencesStore: Send + Sync {
    /// Read the stored document.
    ///
    /// Returns `Ok(None)` when nothing has been stored yet. The stored
    /// document may be sparse; back-filling defaults is the caller's job.
    fn load(&self) -> Result<Option<PartialPreferences>>;

    /// Overwrite the stored document.
    fn save(&self, preferences: &Preferences) -> Result<()>;
}
