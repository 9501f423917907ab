//! # amor-shared
//!
//! Types shared by the preferences server and its clients: the
//! [`Preferences`] document, the sparse [`PartialPreferences`] used for
//! merge-writes, the merge policy both sides apply, and the wire bodies of
//! the HTTP API.

pub mod constants;
pub mod error;
pub mod merge;
pub mod protocol;
pub mod types;

pub use error::{FieldViolation, UnknownVariant, ValidationError};
pub use merge::MergeOutcome;
pub use types::{FieldValue, NameDisplayPreference, PartialPreferences, Preferences, Theme};
