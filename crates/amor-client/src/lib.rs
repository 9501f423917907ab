//! # amor-client
//!
//! Client side of the couple page.
//!
//! - [`api`]: HTTP access to the preferences server
//! - [`cache`]: per-device key/value cache holding the last known theme
//! - [`controller`]: session state, optimistic saves, theme synchronization
//! - [`view`], [`anniversary`], [`playlist`]: render models for the public
//!   page and the dashboard
//!
//! The `amor` binary wires these together into a small command-line
//! dashboard.

pub mod anniversary;
pub mod api;
pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod playlist;
pub mod view;

pub use api::{HttpPreferencesApi, PreferencesApi};
pub use cache::{ClientCache, FileCache, MemoryCache};
pub use controller::{Phase, PreferencesController, Surface};
pub use error::{CacheError, ClientError, ControllerError};
pub use events::{ClientEvent, Notice, Severity};
