//! The preferences service: read and merge-write over a [`PreferencesStore`].
//!
//! Reads never fail. A missing document is seeded with defaults; a corrupt
//! or unreadable one is logged and answered with in-memory defaults, and the
//! stored bytes are left exactly as they were. Writes surface storage
//! failures to the caller.

use std::sync::Arc;

use amor_shared::{FieldViolation, PartialPreferences, Preferences, ValidationError};
use amor_store::{PreferencesStore, StoreError};
use tracing::{error, info, warn};

use crate::error::ServerError;

enum Current {
    Stored(Preferences),
    Missing,
    Unreadable(StoreError),
}

#[derive(Clone)]
pub struct PreferencesService {
    store: Arc<dyn PreferencesStore>,
}

impl PreferencesService {
    pub fn new(store: Arc<dyn PreferencesStore>) -> Self {
        Self { store }
    }

    /// Current document with every field filled in.
    pub fn read(&self) -> Preferences {
        match self.current() {
            Current::Stored(preferences) => preferences,
            Current::Missing => {
                let defaults = Preferences::default();
                match self.store.save(&defaults) {
                    Ok(()) => info!("Seeded preferences store with defaults"),
                    Err(e) => {
                        error!(error = %e, "Failed to create preferences document, serving defaults")
                    }
                }
                defaults
            }
            Current::Unreadable(e) => {
                error!(error = %e, "Preferences store unreadable, serving defaults");
                Preferences::default()
            }
        }
    }

    /// Merge `partial` over the current document and persist the result.
    pub fn merge_write(&self, partial: &PartialPreferences) -> Result<Preferences, ServerError> {
        if partial.is_empty() {
            return Err(ValidationError::Empty.into());
        }

        let current = match self.current() {
            Current::Stored(preferences) => preferences,
            Current::Missing => Preferences::default(),
            Current::Unreadable(e) => {
                warn!(error = %e, "Preferences store unreadable, merging over defaults");
                Preferences::default()
            }
        };

        let outcome = current.merge(partial);
        log_violations(&outcome.violations);

        self.store.save(&outcome.preferences).map_err(|e| {
            error!(error = %e, "Failed to save preferences");
            e
        })?;

        info!(
            theme = %outcome.preferences.theme,
            fallbacks = outcome.violations.len(),
            "Preferences saved"
        );
        Ok(outcome.preferences)
    }

    fn current(&self) -> Current {
        match self.store.load() {
            Ok(Some(stored)) => {
                let outcome = Preferences::from_partial(&stored);
                log_violations(&outcome.violations);
                Current::Stored(outcome.preferences)
            }
            Ok(None) => Current::Missing,
            Err(e) => Current::Unreadable(e),
        }
    }
}

fn log_violations(violations: &[FieldViolation]) {
    for violation in violations {
        warn!(
            field = violation.field,
            reason = %violation.reason,
            "Preference field rejected, default substituted"
        );
    }
}
