use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use amor_shared::{PartialPreferences, Preferences};

use crate::error::{Result, StoreError};
use crate::PreferencesStore;

/// In-memory store holding the document as raw JSON text, exactly as the
/// file store would see it on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    raw: Mutex<Option<String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from arbitrary stored text (valid or not).
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Mutex::new(Some(raw.into())),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Current stored text, if any.
    pub fn raw(&self) -> Option<String> {
        self.raw.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Make every subsequent `save` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl PreferencesStore for MemoryStore {
    fn load(&self) -> Result<Option<PartialPreferences>> {
        let guard = self.raw.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_deref() {
            None => Ok(None),
            Some(text) => serde_json::from_str(text)
                .map(Some)
                .map_err(StoreError::Corrupt),
        }
    }

    fn save(&self, preferences: &Preferences) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }

        let json = serde_json::to_string_pretty(preferences).map_err(StoreError::Serialize)?;
        *self.raw.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        Ok(())
    }
}
