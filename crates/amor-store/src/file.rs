//! JSON file storage.
//!
//! The document lives in a single file, `./data/preferences.json` by
//! default. Writes go to a sibling temp file that is then renamed over the
//! target, so a reader sees either the old or the new document and never a
//! partial one. Each write gets its own temp file. There is no locking:
//! concurrent writers race and the last rename wins.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use amor_shared::{PartialPreferences, Preferences};

use crate::error::{Result, StoreError};
use crate::PreferencesStore;

static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling temp file unique to this process and write.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "preferences.json".into());
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        name.push(format!(".{}.{seq}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

impl PreferencesStore for JsonFileStore {
    fn load(&self) -> Result<Option<PartialPreferences>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let document = serde_json::from_slice(&bytes).map_err(StoreError::Corrupt)?;
        Ok(Some(document))
    }

    fn save(&self, preferences: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(preferences).map_err(StoreError::Serialize)?;

        let temp = self.temp_path();
        fs::write(&temp, json)?;
        if let Err(e) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(StoreError::Io(e));
        }

        tracing::debug!(path = %self.path.display(), "preferences written");
        Ok(())
    }
}
