//! Per-device key/value cache.
//!
//! Values are stored JSON-encoded, one entry per key. The only entry the
//! client keeps is the theme, so the first frame can be drawn in the right
//! colors before the server answers. The server stays the source of truth:
//! [`reconcile_theme`] only ever copies a fetched theme *into* the cache.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use amor_shared::constants::THEME_CACHE_KEY;
use amor_shared::Theme;
use directories::ProjectDirs;
use tracing::{debug, warn};

use crate::error::CacheError;

pub trait ClientCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

impl<T: ClientCache + ?Sized> ClientCache for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        (**self).remove(key)
    }
}

// ---------------------------------------------------------------------------
// In-memory cache
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let cache = Self::new();
        cache
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        cache
    }
}

impl ClientCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File cache
// ---------------------------------------------------------------------------

/// Cache persisted as one JSON object on disk.
///
/// The default location is the platform data directory:
/// - Linux:   `~/.local/share/amor/cache.json`
/// - macOS:   `~/Library/Application Support/com.amor.amor/cache.json`
/// - Windows: `{FOLDERID_RoamingAppData}\amor\amor\data\cache.json`
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Option<PathBuf> {
        ProjectDirs::from("com", "amor", "amor").map(|dirs| dirs.data_dir().join("cache.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, CacheError> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(CacheError::Corrupt),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(CacheError::Corrupt)?;
        let temp = self.path.with_extension("json.tmp");
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl ClientCache for FileCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(CacheError::Corrupt(e)) => {
                warn!(path = %self.path.display(), error = %e, "Discarding corrupt cache file");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Theme entry
// ---------------------------------------------------------------------------

/// Theme held in the cache, if any.
///
/// Older builds stored the bare word (`dark`) instead of its JSON encoding
/// (`"dark"`); such entries are accepted and rewritten. Anything else that
/// does not parse is ignored.
pub fn cached_theme<C: ClientCache + ?Sized>(cache: &C) -> Option<Theme> {
    let raw = match cache.get(THEME_CACHE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "Failed to read cached theme");
            return None;
        }
    };

    if let Ok(theme) = serde_json::from_str::<Theme>(&raw) {
        return Some(theme);
    }

    match raw.parse::<Theme>() {
        Ok(theme) => {
            warn!(value = %raw, "Found legacy theme value in cache, rewriting as JSON");
            store_theme(cache, theme);
            Some(theme)
        }
        Err(_) => {
            warn!(value = %raw, "Ignoring unparseable cached theme");
            None
        }
    }
}

/// Copy a theme obtained from the server into the cache.
///
/// Writes only when the cached entry differs. Returns whether a write was
/// attempted.
pub fn reconcile_theme<C: ClientCache + ?Sized>(cache: &C, server_theme: Theme) -> bool {
    if cached_theme(cache) == Some(server_theme) {
        return false;
    }
    store_theme(cache, server_theme);
    true
}

fn store_theme<C: ClientCache + ?Sized>(cache: &C, theme: Theme) {
    let encoded = format!("\"{}\"", theme.as_str());
    match cache.set(THEME_CACHE_KEY, &encoded) {
        Ok(()) => debug!(%theme, "Cached theme updated"),
        Err(e) => warn!(error = %e, "Failed to cache theme"),
    }
}
