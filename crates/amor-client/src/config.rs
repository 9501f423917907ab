//! Client configuration loaded from environment variables.
//!
//! Command-line flags of the `amor` binary take precedence over these.

use std::path::PathBuf;
use std::time::Duration;

use amor_shared::constants::DEFAULT_HTTP_PORT;

use crate::cache::FileCache;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the preferences server.
    /// Env: `AMOR_SERVER_URL`
    /// Default: `http://127.0.0.1:8080`
    pub server_url: String,

    /// File backing the per-device cache. `None` when the platform has no
    /// data directory; the cache then lives in memory only.
    /// Env: `AMOR_CACHE_PATH`
    pub cache_path: Option<PathBuf>,

    /// Timeout applied to every request.
    /// Env: `AMOR_REQUEST_TIMEOUT_SECS`
    /// Default: 10 seconds
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: format!("http://127.0.0.1:{DEFAULT_HTTP_PORT}"),
            cache_path: FileCache::default_location(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("AMOR_SERVER_URL") {
            match reqwest::Url::parse(&url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                    config.server_url = url;
                }
                _ => tracing::warn!(value = %url, "Invalid AMOR_SERVER_URL, using default"),
            }
        }

        if let Some(path) = lookup("AMOR_CACHE_PATH") {
            if path.trim().is_empty() {
                tracing::warn!("Empty AMOR_CACHE_PATH, using default");
            } else {
                config.cache_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("AMOR_REQUEST_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid AMOR_REQUEST_TIMEOUT_SECS, using default"),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.server_url, "http://127.0.0.1:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("AMOR_SERVER_URL", "https://amor.example.com"),
            ("AMOR_CACHE_PATH", "/tmp/amor-cache.json"),
            ("AMOR_REQUEST_TIMEOUT_SECS", "3"),
        ]));
        assert_eq!(config.server_url, "https://amor.example.com");
        assert_eq!(config.cache_path, Some(PathBuf::from("/tmp/amor-cache.json")));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("AMOR_SERVER_URL", "ftp://nope"),
            ("AMOR_REQUEST_TIMEOUT_SECS", "0"),
        ]));
        assert_eq!(config.server_url, ClientConfig::default().server_url);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }
}
