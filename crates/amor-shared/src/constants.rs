/// Application name
pub const APP_NAME: &str = "Amor em Detalhes";

/// Couple names used until the couple sets their own
pub const DEFAULT_COUPLE_NAMES: [&str; 2] = ["Você", "Seu Amor"];

/// HTTP route of the preferences document
pub const PREFERENCES_ROUTE: &str = "/api/preferences";

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Client cache key holding the last known theme
pub const THEME_CACHE_KEY: &str = "theme";

/// Interval between recomputations of the anniversary duration text
pub const ANNIVERSARY_REFRESH_SECS: u64 = 60;

/// Cache headers sent with every preferences read
pub const NO_STORE_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, proxy-revalidate";
