//! Storefront server configuration.
//!
//! Resolved once at startup with priority: CLI / env var > TOML
//! (`{data_dir}/config.toml`) > built-in default. A malformed TOML file is
//! logged and ignored — the server always starts.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 4680;
const DEFAULT_PUBLIC_URL: &str = "http://localhost:4680";
const DEFAULT_SESSION_TTL_DAYS: u32 = 7;
const DEFAULT_MAX_ORDER_ITEMS: usize = 25;
const DEFAULT_MAX_PAGE_SIZE: i64 = 100;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── OauthConfig ──────────────────────────────────────────────────────────────

/// Google OAuth settings (`[oauth]` in config.toml).
///
/// When `google_client_id` is unset, the `/api/auth/google` endpoints answer
/// with a configuration error instead of redirecting.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OauthConfig {
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    /// Token-exchange endpoint. Overridable for tests.
    pub token_url: String,
    /// Userinfo endpoint. Overridable for tests.
    pub userinfo_url: String,
}

impl Default for OauthConfig {
    fn default() -> Self {
        Self {
            google_client_id: None,
            google_client_secret: None,
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
        }
    }
}

// ─── LimitsConfig ─────────────────────────────────────────────────────────────

/// Request size limits (`[limits]` in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum line items accepted in a single order. Default: 25.
    pub max_order_items: usize,
    /// Hard cap on the `limit` pagination parameter. Default: 100.
    pub max_page_size: i64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_order_items: DEFAULT_MAX_ORDER_ITEMS,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

// ─── ObservabilityConfig ──────────────────────────────────────────────────────

/// Server observability configuration (`[observability]` in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log SQLite queries that exceed this threshold (milliseconds). Default: 100.
    /// Set to 0 to disable slow query logging.
    pub slow_query_threshold_ms: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold_ms: 100,
        }
    }
}

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// HTTP server port (default: 4680).
    port: Option<u16>,
    /// Bind address (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Log level filter string, e.g. "debug", "info,stitchd=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "compact" (default) | "json".
    log_format: Option<String>,
    /// Externally visible base URL — used for OAuth redirects and
    /// verification links (default: http://localhost:4680).
    public_url: Option<String>,
    /// Exact allowed CORS origin. Unset = permissive (development).
    cors_origin: Option<String>,
    /// Bearer session lifetime in days (default: 7).
    session_ttl_days: Option<u32>,
    /// Google OAuth settings (`[oauth]`).
    oauth: Option<OauthConfig>,
    /// Request size limits (`[limits]`).
    limits: Option<LimitsConfig>,
    /// Observability configuration (`[observability]`).
    observability: Option<ObservabilityConfig>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── StoreConfig ──────────────────────────────────────────────────────────────

/// Resolved server configuration, shared read-only through `AppContext`.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub port: u16,
    pub bind_address: String,
    pub data_dir: PathBuf,
    pub log: String,
    pub log_format: String,
    pub public_url: String,
    pub cors_origin: Option<String>,
    pub session_ttl_days: u32,
    pub oauth: OauthConfig,
    pub limits: LimitsConfig,
    pub observability: ObservabilityConfig,
}

impl StoreConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let bind_address = bind_address
            .or(std::env::var("STITCHD_BIND").ok().filter(|s| !s.is_empty()))
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let log_format = std::env::var("STITCHD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "compact".to_string());

        let public_url = std::env::var("STITCHD_PUBLIC_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.public_url)
            .unwrap_or_else(|| DEFAULT_PUBLIC_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let cors_origin = std::env::var("STITCHD_CORS_ORIGIN")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.cors_origin);

        let session_ttl_days = toml.session_ttl_days.unwrap_or(DEFAULT_SESSION_TTL_DAYS);

        let mut oauth = toml.oauth.unwrap_or_default();
        if let Ok(id) = std::env::var("GOOGLE_CLIENT_ID") {
            if !id.is_empty() {
                oauth.google_client_id = Some(id);
            }
        }
        if let Ok(secret) = std::env::var("GOOGLE_CLIENT_SECRET") {
            if !secret.is_empty() {
                oauth.google_client_secret = Some(secret);
            }
        }

        let limits = toml.limits.unwrap_or_default();
        let observability = toml.observability.unwrap_or_default();

        Self {
            port,
            bind_address,
            data_dir,
            log,
            log_format,
            public_url,
            cors_origin,
            session_ttl_days,
            oauth,
            limits,
            observability,
        }
    }

    /// Redirect URI registered with Google for the OAuth callback.
    pub fn oauth_redirect_uri(&self) -> String {
        format!("{}/api/auth/google/callback", self.public_url)
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/stitchd
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("stitchd");
        }
    }
    #[cfg(target_os = "linux")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".stitchd");
        }
    }
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("stitchd");
        }
    }
    PathBuf::from(".stitchd")
}
