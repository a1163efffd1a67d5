use std::time::Duration;

use serde::Deserialize;

use crate::config::settings::SettingsConfig;
use crate::utils::constants::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_COLUMNS, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_INITIAL_DELAY_SECS,
    DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_SAFETY_MARGIN_SECS, DEFAULT_SHEETS_API_BASE_URL,
    DEFAULT_STATE_TOKEN, SPREADSHEETS_READONLY_SCOPE,
};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub refresher: RefresherConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// ================================
/// Upstream spreadsheet
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// identifier of the spreadsheet; each sheet inside it is one namespace
    pub spreadsheet_id: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// column range read from every sheet, key column first
    #[serde(default = "default_columns")]
    pub columns: String,
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// ================================
/// OAuth2 delegated access
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct OAuthConfig {
    /// application identity (client id / secret) in Google client-secret format
    #[serde(default = "default_credentials_file")]
    pub credentials_file: String,
    /// the single persisted credential record
    #[serde(default = "default_token_file")]
    pub token_file: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    /// overrides the identity file's `token_uri`
    pub token_url: Option<String>,
    /// overrides the identity file's first `redirect_uris` entry
    pub redirect_url: Option<String>,
    #[serde(default = "default_state")]
    pub state: String,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            credentials_file: default_credentials_file(),
            token_file: default_token_file(),
            scope: default_scope(),
            token_url: None,
            redirect_url: None,
            state: default_state(),
        }
    }
}

/// ================================
/// Background credential renewal
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct RefresherConfig {
    #[serde(default = "default_refresh_interval")]
    pub interval_seconds: u64,
    /// renewal is forced when less than interval + margin of validity remains
    #[serde(default = "default_safety_margin")]
    pub safety_margin_seconds: u64,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_seconds: u64,
}

impl RefresherConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    pub fn safety_margin(&self) -> Duration {
        Duration::from_secs(self.safety_margin_seconds)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_seconds)
    }
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_refresh_interval(),
            safety_margin_seconds: default_safety_margin(),
            initial_delay_seconds: default_initial_delay(),
        }
    }
}

/// ================================
/// Configuration cache
/// ================================
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicyKind {
    #[default]
    AlwaysFresh,
    Ttl,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default)]
    pub policy: CachePolicyKind,
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            policy: CachePolicyKind::default(),
            ttl_seconds: default_cache_ttl(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_SHEETS_API_BASE_URL.to_string()
}

fn default_columns() -> String {
    DEFAULT_COLUMNS.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}

fn default_credentials_file() -> String {
    "credentials.json".to_string()
}

fn default_token_file() -> String {
    "token.json".to_string()
}

fn default_scope() -> String {
    SPREADSHEETS_READONLY_SCOPE.to_string()
}

fn default_state() -> String {
    DEFAULT_STATE_TOKEN.to_string()
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_safety_margin() -> u64 {
    DEFAULT_SAFETY_MARGIN_SECS
}

fn default_initial_delay() -> u64 {
    DEFAULT_INITIAL_DELAY_SECS
}

fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}
