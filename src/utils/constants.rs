//! Shared constants and invariants

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30 * 60;
pub const DEFAULT_SAFETY_MARGIN_SECS: u64 = 5 * 60;
pub const DEFAULT_INITIAL_DELAY_SECS: u64 = 60;
/// upper bound for every refresher duration
pub const MAX_REFRESHER_SECS: u64 = 30 * 24 * 60 * 60;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

// Upstream
pub const DEFAULT_SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_COLUMNS: &str = "A:B";
pub const SPREADSHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

// OAuth2 endpoints used when the identity file does not carry them
pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_STATE_TOKEN: &str = "state-token";

// Gateway
pub const LIVENESS_BODY: &str = "It's working!";
pub const LOGGED_IN_BODY: &str = "You are logged in!";
pub const KEY_QUERY_PARAM: &str = "key";
pub const CODE_QUERY_PARAM: &str = "code";
