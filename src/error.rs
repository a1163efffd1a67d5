use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors crossing the boundary between the core and the request gateway.
///
/// `Renewal` and `MalformedRow` are produced only on background or per-row paths
/// and are logged, never rendered to clients.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    // ── Static files ────────────────────────────────────────────────────
    /// carries the full message, read and parse failures word it differently
    #[error("{0}")]
    ConfigIo(String),

    // ── Credential record ───────────────────────────────────────────────
    #[error("credential is missing: {0}")]
    CredentialMissing(String),

    #[error("unable to save oauth token: {0}")]
    CredentialPersist(String),

    #[error("Unable to retrieve token from web: {0}")]
    AuthCodeExchange(String),

    #[error("Unable to read authorization code")]
    MissingAuthCode,

    #[error("token renewal failed: {0}")]
    Renewal(String),

    // ── Upstream rows ───────────────────────────────────────────────────
    #[error("Unable to retrieve data from sheet: {0}")]
    UpstreamFetch(String),

    #[error("row {row} skipped: {reason}")]
    MalformedRow { row: usize, reason: String },

    // ── Lookup ──────────────────────────────────────────────────────────
    #[error("key {key} is not in sheet.")]
    KeyNotFound { namespace: String, key: String },

    #[error("key param is not in url.")]
    MissingKeyParam,
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::KeyNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label used for failure metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ServiceError::ConfigIo(_) => "config_io",
            ServiceError::CredentialMissing(_) => "credential_missing",
            ServiceError::CredentialPersist(_) => "credential_persist",
            ServiceError::AuthCodeExchange(_) => "auth_code_exchange",
            ServiceError::MissingAuthCode => "missing_auth_code",
            ServiceError::Renewal(_) => "renewal",
            ServiceError::UpstreamFetch(_) => "upstream",
            ServiceError::MalformedRow { .. } => "malformed_row",
            ServiceError::KeyNotFound { .. } => "key_not_found",
            ServiceError::MissingKeyParam => "missing_key_param",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = match &self {
            // static-file and auth-code messages are already complete sentences
            ServiceError::ConfigIo(_)
            | ServiceError::AuthCodeExchange(_)
            | ServiceError::MissingAuthCode => self.to_string(),
            _ => format!("Error: {}", self),
        };
        (self.status(), body).into_response()
    }
}
