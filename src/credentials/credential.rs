use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The delegated-access grant persisted in the token file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// stable across renewals, never replaced with an empty value
    #[serde(default)]
    pub refresh_token: String,
    pub expiry: DateTime<Utc>,
}

impl Credential {
    pub fn new(access_token: String, refresh_token: String, expiry: DateTime<Utc>) -> Self {
        Self {
            access_token,
            token_type: default_token_type(),
            refresh_token,
            expiry,
        }
    }

    /// Validity left at `now`; negative once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.expiry - now
    }

    /// Apply a renewal: only the access token and its expiry change.
    pub fn renewed(&self, access_token: String, expiry: DateTime<Utc>) -> Self {
        Self {
            access_token,
            expiry,
            ..self.clone()
        }
    }
}

fn default_token_type() -> String {
    "Bearer".to_string()
}
