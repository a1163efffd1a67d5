use std::path::Path;

use reqwest::Url;
use serde::Deserialize;

use crate::config::service::OAuthConfig;
use crate::error::ServiceError;
use crate::utils::constants::{DEFAULT_AUTH_URL, DEFAULT_TOKEN_URL};

/// Client-secret document as downloaded from the provider console.
/// Exactly one of `web` / `installed` is expected.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    web: Option<ClientSecretSection>,
    installed: Option<ClientSecretSection>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretSection {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

/// Static application identity used for the code exchange and for every renewal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub redirect_uris: Vec<String>,
}

impl AppIdentity {
    /// Read the identity on every use so a rotated client secret needs no restart.
    pub async fn load(path: &Path) -> Result<Self, ServiceError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ServiceError::ConfigIo(format!("Unable to read client secret file: {}", e)))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ServiceError> {
        let file: ClientSecretFile = serde_json::from_str(content).map_err(|e| {
            ServiceError::ConfigIo(format!("Unable to parse client secret file to config: {}", e))
        })?;
        let section = file.web.or(file.installed).ok_or_else(|| {
            ServiceError::ConfigIo(
                "Unable to parse client secret file to config: missing 'web' or 'installed' section"
                    .to_owned(),
            )
        })?;
        if section.client_id.is_empty() || section.client_secret.is_empty() {
            return Err(ServiceError::ConfigIo(
                "Unable to parse client secret file to config: empty client_id or client_secret".to_owned(),
            ));
        }

        Ok(Self {
            client_id: section.client_id,
            client_secret: section.client_secret,
            auth_uri: section.auth_uri.unwrap_or_else(|| DEFAULT_AUTH_URL.to_owned()),
            token_uri: section.token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URL.to_owned()),
            redirect_uris: section.redirect_uris,
        })
    }

    pub fn token_url(&self, oauth: &OAuthConfig) -> String {
        oauth.token_url.clone().unwrap_or_else(|| self.token_uri.clone())
    }

    pub fn redirect_url(&self, oauth: &OAuthConfig) -> String {
        oauth
            .redirect_url
            .clone()
            .or_else(|| self.redirect_uris.first().cloned())
            .unwrap_or_default()
    }

    /// Authorization URL asking for offline (refreshable), read-only access.
    pub fn authorization_url(&self, oauth: &OAuthConfig) -> Result<String, ServiceError> {
        let redirect_url = self.redirect_url(oauth);
        let mut params = vec![
            ("access_type", "offline"),
            ("approval_prompt", "force"),
            ("client_id", self.client_id.as_str()),
            ("response_type", "code"),
            ("scope", oauth.scope.as_str()),
            ("state", oauth.state.as_str()),
        ];
        if !redirect_url.is_empty() {
            params.push(("redirect_uri", redirect_url.as_str()));
        }
        Url::parse_with_params(&self.auth_uri, &params)
            .map(|url| url.to_string())
            .map_err(|e| {
                ServiceError::ConfigIo(format!(
                    "Unable to parse client secret file to config: invalid auth_uri '{}': {}",
                    self.auth_uri, e
                ))
            })
    }
}
