use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::app_identity::AppIdentity;
use crate::error::ServiceError;

/// Tokens returned by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub token_type: Option<String>,
    /// present on code exchange; renewals usually omit it
    pub refresh_token: Option<String>,
    pub expires_in_seconds: i64,
}

/// Calls to the provider's token endpoint.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// `grant_type=refresh_token`
    async fn renew(
        &self,
        identity: &AppIdentity,
        token_url: &str,
        refresh_token: &str,
    ) -> Result<TokenGrant, ServiceError>;

    /// `grant_type=authorization_code`
    async fn exchange_code(
        &self,
        identity: &AppIdentity,
        token_url: &str,
        redirect_url: &str,
        code: &str,
    ) -> Result<TokenGrant, ServiceError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// Form-encoded OAuth2 token endpoint client.
#[derive(Debug, Clone)]
pub struct OAuth2Exchange {
    client: Client,
}

impl OAuth2Exchange {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn post_form(&self, token_url: &str, form: &[(&str, &str)]) -> Result<TokenGrant, String> {
        let response = self
            .client
            .post(token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| format!("token request failed: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("reading token response failed: {}", e))?;
        if !status.is_success() {
            return Err(format!("token endpoint answered {}: {}", status, body));
        }
        debug!("token endpoint answered {}", status);

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| format!("malformed token response: {}", e))?;
        let access_token = parsed
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| "token response has no access_token".to_owned())?;
        let expires_in_seconds = parsed
            .expires_in
            .ok_or_else(|| "token response has no expires_in".to_owned())?;

        Ok(TokenGrant {
            access_token,
            token_type: parsed.token_type,
            refresh_token: parsed.refresh_token.filter(|token| !token.is_empty()),
            expires_in_seconds,
        })
    }
}

#[async_trait]
impl TokenExchange for OAuth2Exchange {
    async fn renew(
        &self,
        identity: &AppIdentity,
        token_url: &str,
        refresh_token: &str,
    ) -> Result<TokenGrant, ServiceError> {
        let form = [
            ("client_id", identity.client_id.as_str()),
            ("client_secret", identity.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        self.post_form(token_url, &form).await.map_err(ServiceError::Renewal)
    }

    async fn exchange_code(
        &self,
        identity: &AppIdentity,
        token_url: &str,
        redirect_url: &str,
        code: &str,
    ) -> Result<TokenGrant, ServiceError> {
        let form = [
            ("code", code),
            ("client_id", identity.client_id.as_str()),
            ("client_secret", identity.client_secret.as_str()),
            ("redirect_uri", redirect_url),
            ("grant_type", "authorization_code"),
        ];
        self.post_form(token_url, &form)
            .await
            .map_err(ServiceError::AuthCodeExchange)
    }
}
