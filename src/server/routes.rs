use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use tracing::{info, warn};

use crate::cache::config_cache::{ConfigCache, Lookup};
use crate::config::app_identity::AppIdentity;
use crate::config::service::OAuthConfig;
use crate::credentials::credential::Credential;
use crate::credentials::store::CredentialStore;
use crate::error::ServiceError;
use crate::helpers::time::expiry_after;
use crate::observability::metrics::get_metrics;
use crate::server::server::AppState;
use crate::sources::oauth2::TokenExchange;
use crate::utils::constants::{CODE_QUERY_PARAM, KEY_QUERY_PARAM, LIVENESS_BODY, LOGGED_IN_BODY};

/// Everything the gateway routes need from the core.
#[derive(Clone)]
pub struct GatewayState {
    pub cache: Arc<ConfigCache>,
    pub store: Arc<CredentialStore>,
    pub exchange: Arc<dyn TokenExchange>,
    pub oauth: Arc<OAuthConfig>,
}

impl GatewayState {
    pub fn new(
        cache: Arc<ConfigCache>,
        store: Arc<CredentialStore>,
        exchange: Arc<dyn TokenExchange>,
        oauth: OAuthConfig,
    ) -> Self {
        Self {
            cache,
            store,
            exchange,
            oauth: Arc::new(oauth),
        }
    }

    pub fn router(&self) -> Router<AppState> {
        Router::new()
            .route("/", get(home))
            .route("/login", get(login))
            .route("/callback", get(callback))
            .route("/{namespace}", get(namespace))
            .route("/{namespace}/get", get(namespace))
    }
}

type QueryPairs = Query<Vec<(String, String)>>;

async fn home() -> impl IntoResponse {
    (StatusCode::OK, LIVENESS_BODY)
}

async fn login(State(state): State<AppState>) -> Response {
    let gateway = &state.gateway_state;
    let identity = match AppIdentity::load(&PathBuf::from(&gateway.oauth.credentials_file)).await {
        Ok(identity) => identity,
        Err(e) => return failure("login", e).await,
    };
    match identity.authorization_url(&gateway.oauth) {
        Ok(url) => {
            info!("redirecting to authorization endpoint");
            (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, url)]).into_response()
        }
        Err(e) => failure("login", e).await,
    }
}

async fn callback(State(state): State<AppState>, Query(query): QueryPairs) -> Response {
    let code = first_value(&query, CODE_QUERY_PARAM).filter(|code| !code.is_empty());
    let result = match code {
        Some(code) => complete_login(&state.gateway_state, code).await,
        None => Err(ServiceError::MissingAuthCode),
    };
    match result {
        Ok(()) => (StatusCode::OK, LOGGED_IN_BODY).into_response(),
        Err(e) => failure("callback", e).await,
    }
}

/// Exchange an authorization code and persist the first credential.
async fn complete_login(gateway: &GatewayState, code: &str) -> Result<(), ServiceError> {
    let identity = AppIdentity::load(&PathBuf::from(&gateway.oauth.credentials_file)).await?;
    let grant = gateway
        .exchange
        .exchange_code(
            &identity,
            &identity.token_url(&gateway.oauth),
            &identity.redirect_url(&gateway.oauth),
            code,
        )
        .await?;
    let expiry = expiry_after(Utc::now(), grant.expires_in_seconds).ok_or_else(|| {
        ServiceError::AuthCodeExchange(format!(
            "token response has unusable expires_in {}",
            grant.expires_in_seconds
        ))
    })?;

    // the provider only returns a refresh token on first consent; keep the stored one otherwise
    let refresh_token = match grant.refresh_token {
        Some(token) => token,
        None => gateway
            .store
            .load()
            .await
            .map(|existing| existing.refresh_token)
            .ok()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ServiceError::AuthCodeExchange(
                    "no refresh token returned and none stored, revoke access and log in again".to_owned(),
                )
            })?,
    };

    let mut credential = Credential::new(grant.access_token, refresh_token, expiry);
    if let Some(token_type) = grant.token_type {
        credential.token_type = token_type;
    }
    gateway.store.save(&credential).await?;
    get_metrics().await.credential_expiry_unix.set(expiry.timestamp());
    info!("logged in, access token valid until {}", expiry);
    Ok(())
}

async fn namespace(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
    Query(query): QueryPairs,
) -> Response {
    info!("config request for namespace '{}'", namespace);
    let key = if query.is_empty() {
        None
    } else {
        match first_value(&query, KEY_QUERY_PARAM) {
            Some(key) => Some(key),
            None => return failure("namespace", ServiceError::MissingKeyParam).await,
        }
    };

    match state.gateway_state.cache.get(&namespace, key).await {
        Ok(Lookup::All(entries)) => (StatusCode::OK, Json(entries)).into_response(),
        Ok(Lookup::Value(value)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            value.to_string(),
        )
            .into_response(),
        Err(e) => failure("namespace", e).await,
    }
}

fn first_value<'a>(query: &'a [(String, String)], name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

async fn failure(route: &str, err: ServiceError) -> Response {
    warn!("{} request failed: {}", route, err);
    get_metrics()
        .await
        .request_failures
        .with_label_values(&[route, err.reason()])
        .inc();
    err.into_response()
}
